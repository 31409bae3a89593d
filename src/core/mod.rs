//! Core data structures for cbuild.
//!
//! This module contains the foundational types used throughout cbuild:
//! - Build targets and their configuration
//! - Source languages
//! - The toolchain record

pub mod target;
pub mod toolchain;

pub use target::{
    IncludeDir, IncludeKind, Language, LinkObject, OptimizeMode, SourceFile, Target, TargetKind,
};
pub use toolchain::Toolchain;
