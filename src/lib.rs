//! cbuild - a self-hosting build orchestrator for C and C++ projects
//!
//! This crate provides the core library functionality for cbuild: an
//! imperative target model, DAG-based step scheduling with incremental
//! rebuilds, and the self-rebuild bootstrap.

pub mod builder;
pub mod core;
pub mod graph;
pub mod ops;
pub mod util;

/// Test utilities and mocks for cbuild unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a stub process runner that records every
/// command and materializes declared outputs instead of spawning children.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{
    target::{IncludeKind, Language, LinkObject, OptimizeMode, SourceFile, Target, TargetKind},
    toolchain::Toolchain,
};

pub use builder::{
    hooks::{CleanHook, CompileCommandsHook, Hook, HookContext, SelfRebuildHook},
    orchestrator::{BuildResult, Orchestrator},
};

pub use graph::Dag;
pub use util::process::{ExecOutput, ProcessCommand, ProcessError, Runner, SystemRunner};
