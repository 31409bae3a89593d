//! High-level operations.
//!
//! This module contains the implementation of cbuild commands.

pub mod cbuild_init;
pub mod pipeline;

pub use cbuild_init::init_project;
pub use pipeline::{run_pipeline, PipelineOptions};
