//! Build orchestration.
//!
//! This module turns registered targets into a DAG of compile, archive,
//! and link steps, and runs them in topological order with freshness
//! checks. Hooks run around the DAG: pre-hooks before, post-hooks after.

pub mod depfile;
pub mod hooks;
pub mod orchestrator;
pub mod step;

pub use orchestrator::{BuildResult, Orchestrator};
pub use step::{BuildStep, StepKind};
