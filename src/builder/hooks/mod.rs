//! Hooks: named side-effect steps outside the DAG.
//!
//! Pre-hooks run before the step graph, post-hooks after it (and only
//! when no step failed). Hooks share the steps' freshness idea: a hook
//! with declared inputs and an output is skipped when the output is
//! up to date; a hook without either is always stale.

mod clean;
mod compile_commands;
mod self_rebuild;

pub use clean::CleanHook;
pub use compile_commands::CompileCommandsHook;
pub use self_rebuild::SelfRebuildHook;

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::builder::step::BuildStep;
use crate::core::toolchain::Toolchain;
use crate::util::fs::{file_exists, file_is_newer};
use crate::util::process::Runner;

/// Read-only view of the orchestrator a hook runs against.
pub struct HookContext<'a> {
    /// Path of the user configuration file.
    pub config_file: &'a Path,

    /// The build directory.
    pub build_dir: &'a Path,

    pub toolchain: &'a Toolchain,

    /// The argv this process was started with, for self-rebuild.
    pub argv: &'a [String],

    /// Process executor.
    pub runner: &'a dyn Runner,

    /// All registered steps, indexable by step id.
    pub steps: &'a [BuildStep],
}

/// A named side-effect step that runs before or after the DAG.
pub trait Hook {
    fn name(&self) -> &str;

    /// Freshness inputs. Empty means the hook cannot be skipped.
    fn inputs(&self, _ctx: &HookContext) -> Vec<PathBuf> {
        Vec::new()
    }

    /// Freshness output. None means the hook cannot be skipped.
    fn output(&self, _ctx: &HookContext) -> Option<PathBuf> {
        None
    }

    /// Whether the hook must run. The default mirrors the step policy:
    /// no output or no inputs means always stale, otherwise the hook is
    /// stale when the output is missing or any input is newer than it.
    fn needs_rebuild(&self, ctx: &HookContext) -> bool {
        let Some(output) = self.output(ctx) else {
            return true;
        };
        let inputs = self.inputs(ctx);
        if inputs.is_empty() || !file_exists(&output) {
            return true;
        }
        inputs.iter().any(|input| file_is_newer(input, &output))
    }

    /// Perform the hook's work.
    fn run(&self, ctx: &HookContext) -> Result<()>;

    /// Called after a successful `run`.
    fn on_complete(&self, _ctx: &HookContext) -> Result<()> {
        Ok(())
    }
}
