//! The clean hook: delete the build directory.

use anyhow::Result;
use tracing::info;

use super::{Hook, HookContext};
use crate::util::fs::remove_dir_all_if_exists;

/// Pre-hook that recursively removes the build directory. It declares no
/// inputs or output, so it always runs.
#[derive(Debug, Default)]
pub struct CleanHook;

impl Hook for CleanHook {
    fn name(&self) -> &str {
        "clean"
    }

    fn run(&self, ctx: &HookContext) -> Result<()> {
        info!("Removing {}", ctx.build_dir.display());
        remove_dir_all_if_exists(ctx.build_dir)
    }
}
