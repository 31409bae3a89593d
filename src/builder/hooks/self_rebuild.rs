//! The self-rebuild hook: the bootstrap that keeps the tool current.
//!
//! When the configuration file (or one of the shipped libraries) is newer
//! than the tool's binary, the hook recompiles the configuration and then
//! replaces the running process with the fresh binary, re-invoked with
//! the original argv. The tool updates itself without an external
//! bootstrap script.

use std::path::PathBuf;

use anyhow::{bail, Result};
use tracing::{error, info};

use super::{Hook, HookContext};
use crate::util::process::ProcessCommand;

/// Pre-hook installed by default on every orchestrator.
#[derive(Debug)]
pub struct SelfRebuildHook {
    /// Static libraries the configuration is linked against.
    lib_paths: Vec<PathBuf>,

    /// The tool's own binary.
    output: PathBuf,
}

impl Default for SelfRebuildHook {
    fn default() -> Self {
        SelfRebuildHook {
            lib_paths: vec![
                PathBuf::from("build/bin/libcbuild.a"),
                PathBuf::from("build/bin/libcore.a"),
            ],
            output: PathBuf::from("cbuild"),
        }
    }
}

impl SelfRebuildHook {
    /// Create a hook with explicit library and binary paths.
    pub fn new(lib_paths: Vec<PathBuf>, output: PathBuf) -> Self {
        SelfRebuildHook { lib_paths, output }
    }
}

impl Hook for SelfRebuildHook {
    fn name(&self) -> &str {
        "self-rebuild"
    }

    fn inputs(&self, ctx: &HookContext) -> Vec<PathBuf> {
        let mut inputs = vec![ctx.config_file.to_path_buf()];
        inputs.extend(self.lib_paths.iter().cloned());
        inputs
    }

    fn output(&self, _ctx: &HookContext) -> Option<PathBuf> {
        Some(self.output.clone())
    }

    fn run(&self, ctx: &HookContext) -> Result<()> {
        let mut cmd = ProcessCommand::new(&ctx.toolchain.c_compiler)
            .arg("-Iinclude")
            .arg(ctx.config_file.display().to_string());
        for lib in &self.lib_paths {
            cmd = cmd.arg(lib.display().to_string());
        }
        cmd = cmd.arg("-o").arg(self.output.display().to_string());

        info!("Rebuilding {}...", self.output.display());

        let result = ctx.runner.run(&cmd)?;
        if !result.success() {
            bail!(
                "self-rebuild failed (exit {:?}):\n{}",
                result.exit_code,
                result.stderr
            );
        }
        Ok(())
    }

    /// Restart with the freshly built binary: replace the process image
    /// with an execution of the original argv. Failure to replace is
    /// non-fatal; the run continues with the in-memory binary.
    fn on_complete(&self, ctx: &HookContext) -> Result<()> {
        let Some((program, rest)) = ctx.argv.split_first() else {
            return Ok(());
        };

        info!("Restarting with new binary...");
        let cmd = ProcessCommand::new(program.clone()).args(rest.iter().cloned());

        let err = ctx.runner.exec(&cmd);
        error!("exec failed: {}", err);
        Ok(())
    }
}
