//! The compile-commands hook: emit a per-target compile_commands.json.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use super::{Hook, HookContext};
use crate::builder::step::StepKind;
use crate::graph::NodeId;
use crate::util::fs::ensure_dir;

/// One compile_commands.json entry.
#[derive(Debug, Serialize)]
struct CompileCommand {
    directory: String,
    command: String,
    file: String,
    output: String,
}

/// Post-hook that writes the compile-command database for one target.
///
/// Registered automatically when a target is added; its inputs are the
/// target's compile sources, so the database is regenerated whenever a
/// source changes.
#[derive(Debug)]
pub struct CompileCommandsHook {
    /// Ids of the owning target's compile steps, in declaration order.
    step_ids: Vec<NodeId>,
    inputs: Vec<PathBuf>,
    output: PathBuf,
}

impl CompileCommandsHook {
    pub fn new(step_ids: Vec<NodeId>, inputs: Vec<PathBuf>, output: PathBuf) -> Self {
        CompileCommandsHook {
            step_ids,
            inputs,
            output,
        }
    }
}

impl Hook for CompileCommandsHook {
    fn name(&self) -> &str {
        "compile-commands"
    }

    fn inputs(&self, _ctx: &HookContext) -> Vec<PathBuf> {
        self.inputs.clone()
    }

    fn output(&self, _ctx: &HookContext) -> Option<PathBuf> {
        Some(self.output.clone())
    }

    fn run(&self, ctx: &HookContext) -> Result<()> {
        info!("Generating {}", self.output.display());

        let directory = std::env::current_dir()
            .map(|d| d.display().to_string())
            .unwrap_or_else(|_| ".".to_string());

        let commands: Vec<CompileCommand> = self
            .step_ids
            .iter()
            .map(|&id| &ctx.steps[id])
            .filter(|step| step.kind == StepKind::Compile)
            .map(|step| CompileCommand {
                directory: directory.clone(),
                command: step.command.display_command(),
                file: step.inputs[0].display().to_string(),
                output: step.output.display().to_string(),
            })
            .collect();

        if let Some(parent) = self.output.parent() {
            ensure_dir(parent)?;
        }

        let json = serde_json::to_string_pretty(&commands)?;
        fs::write(&self.output, json)
            .with_context(|| format!("failed to write {}", self.output.display()))
    }
}
