//! Implementation of `cbuild build`, `clean`, and `rebuild`.
//!
//! Each command is the same pipeline with different trimmings: `clean`
//! installs the clean pre-hook and skips the user configuration,
//! `rebuild` installs the hook and keeps it.

use std::path::PathBuf;

use anyhow::Result;

use crate::builder::hooks::CleanHook;
use crate::builder::orchestrator::{BuildResult, Orchestrator};

/// Settings shared by the pipeline commands.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Path to the user configuration file.
    pub config_file: PathBuf,

    /// Log step headers and full command lines.
    pub verbose: bool,

    /// Install the clean pre-hook before running.
    pub clean_first: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineOptions {
            config_file: PathBuf::from("build.c"),
            verbose: false,
            clean_first: false,
        }
    }
}

/// Run the pipeline: configure an orchestrator, apply the user's
/// registration function, and execute.
///
/// `clean` passes `None` for `register` so only the pre-hooks run;
/// `build` and `rebuild` pass the configuration entry point.
pub fn run_pipeline(
    opts: &PipelineOptions,
    register: Option<&dyn Fn(&mut Orchestrator)>,
) -> Result<BuildResult> {
    let mut orchestrator = Orchestrator::new();
    orchestrator.set_config_file(&opts.config_file);
    orchestrator.set_verbose(opts.verbose);

    if opts.clean_first {
        orchestrator.add_pre_hook(Box::new(CleanHook));
    }

    if let Some(register) = register {
        register(&mut orchestrator);
    }

    Ok(orchestrator.run())
}
