//! `cbuild build` command

use anyhow::{bail, Result};

use cbuild::ops::{run_pipeline, PipelineOptions};

use crate::cli::Cli;
use crate::config;

pub fn execute(cli: &Cli) -> Result<()> {
    let opts = PipelineOptions {
        config_file: cli.file.clone(),
        verbose: cli.verbose,
        clean_first: false,
    };

    let result = run_pipeline(&opts, Some(&config::build))?;
    if !result.success {
        bail!("build failed");
    }
    Ok(())
}
