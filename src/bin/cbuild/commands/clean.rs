//! `cbuild clean` command

use anyhow::{bail, Result};

use cbuild::ops::{run_pipeline, PipelineOptions};

use crate::cli::Cli;

pub fn execute(cli: &Cli) -> Result<()> {
    let opts = PipelineOptions {
        config_file: cli.file.clone(),
        verbose: cli.verbose,
        clean_first: true,
    };

    // No registration function: only the pre-hooks run.
    let result = run_pipeline(&opts, None)?;
    if !result.success {
        bail!("clean failed");
    }
    Ok(())
}
