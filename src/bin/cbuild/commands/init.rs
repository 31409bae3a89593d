//! `cbuild init` command

use anyhow::Result;

use cbuild::ops::init_project;

use crate::cli::Cli;

pub fn execute(_cli: &Cli) -> Result<()> {
    let cwd = std::env::current_dir()?;
    init_project(&cwd)?;
    eprintln!("     Created build.c");
    Ok(())
}
