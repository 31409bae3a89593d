//! cbuild CLI - a self-hosting build orchestrator for C projects

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("cbuild=debug")
    } else {
        EnvFilter::new("cbuild=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    // Execute command; `build` is the default when none is given.
    match cli.command.unwrap_or(Commands::Build) {
        Commands::Build => commands::build::execute(&cli),
        Commands::Clean => commands::clean::execute(&cli),
        Commands::Rebuild => commands::rebuild::execute(&cli),
        Commands::Init => commands::init::execute(&cli),
    }
}
