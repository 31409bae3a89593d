//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// cbuild - a self-hosting build orchestrator for C projects
#[derive(Parser)]
#[command(name = "cbuild")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (step headers and full command lines)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Use FILE instead of build.c
    #[arg(short, long, global = true, value_name = "FILE", default_value = "build.c")]
    pub file: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
pub enum Commands {
    /// Build the project (default)
    Build,

    /// Remove build artifacts
    Clean,

    /// Clean and build
    Rebuild,

    /// Create a template build.c
    Init,
}
