//! CLI argument definitions for depsmith.
//!
//! Uses `clap` derive macros to define the command surface. Each command
//! corresponds to a handler in the [`super::commands`] module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "depsmith",
    version,
    about = "Resolve file conflicts in restored dependency graphs",
    long_about = "depsmith reads the assets file produced by a package restore, decides which \
                  file wins whenever several packages contribute the same assembly or native \
                  asset, and writes a duplicate-free runtime deps file per target."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve conflicts for every target and write <project>.deps.json
    Resolve {
        /// Path to the assets file (JSON, or TOML with a .toml extension)
        assets: PathBuf,
        /// Resolver configuration; defaults to depsmith.toml next to the assets file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Directory to write the deps file to
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Keep every contributed file, even duplicates
        #[arg(long)]
        no_conflict_handling: bool,
    },

    /// Validate an existing deps file against its assets file
    Check {
        /// Path to the assets file
        assets: PathBuf,
        /// Path to the deps file
        deps: PathBuf,
        /// Resolver configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Display the dependency tree
    Tree {
        /// Path to the assets file
        assets: PathBuf,
        /// Only this target, e.g. netcoreapp2.0 or netcoreapp2.0/win-x64
        #[arg(short, long)]
        target: Option<String>,
        /// Maximum depth
        #[arg(long)]
        depth: Option<u32>,
        /// Explain why a package is included
        #[arg(long)]
        why: Option<String>,
        /// Show file conflicts and how they were decided
        #[arg(long)]
        conflicts: bool,
        /// Resolver configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List the target definitions in an assets file
    Targets {
        /// Path to the assets file
        assets: PathBuf,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}
