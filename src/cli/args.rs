//! CLI argument definitions using clap
//!
//! Commands:
//! - buidl-db init --config <path>
//! - buidl-db exec --config <path>
//! - buidl-db start --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// buidl-db - document store and data access layer for the builder site
#[derive(Parser, Debug)]
#[command(name = "buidl-db")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the persistent data file, seeded when a seed file is configured
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./buidl-db.json")]
        config: PathBuf,
    },

    /// Execute a single request read from stdin and exit
    Exec {
        /// Path to configuration file
        #[arg(long, default_value = "./buidl-db.json")]
        config: PathBuf,
    },

    /// Serve requests from stdin, one JSON object per line, until EOF
    Start {
        /// Path to configuration file
        #[arg(long, default_value = "./buidl-db.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
