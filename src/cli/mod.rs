//! CLI module for buidl-db
//!
//! Provides command-line interface for:
//! - init: Create the persistent data file
//! - exec: One-shot request execution
//! - start: Serve requests from stdin until EOF

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{boot, exec, init, init_store, open_store, run, run_command, serve, start};
pub use config::{Config, StoreMode, ENV_DATA_FILE, ENV_MODE, ENV_SEED_FILE};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, read_requests, write_error, write_json, write_response};
