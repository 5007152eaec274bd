//! CLI command implementations
//!
//! Boot sequence shared by `exec` and `start`:
//! 1. Configuration load (file, then environment overrides)
//! 2. Store open for the configured mode
//! 3. Request handler activation
//!
//! Responses go to stdout, one JSON object per line.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use crate::api::RequestHandler;
use crate::dal::DataAccess;
use crate::observability::{log_event, log_event_with_fields, Event, Logger};
use crate::store::{seed, CollectionsDump, DocumentStore, MemoryStore, SnapshotFile};

use super::args::Command;
use super::config::{Config, StoreMode};
use super::errors::{CliError, CliResult};
use super::io::{read_request, read_requests, stdin, write_json, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Exec { config } => exec(&config),
        Command::Start { config } => start(&config),
    }
}

/// Create the persistent data file
///
/// Only meaningful in persistent mode; the file is seeded from `seed_file`
/// when one is configured and starts empty otherwise. The in-memory modes
/// have nothing to initialise and report so.
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let response = init_store(&config)?;
    write_response(&mut io::stdout(), response)
}

/// Execute a single request from stdin and exit
pub fn exec(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let handler = boot(&config)?;

    let request = read_request(&mut stdin())?;
    let response = handler.handle(&request);
    write_json(&mut io::stdout(), &response.to_json())
}

/// Serve requests from stdin until EOF
pub fn start(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let handler = boot(&config)?;

    log_event_with_fields(Event::Serving, &[("mode", config.mode.as_str())]);
    let served = serve(&handler, stdin(), io::stdout())?;

    log_event_with_fields(Event::ShutdownComplete, &[("requests", &served.to_string())]);
    Ok(())
}

/// Answer every request line from `input` on `output`; returns the count
///
/// Malformed requests get an error response and serving continues. Read
/// and write failures end the loop.
pub fn serve<R: BufRead, W: Write>(
    handler: &RequestHandler,
    input: R,
    mut output: W,
) -> CliResult<usize> {
    let mut served = 0;
    for line in read_requests(input) {
        let response = handler.handle(&line?);
        write_json(&mut output, &response.to_json())?;
        served += 1;
    }
    Ok(served)
}

/// Load config and apply its log level
fn load_config(config_path: &Path) -> CliResult<Config> {
    let config = Config::load(config_path)?;
    Logger::set_min_severity(config.log_severity()?);
    log_event_with_fields(
        Event::ConfigLoaded,
        &[
            ("path", &config_path.display().to_string()),
            ("mode", config.mode.as_str()),
        ],
    );
    Ok(config)
}

/// Open the store and build the request handler
pub fn boot(config: &Config) -> CliResult<RequestHandler> {
    log_event(Event::StartupBegin);

    let store = open_store(config)?;
    let dal = DataAccess::with_settings(store, config.dal_settings());

    log_event(Event::StartupComplete);
    Ok(RequestHandler::new(dal))
}

/// Open the store for the configured mode
pub fn open_store(config: &Config) -> CliResult<Arc<dyn DocumentStore>> {
    let store: Arc<dyn DocumentStore> = match config.mode {
        StoreMode::Emulator => {
            let store = Arc::new(MemoryStore::new());
            seed::import(store.as_ref(), &load_seed(config)?)?;
            store
        }
        StoreMode::Persistent => {
            let path = persistent_path(config)?;
            if !path.exists() {
                return Err(CliError::not_initialized(path.display()));
            }
            Arc::new(MemoryStore::open(path)?)
        }
        StoreMode::Ephemeral => Arc::new(MemoryStore::new()),
    };

    log_event_with_fields(Event::StoreOpened, &[("mode", config.mode.as_str())]);
    Ok(store)
}

/// Create the data file for persistent mode; returns the response data
pub fn init_store(config: &Config) -> CliResult<serde_json::Value> {
    if config.mode != StoreMode::Persistent {
        return Ok(json!({"initialized": false, "mode": config.mode.as_str()}));
    }

    let path = persistent_path(config)?;
    if path.exists() {
        return Err(CliError::already_initialized(path.display()));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            CliError::config_error(format!("Failed to create directory {:?}: {}", parent, e))
        })?;
    }

    let collections = match config.seed_path() {
        Some(seed_path) => seed::load(seed_path)?,
        None => CollectionsDump::new(),
    };
    let documents: usize = collections.values().map(|docs| docs.len()).sum();
    SnapshotFile::new(path).write(&collections)?;

    Ok(json!({
        "initialized": true,
        "mode": config.mode.as_str(),
        "documents": documents
    }))
}

fn load_seed(config: &Config) -> CliResult<CollectionsDump> {
    Ok(match config.seed_path() {
        Some(path) => seed::load(path)?,
        None => seed::sample()?,
    })
}

fn persistent_path(config: &Config) -> CliResult<&Path> {
    config
        .data_path()
        .ok_or_else(|| CliError::config_error("data_file is required when mode is 'persistent'"))
}
