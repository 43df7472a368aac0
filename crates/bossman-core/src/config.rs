//! Process-level conventions shared by the bossman binaries.
//!
//! No config files: the data directory and log level come from the
//! environment, with home-directory defaults.

use std::io;
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

/// Data directory: $BOSSMAN_HOME, defaulting to ~/.bossman
pub fn bossman_home() -> PathBuf {
    if let Ok(home) = std::env::var("BOSSMAN_HOME") {
        return PathBuf::from(home);
    }
    dirs::home_dir()
        .map(|h| h.join(".bossman"))
        .unwrap_or_else(|| PathBuf::from(".bossman"))
}

/// Database path: $BOSSMAN_DB, defaulting to <home>/bossman.db
pub fn db_path() -> PathBuf {
    if let Ok(path) = std::env::var("BOSSMAN_DB") {
        return PathBuf::from(path);
    }
    bossman_home().join("bossman.db")
}

/// Resolve the database path and make sure its directory exists.
pub fn prepare_db_path() -> io::Result<PathBuf> {
    let path = db_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(path)
}

fn log_filter() -> EnvFilter {
    let level = if let Ok(v) = std::env::var("RUST_LOG") {
        v
    } else if let Ok(v) = std::env::var("BOSSMAN_LOG_LEVEL") {
        match v.as_str() {
            "silent" => "off".to_string(),
            other => other.to_string(),
        }
    } else {
        "warn".to_string()
    };

    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install the global tracing subscriber.
///
/// Diagnostics always go to stderr: stdout belongs to the protocol
/// stream in the MCP server and to command output in the CLI.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(std::io::stderr)
        .init();
}
