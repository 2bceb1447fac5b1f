// Logging setup.
// The TUI owns the terminal, so logs go to a file instead of stderr:
// <data dir>/karaoke-night/karaoke-night.log

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::Level;

const LOG_FILE: &str = "karaoke-night.log";

pub fn log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("karaoke-night")
        .join(LOG_FILE)
}

// Unknown level names fall back to info rather than refusing to start
pub fn parse_level(name: &str) -> Level {
    Level::from_str(name.trim()).unwrap_or(Level::INFO)
}

pub fn init(level: &str) -> Result<PathBuf> {
    let path = log_path();
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("creating log directory {}", dir.display()))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_max_level(parse_level(level))
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| anyhow::anyhow!("logger already initialised: {}", e))?;

    Ok(path)
}
