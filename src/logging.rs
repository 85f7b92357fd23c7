//! File logging for install runs
//!
//! All `tracing` records go to `<output_path>/install.log`, appended across
//! runs. The console is reserved for operator-facing output.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Log file name inside the output directory
pub const LOG_FILE_NAME: &str = "install.log";

/// Where the log for `output_path` lives
pub fn log_file_path(output_path: &Path) -> PathBuf {
    output_path.join(LOG_FILE_NAME)
}

/// Install the global subscriber writing to `<output_path>/install.log`.
///
/// Creates `output_path` if needed. `RUST_LOG` overrides the default
/// `debug` level. Each record is written straight to the file, so nothing
/// is left buffered when the process exits.
pub fn init_file_logger(output_path: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_path)
        .with_context(|| format!("Failed to create log directory {:?}", output_path))?;

    let path = log_file_path(output_path);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {:?}", path))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install logger: {}", e))?;

    Ok(path)
}
