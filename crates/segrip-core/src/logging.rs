//! Logging setup: `tracing` to a file under the XDG state dir, stderr as fallback.
//!
//! `RUST_LOG` overrides the default filter in both modes.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Default file filter: phases at info, per-segment events from our crates at debug.
const FILE_FILTER: &str = "info,segrip=debug,segrip_core=debug";
/// Stderr shares the terminal with the progress bar, so keep it quiet.
const STDERR_FILTER: &str = "warn";

fn env_filter_or(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// `$XDG_STATE_HOME/segrip/segrip.log` (directory created if missing).
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("segrip")?;
    let dir = xdg_dirs.get_state_home();
    fs::create_dir_all(&dir).with_context(|| format!("create log dir {}", dir.display()))?;
    Ok(dir.join("segrip.log"))
}

/// Installs the global subscriber writing to [`log_file_path`].
///
/// Lines carry the thread id so interleaved download workers can be told
/// apart. Returns Err if the file cannot be opened or a subscriber is already
/// set; the caller then falls back to [`init_logging_stderr`].
pub fn init_logging() -> Result<PathBuf> {
    let path = log_file_path()?;
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter_or(FILE_FILTER))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_thread_ids(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("install subscriber: {}", e))?;

    tracing::info!(path = %path.display(), "segrip logging initialized");
    Ok(path)
}

/// Stderr-only logging. Never fails; a second call is a no-op.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter_or(STDERR_FILTER))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
