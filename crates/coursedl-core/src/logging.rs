//! Structured logging for the CLI.
//!
//! Events go to `$XDG_STATE_HOME/coursedl/coursedl.log`; when that file cannot
//! be opened the caller falls back to stderr so downloads still run.

use anyhow::{anyhow, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Used when `RUST_LOG` is unset or unparsable.
const DEFAULT_FILTER: &str = "info,coursedl=debug,coursedl_core=debug";

const LOG_FILE_NAME: &str = "coursedl.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Log file location under the XDG state dir.
pub fn default_log_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("coursedl")?;
    Ok(xdg_dirs.get_state_home().join("coursedl").join(LOG_FILE_NAME))
}

/// Append log events to `path`, creating its directory. Errs if the file
/// cannot be opened or a global subscriber is already installed.
pub fn init_logging_to(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = fs::OpenOptions::new().create(true).append(true).open(path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("install subscriber: {}", e))?;

    tracing::info!("coursedl logging to {}", path.display());
    Ok(())
}

/// File logging at the default location. Returns the log path.
pub fn init_logging() -> Result<PathBuf> {
    let path = default_log_path()?;
    init_logging_to(&path)?;
    Ok(path)
}

/// Stderr-only logging, for when `init_logging` fails.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init();
}
