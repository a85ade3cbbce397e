use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Upper bound for either backoff setting.
const MAX_BACKOFF_SECS: u64 = 3600;

/// Backoff parameters (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Base delay in seconds for exponential backoff (e.g. 0.5 = 500ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_secs: 1.0,
            max_delay_secs: 30,
        }
    }
}

/// Global configuration loaded from `~/.config/coursedl/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoursedlConfig {
    /// Maximum attempts per item (including the first).
    pub max_retries: u32,
    /// Seconds a fetch may sit without receiving data (also caps connecting).
    pub timeout_secs: u64,
    /// Number of items downloaded concurrently.
    pub concurrency: usize,
    /// Directory that item destinations are resolved against.
    pub base_dir: PathBuf,
    /// Ledger file; defaults to `~/.local/state/coursedl/ledger.csv`.
    #[serde(default)]
    pub ledger_path: Option<PathBuf>,
    /// User-Agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Two interrupts closer together than this exit instead of toggling pause.
    #[serde(default = "default_double_interrupt_window_ms")]
    pub double_interrupt_window_ms: u64,
    /// How often paused workers re-check the pause state.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Optional backoff tuning; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

fn default_user_agent() -> String {
    "Mozilla/5.0".to_string()
}

fn default_double_interrupt_window_ms() -> u64 {
    2000
}

fn default_poll_interval_ms() -> u64 {
    250
}

impl Default for CoursedlConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            timeout_secs: 60,
            concurrency: 3,
            base_dir: PathBuf::from("Courses"),
            ledger_path: None,
            user_agent: default_user_agent(),
            double_interrupt_window_ms: default_double_interrupt_window_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            retry: None,
        }
    }
}

impl CoursedlConfig {
    /// Reject values the downloader cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_retries < 1 {
            bail!("max_retries must be at least 1 (got {})", self.max_retries);
        }
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be greater than 0");
        }
        if self.concurrency < 1 {
            bail!("concurrency must be at least 1 (got {})", self.concurrency);
        }
        if self.poll_interval_ms == 0 {
            bail!("poll_interval_ms must be greater than 0");
        }
        if let Some(retry) = &self.retry {
            if !(retry.base_delay_secs.is_finite() && retry.base_delay_secs >= 0.0) {
                bail!("retry.base_delay_secs must be a non-negative number");
            }
            if retry.base_delay_secs > MAX_BACKOFF_SECS as f64 || retry.max_delay_secs > MAX_BACKOFF_SECS {
                bail!("retry delays must not exceed {} seconds", MAX_BACKOFF_SECS);
            }
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn double_interrupt_window(&self) -> Duration {
        Duration::from_millis(self.double_interrupt_window_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Backoff policy built from `[retry]` and `max_retries`.
    pub fn retry_policy(&self) -> RetryPolicy {
        let retry = self.retry.clone().unwrap_or_default();
        RetryPolicy {
            max_attempts: self.max_retries,
            base_delay: Duration::try_from_secs_f64(retry.base_delay_secs.max(0.0))
                .unwrap_or(Duration::MAX)
                .min(Duration::from_secs(MAX_BACKOFF_SECS)),
            max_delay: Duration::from_secs(retry.max_delay_secs),
        }
    }

    /// Configured ledger path, or the default under the XDG state dir.
    pub fn ledger_path(&self) -> Result<PathBuf> {
        if let Some(p) = &self.ledger_path {
            return Ok(p.clone());
        }
        default_ledger_path()
    }
}

pub fn default_ledger_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("coursedl")?;
    Ok(xdg_dirs.get_state_home().join("coursedl").join("ledger.csv"))
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("coursedl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<CoursedlConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = CoursedlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: CoursedlConfig = toml::from_str(&data)?;
    cfg.validate()?;
    Ok(cfg)
}
