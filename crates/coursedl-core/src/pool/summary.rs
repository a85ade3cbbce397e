//! Run summary and the failed-downloads report.

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::Path;

/// One item that ended the run Failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    pub key: String,
    pub url: String,
    pub detail: String,
}

/// Outcome counts for one pool run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Items never claimed because the run was told to exit.
    pub not_started: usize,
    pub failures: Vec<FailedItem>,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.skipped + self.not_started
    }

    pub(crate) fn merge(&mut self, other: Summary) {
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.not_started += other.not_started;
        self.failures.extend(other.failures);
    }

    /// Plain-text list of failures, one block per item.
    pub fn failure_report(&self) -> String {
        let mut out = String::new();
        for f in &self.failures {
            let _ = write!(out, "[FAILED] {}\nURL: {}\nError: {}\n\n", f.key, f.url, f.detail);
        }
        out
    }

    /// Write `failure_report` to `path`. Without failures, a report left by an
    /// earlier run is removed instead. Returns whether a report was written.
    pub fn write_failure_report(&self, path: &Path) -> Result<bool> {
        if self.failures.is_empty() {
            match std::fs::remove_file(path) {
                Ok(()) => tracing::debug!("removed stale failure report {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("remove stale failure report: {}", path.display()))
                }
            }
            return Ok(false);
        }
        std::fs::write(path, self.failure_report())
            .with_context(|| format!("write failure report: {}", path.display()))?;
        Ok(true)
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "succeeded={} failed={} skipped={} not_started={}",
            self.succeeded, self.failed, self.skipped, self.not_started
        )
    }
}
