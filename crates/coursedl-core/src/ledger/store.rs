//! File-backed ledger with an in-memory index of the latest row per key.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use super::entry::{FailedEntry, LedgerEntry, LedgerRow};
use crate::item::ItemStatus;

const HEADER: [&str; 4] = ["key", "status", "timestamp", "detail"];

struct Inner {
    writer: csv::Writer<File>,
    latest: HashMap<String, LedgerEntry>,
}

/// Append-only record of per-item outcomes. Safe to share between workers;
/// appends are serialized by an internal mutex.
pub struct ProgressLedger {
    path: PathBuf,
    inner: Mutex<Inner>,
}

impl ProgressLedger {
    /// Open (or create) the ledger at `path`, replaying existing rows.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create ledger dir: {}", parent.display()))?;
            }
        }

        let mut latest = HashMap::new();
        if path.exists() {
            for entry in read_entries(&path)? {
                latest.insert(entry.key.clone(), entry);
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open ledger: {}", path.display()))?;
        let len = file.metadata()?.len();
        // A crash mid-append can leave an unterminated row; never glue a new row onto it.
        if len > 0 && !ends_with_newline(&mut file)? {
            file.write_all(b"\n")?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if len == 0 {
            writer.write_record(HEADER)?;
            writer.flush()?;
        }

        tracing::debug!(
            path = %path.display(),
            keys = latest.len(),
            "ledger opened"
        );

        Ok(Self {
            path,
            inner: Mutex::new(Inner { writer, latest }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append a status change for `key`; durable on disk before returning.
    ///
    /// For `Failed`, an empty `detail` falls back to the failure reason.
    pub fn record(&self, key: &str, status: &ItemStatus, detail: &str) -> Result<LedgerEntry> {
        let detail = match status {
            ItemStatus::Failed(reason) if detail.is_empty() => reason.clone(),
            _ => detail.to_string(),
        };
        let status = match status {
            ItemStatus::Failed(_) => ItemStatus::Failed(detail.clone()),
            other => other.clone(),
        };
        let entry = LedgerEntry {
            key: key.to_string(),
            status,
            timestamp: unix_timestamp(),
            detail,
        };

        let mut inner = self.lock();
        inner
            .writer
            .serialize(entry.to_row())
            .with_context(|| format!("append ledger row for {}", key))?;
        inner.writer.flush()?;
        inner.writer.get_ref().sync_data().context("sync ledger")?;
        inner.latest.insert(entry.key.clone(), entry.clone());
        Ok(entry)
    }

    /// Latest recorded status for `key`; `Pending` if it was never recorded.
    pub fn status_of(&self, key: &str) -> ItemStatus {
        self.lock()
            .latest
            .get(key)
            .map(|e| e.status.clone())
            .unwrap_or(ItemStatus::Pending)
    }

    /// Latest entry per key, sorted by key.
    pub fn latest(&self) -> Vec<LedgerEntry> {
        let mut out: Vec<LedgerEntry> = self.lock().latest.values().cloned().collect();
        out.sort_by(|a, b| a.key.cmp(&b.key));
        out
    }

    /// Keys whose latest status is Failed, sorted by key.
    pub fn failures(&self) -> Vec<FailedEntry> {
        self.latest()
            .into_iter()
            .filter(|e| matches!(e.status, ItemStatus::Failed(_)))
            .map(|e| FailedEntry {
                key: e.key,
                detail: e.detail,
                timestamp: e.timestamp,
            })
            .collect()
    }

    /// Every row in file order, re-read from disk.
    pub fn entries(&self) -> Result<Vec<LedgerEntry>> {
        // Hold the lock so no half-written row is read.
        let _guard = self.lock();
        read_entries(&self.path)
    }

    /// Mark items left InProgress by a crashed run as Pending again.
    /// Returns how many were reset.
    pub fn recover_interrupted(&self) -> Result<usize> {
        let stuck: Vec<String> = self
            .lock()
            .latest
            .values()
            .filter(|e| e.status == ItemStatus::InProgress)
            .map(|e| e.key.clone())
            .collect();
        for key in &stuck {
            self.record(key, &ItemStatus::Pending, "interrupted by previous run")?;
        }
        Ok(stuck.len())
    }
}

fn ends_with_newline(file: &mut File) -> Result<bool> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// Parse all well-formed rows of a ledger file. Malformed rows are logged and skipped.
pub(crate) fn read_entries(path: &Path) -> Result<Vec<LedgerEntry>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("read ledger: {}", path.display()))?;
    let mut out = Vec::new();
    for row in reader.deserialize::<LedgerRow>() {
        match row {
            Ok(row) => {
                let status = row.status.clone();
                match LedgerEntry::from_row(row) {
                    Some(entry) => out.push(entry),
                    None => tracing::warn!("skipping ledger row with unknown status {:?}", status),
                }
            }
            Err(e) => tracing::warn!("skipping malformed ledger row: {}", e),
        }
    }
    Ok(out)
}

/// Current time as Unix seconds.
pub(crate) fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
