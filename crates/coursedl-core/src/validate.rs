//! Cross-check the ledger against what is actually on disk.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use crate::item::{DownloadItem, ItemStatus};
use crate::ledger::ProgressLedger;
use crate::storage::is_present;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discrepancy {
    /// Ledger says done, file is missing or empty.
    Missing,
    /// File is present but the ledger never recorded it as done.
    Unrecorded,
}

impl Discrepancy {
    pub fn as_str(self) -> &'static str {
        match self {
            Discrepancy::Missing => "missing",
            Discrepancy::Unrecorded => "unrecorded",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRow {
    pub key: String,
    pub recorded: ItemStatus,
    pub on_disk: bool,
    pub issue: Option<Discrepancy>,
}

#[derive(Serialize)]
struct CsvRow<'a> {
    key: &'a str,
    recorded: &'a str,
    on_disk: bool,
    issue: &'a str,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub rows: Vec<ValidationRow>,
}

impl ValidationReport {
    pub fn checked(&self) -> usize {
        self.rows.len()
    }

    pub fn discrepancies(&self) -> impl Iterator<Item = &ValidationRow> {
        self.rows.iter().filter(|r| r.issue.is_some())
    }

    pub fn discrepancy_count(&self) -> usize {
        self.discrepancies().count()
    }

    pub fn is_consistent(&self) -> bool {
        self.discrepancy_count() == 0
    }

    /// Write every row as CSV: `key,recorded,on_disk,issue`.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut w = csv::Writer::from_path(path)
            .with_context(|| format!("create report: {}", path.display()))?;
        for row in &self.rows {
            w.serialize(CsvRow {
                key: &row.key,
                recorded: row.recorded.as_str(),
                on_disk: row.on_disk,
                issue: row.issue.map(Discrepancy::as_str).unwrap_or(""),
            })?;
        }
        w.flush()?;
        Ok(())
    }
}

/// Compare each item's latest ledger status with its destination under `base_dir`.
pub fn validate(items: &[DownloadItem], base_dir: &Path, ledger: &ProgressLedger) -> ValidationReport {
    let rows = items
        .iter()
        .map(|item| {
            let recorded = ledger.status_of(&item.key);
            let on_disk = is_present(&item.resolve(base_dir));
            let issue = match (recorded.is_done(), on_disk) {
                (true, false) => Some(Discrepancy::Missing),
                (false, true) => Some(Discrepancy::Unrecorded),
                _ => None,
            };
            if let Some(d) = issue {
                tracing::warn!(key = %item.key, status = %recorded, "ledger/disk mismatch: {}", d.as_str());
            }
            ValidationRow {
                key: item.key.clone(),
                recorded,
                on_disk,
                issue,
            }
        })
        .collect();
    ValidationReport { rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn item(n: u32) -> DownloadItem {
        DownloadItem::new(format!("c|m|{n}"), format!("https://x/{n}"), format!("c/{n}.mp4"))
    }

    #[test]
    fn flags_missing_and_unrecorded() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("dl");
        let ledger = ProgressLedger::open(dir.path().join("ledger.csv")).unwrap();
        let items: Vec<_> = (1..=4).map(item).collect();

        // 1: done and present. 2: done but deleted. 3: present, never recorded. 4: neither.
        fs::create_dir_all(base.join("c")).unwrap();
        fs::write(base.join("c/1.mp4"), b"a").unwrap();
        fs::write(base.join("c/3.mp4"), b"c").unwrap();
        ledger.record("c|m|1", &ItemStatus::Succeeded, "1 bytes").unwrap();
        ledger.record("c|m|2", &ItemStatus::Skipped, "").unwrap();

        let report = validate(&items, &base, &ledger);

        assert_eq!(report.checked(), 4);
        assert_eq!(report.discrepancy_count(), 2);
        let issues: Vec<_> = report.rows.iter().map(|r| r.issue).collect();
        assert_eq!(
            issues,
            vec![None, Some(Discrepancy::Missing), Some(Discrepancy::Unrecorded), None]
        );
    }

    #[test]
    fn empty_file_counts_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().to_path_buf();
        let ledger = ProgressLedger::open(dir.path().join("ledger.csv")).unwrap();
        fs::create_dir_all(base.join("c")).unwrap();
        fs::write(base.join("c/1.mp4"), b"").unwrap();
        ledger.record("c|m|1", &ItemStatus::Succeeded, "").unwrap();

        let report = validate(&[item(1)], &base, &ledger);
        assert_eq!(report.rows[0].issue, Some(Discrepancy::Missing));
        assert!(!report.is_consistent());
    }

    #[test]
    fn csv_report_has_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ProgressLedger::open(dir.path().join("ledger.csv")).unwrap();
        ledger.record("c|m|1", &ItemStatus::Succeeded, "").unwrap();
        let report = validate(&[item(1)], dir.path(), &ledger);

        let out = dir.path().join("report.csv");
        report.write_csv(&out).unwrap();
        let text = fs::read_to_string(&out).unwrap();
        assert_eq!(text, "key,recorded,on_disk,issue\nc|m|1,succeeded,false,missing\n");
    }
}
