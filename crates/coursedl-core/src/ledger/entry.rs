//! Row types stored in the ledger file.

use serde::{Deserialize, Serialize};

use crate::item::ItemStatus;

/// Raw CSV row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct LedgerRow {
    pub key: String,
    pub status: String,
    pub timestamp: i64,
    #[serde(default)]
    pub detail: String,
}

/// One recorded status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub key: String,
    pub status: ItemStatus,
    /// Unix seconds.
    pub timestamp: i64,
    pub detail: String,
}

impl LedgerEntry {
    pub(crate) fn to_row(&self) -> LedgerRow {
        LedgerRow {
            key: self.key.clone(),
            status: self.status.as_str().to_string(),
            timestamp: self.timestamp,
            detail: self.detail.clone(),
        }
    }

    pub(crate) fn from_row(row: LedgerRow) -> Option<Self> {
        let status = ItemStatus::from_parts(&row.status, &row.detail)?;
        Some(Self {
            key: row.key,
            status,
            timestamp: row.timestamp,
            detail: row.detail,
        })
    }
}

/// An item whose latest status is Failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedEntry {
    pub key: String,
    pub detail: String,
    pub timestamp: i64,
}
