//! Durable progress ledger (append-only CSV).
//!
//! Every status change is one row `key,status,timestamp,detail`, fsynced
//! before `record` returns. The latest row per key decides resume behavior.

mod entry;
mod store;

pub use entry::{FailedEntry, LedgerEntry};
pub use store::ProgressLedger;
