//! Retrying: which failures deserve another attempt, and how long to wait.
//!
//! The fetcher reports each attempt as an `AttemptError`; `run_with_retry`
//! classifies it, consults the `RetryPolicy` and finally surfaces a
//! `FetchError` carrying the failure class the ledger records.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use error::{AttemptError, FailureClass, FetchError, FetchErrorKind};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
