//! One-shot HTTP GET abstraction used by the retrying fetcher.

use std::io::Write;
use std::time::Duration;

use crate::retry::AttemptError;

/// Performs a single GET attempt. Implementations stream the response body
/// into `sink` and return the HTTP status; retries live one layer up.
///
/// `timeout` bounds connecting and any stretch without incoming data; a
/// transfer that keeps making progress is never cut off.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str, timeout: Duration, sink: &mut dyn Write) -> Result<u32, AttemptError>;
}
