//! Per-attempt and final fetch error types.

use std::fmt;

/// Error from a single fetch attempt (transport failure, HTTP error, or storage failure).
/// Used so we can classify and decide retries before it becomes a `FetchError`.
#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    /// The transfer exceeded its timeout.
    #[error("timed out")]
    Timeout,
    /// Network-level failure (refused, reset, DNS, truncated body).
    #[error("connection: {0}")]
    Connection(String),
    /// HTTP response had a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Disk/storage write failed (e.g. disk full, permission denied). Not retried.
    #[error("storage: {0}")]
    Storage(#[from] std::io::Error),
    /// Anything the transport could not classify. Not retried.
    #[error("{0}")]
    Other(String),
}

/// What ultimately went wrong with a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchErrorKind {
    Timeout,
    Http(u32),
    Connection(String),
    Io(String),
    /// Transport failure that is not worth retrying (TLS, protocol, bad URL).
    Other(String),
    /// Request parameters were rejected before any attempt was made.
    InvalidRequest(String),
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchErrorKind::Timeout => write!(f, "timeout"),
            FetchErrorKind::Http(code) => write!(f, "HTTP {}", code),
            FetchErrorKind::Connection(msg) => write!(f, "connection: {}", msg),
            FetchErrorKind::Io(msg) => write!(f, "io: {}", msg),
            FetchErrorKind::Other(msg) => f.write_str(msg),
            FetchErrorKind::InvalidRequest(msg) => write!(f, "invalid request: {}", msg),
        }
    }
}

/// Failure taxonomy reported to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Retryable (timeouts, 5xx, 429, connection); only surfaces once retries run out.
    Transient,
    /// Not retried (404, 403, other client errors).
    Permanent,
    /// Local disk problems (disk full, permission denied). Not retried.
    LocalIo,
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureClass::Transient => "TransientFetchError",
            FailureClass::Permanent => "PermanentFetchError",
            FailureClass::LocalIo => "LocalIOError",
        };
        f.write_str(s)
    }
}

/// Final error of a fetch after retries were exhausted or a non-retryable error hit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} after {attempts_used} attempt(s)")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub attempts_used: u32,
}

impl FetchError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::InvalidRequest(msg.into()),
            attempts_used: 0,
        }
    }

    pub(crate) fn from_attempt(e: AttemptError, attempts_used: u32) -> Self {
        let kind = match e {
            AttemptError::Timeout => FetchErrorKind::Timeout,
            AttemptError::Connection(msg) => FetchErrorKind::Connection(msg),
            AttemptError::Http(code) => FetchErrorKind::Http(code),
            AttemptError::Storage(io) => FetchErrorKind::Io(io.to_string()),
            AttemptError::Other(msg) => FetchErrorKind::Other(msg),
        };
        Self {
            kind,
            attempts_used,
        }
    }

    pub fn class(&self) -> FailureClass {
        match &self.kind {
            FetchErrorKind::Timeout | FetchErrorKind::Connection(_) => FailureClass::Transient,
            FetchErrorKind::Http(code) => match super::classify_http_status(*code) {
                super::ErrorKind::Other => FailureClass::Permanent,
                _ => FailureClass::Transient,
            },
            FetchErrorKind::Io(_) => FailureClass::LocalIo,
            FetchErrorKind::Other(_) | FetchErrorKind::InvalidRequest(_) => {
                FailureClass::Permanent
            }
        }
    }

    /// One-line description for the ledger's detail column.
    pub fn ledger_detail(&self) -> String {
        format!("{}: {}", self.class(), self)
    }
}
