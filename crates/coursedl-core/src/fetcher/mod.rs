//! Retrying single-file fetcher.
//!
//! Wraps a `Transport` with the shared retry policy and the temp-file
//! lifecycle: every attempt streams into `<destination>.part`, and only a 2xx
//! response is synced and renamed onto the destination.

mod curl_transport;
mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use curl_transport::CurlTransport;
pub use transport::Transport;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::retry::{run_with_retry, AttemptError, FetchError, RetryPolicy};
use crate::storage::TempFile;

/// Fetches one URL to one file with bounded retry.
#[derive(Clone)]
pub struct RetryingFetcher {
    transport: Arc<dyn Transport>,
    backoff: RetryPolicy,
}

impl RetryingFetcher {
    /// `backoff` supplies base and max delay; the attempt budget is passed per fetch.
    pub fn new(transport: Arc<dyn Transport>, backoff: RetryPolicy) -> Self {
        Self { transport, backoff }
    }

    /// Download `url` to `destination`. Returns the number of bytes written.
    ///
    /// On success the destination holds the complete body; on failure neither
    /// the destination nor its `.part` file is touched or left behind.
    pub fn fetch(
        &self,
        url: &str,
        destination: &Path,
        max_attempts: u32,
        timeout: Duration,
    ) -> Result<u64, FetchError> {
        if max_attempts < 1 {
            return Err(FetchError::invalid("max_attempts must be at least 1"));
        }
        if timeout.is_zero() {
            return Err(FetchError::invalid("timeout must be greater than zero"));
        }
        let policy = self.backoff.with_max_attempts(max_attempts);
        run_with_retry(&policy, |attempt| {
            tracing::debug!(url, attempt, max_attempts, "fetch attempt");
            self.attempt(url, destination, timeout)
        })
    }

    fn attempt(&self, url: &str, destination: &Path, timeout: Duration) -> Result<u64, AttemptError> {
        let mut tmp = TempFile::create(destination)?;
        let code = self.transport.get(url, timeout, &mut tmp)?;
        if !(200..300).contains(&code) {
            return Err(AttemptError::Http(code));
        }
        let written = tmp.finalize(destination)?;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{ScriptedTransport, Step};
    use super::*;
    use crate::retry::{FailureClass, FetchErrorKind};
    use crate::storage::temp_path;
    use std::fs;

    fn fast_backoff() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 1,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        }
    }

    fn fetcher(transport: Arc<ScriptedTransport>) -> RetryingFetcher {
        RetryingFetcher::new(transport, fast_backoff())
    }

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn success_writes_full_body() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("c").join("lesson.mp4");
        let t = Arc::new(ScriptedTransport::new());
        t.script("https://cdn/ok", vec![Step::Body(b"video bytes".to_vec())]);

        let n = fetcher(Arc::clone(&t)).fetch("https://cdn/ok", &dest, 3, TIMEOUT).unwrap();

        assert_eq!(n, 11);
        assert_eq!(fs::read(&dest).unwrap(), b"video bytes");
        assert!(!temp_path(&dest).exists());
        assert_eq!(t.calls_for("https://cdn/ok"), 1);
    }

    #[test]
    fn transient_failures_after_partial_writes_then_success() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("lesson.mp4");
        let t = Arc::new(ScriptedTransport::new());
        t.script(
            "https://cdn/flaky",
            vec![
                Step::PartialThenTimeout(b"garbage-".to_vec()),
                Step::PartialThenTimeout(b"more garbage".to_vec()),
                Step::Body(b"the real thing".to_vec()),
            ],
        );

        let n = fetcher(Arc::clone(&t))
            .fetch("https://cdn/flaky", &dest, 3, TIMEOUT)
            .unwrap();

        assert_eq!(n, 14);
        assert_eq!(fs::read(&dest).unwrap(), b"the real thing");
        assert!(!temp_path(&dest).exists(), "no partial file left behind");
        assert_eq!(t.calls_for("https://cdn/flaky"), 3);
    }

    #[test]
    fn exhausted_retries_leave_nothing_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("lesson.mp4");
        let t = Arc::new(ScriptedTransport::new());
        t.script(
            "https://cdn/down",
            vec![
                Step::Status(503),
                Step::PartialThenTimeout(b"xx".to_vec()),
                Step::Status(502),
            ],
        );

        let err = fetcher(Arc::clone(&t))
            .fetch("https://cdn/down", &dest, 3, TIMEOUT)
            .unwrap_err();

        assert_eq!(err.attempts_used, 3);
        assert_eq!(err.kind, FetchErrorKind::Http(502));
        assert_eq!(err.class(), FailureClass::Transient);
        assert!(!dest.exists());
        assert!(!temp_path(&dest).exists());
    }

    #[test]
    fn not_found_is_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("missing.pdf");
        let t = Arc::new(ScriptedTransport::new());
        t.script("https://cdn/404", vec![Step::Status(404)]);

        let err = fetcher(Arc::clone(&t))
            .fetch("https://cdn/404", &dest, 5, TIMEOUT)
            .unwrap_err();

        assert_eq!(err.attempts_used, 1);
        assert_eq!(err.class(), FailureClass::Permanent);
        assert_eq!(t.calls_for("https://cdn/404"), 1);
        assert!(!dest.exists());
    }

    #[test]
    fn unwritable_destination_is_local_io() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"file in the way").unwrap();
        let dest = blocker.join("lesson.mp4");
        let t = Arc::new(ScriptedTransport::new());

        let err = fetcher(Arc::clone(&t))
            .fetch("https://cdn/ok", &dest, 3, TIMEOUT)
            .unwrap_err();

        assert_eq!(err.class(), FailureClass::LocalIo);
        assert_eq!(err.attempts_used, 1);
        assert_eq!(t.calls_for("https://cdn/ok"), 0);
    }

    #[test]
    fn rejects_invalid_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("x");
        let t = Arc::new(ScriptedTransport::new());
        let f = fetcher(Arc::clone(&t));

        let err = f.fetch("https://cdn/ok", &dest, 0, TIMEOUT).unwrap_err();
        assert!(matches!(err.kind, FetchErrorKind::InvalidRequest(_)));
        let err = f.fetch("https://cdn/ok", &dest, 1, Duration::ZERO).unwrap_err();
        assert!(matches!(err.kind, FetchErrorKind::InvalidRequest(_)));
        assert_eq!(t.total_calls(), 0);
    }
}
