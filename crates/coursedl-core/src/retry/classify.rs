//! Map HTTP statuses, curl errors and attempt errors onto `ErrorKind`.

use super::error::AttemptError;
use super::policy::ErrorKind;

/// 429 and 503 mean "slow down"; other 5xx are server faults; the rest are final.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::Http5xx(code as u16),
        _ => ErrorKind::Other,
    }
}

/// Timeouts and network drops (including a body cut short) are retryable;
/// TLS, protocol and URL errors are not.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    let dropped = [
        e.is_couldnt_connect(),
        e.is_couldnt_resolve_host(),
        e.is_couldnt_resolve_proxy(),
        e.is_recv_error(),
        e.is_send_error(),
        e.is_read_error(),
        e.is_got_nothing(),
        e.is_partial_file(),
    ];
    if e.is_operation_timedout() {
        ErrorKind::Timeout
    } else if dropped.contains(&true) {
        ErrorKind::Connection
    } else {
        ErrorKind::Other
    }
}

/// Local storage failures are never retried: another attempt would hit the same disk.
pub fn classify(e: &AttemptError) -> ErrorKind {
    match e {
        AttemptError::Timeout => ErrorKind::Timeout,
        AttemptError::Connection(_) => ErrorKind::Connection,
        AttemptError::Http(code) => classify_http_status(*code),
        AttemptError::Storage(_) | AttemptError::Other(_) => ErrorKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttling_statuses() {
        for code in [429, 503] {
            assert_eq!(classify_http_status(code), ErrorKind::Throttled);
        }
    }

    #[test]
    fn server_faults_keep_their_code() {
        assert_eq!(classify_http_status(500), ErrorKind::Http5xx(500));
        assert_eq!(classify_http_status(504), ErrorKind::Http5xx(504));
    }

    #[test]
    fn client_errors_are_final() {
        for code in [400, 401, 403, 404, 410] {
            assert_eq!(classify_http_status(code), ErrorKind::Other, "status {code}");
        }
    }

    #[test]
    fn attempt_errors() {
        let disk = AttemptError::Storage(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert_eq!(classify(&disk), ErrorKind::Other);
        assert_eq!(classify(&AttemptError::Timeout), ErrorKind::Timeout);
        assert_eq!(classify(&AttemptError::Connection("reset".into())), ErrorKind::Connection);
        assert_eq!(classify(&AttemptError::Http(502)), ErrorKind::Http5xx(502));
    }
}
