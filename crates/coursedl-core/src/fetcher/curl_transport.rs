//! libcurl-backed transport (blocking `Easy` handle per attempt).

use std::io::{self, Write};
use std::time::Duration;

use super::transport::Transport;
use crate::retry::{classify_curl_error, AttemptError, ErrorKind};

/// Connect phase never waits longer than this, even with a longer stall timeout.
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Below this many bytes/s for the whole stall window, the transfer counts as stalled.
const STALL_SPEED_BYTES: u32 = 1;

#[derive(Debug, Clone)]
pub struct CurlTransport {
    user_agent: String,
}

impl CurlTransport {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }
}

impl Default for CurlTransport {
    fn default() -> Self {
        Self::new("Mozilla/5.0")
    }
}

fn map_curl_error(e: curl::Error) -> AttemptError {
    match classify_curl_error(&e) {
        ErrorKind::Timeout => AttemptError::Timeout,
        ErrorKind::Connection => AttemptError::Connection(e.to_string()),
        _ => AttemptError::Other(e.to_string()),
    }
}

impl Transport for CurlTransport {
    fn get(&self, url: &str, timeout: Duration, sink: &mut dyn Write) -> Result<u32, AttemptError> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url).map_err(map_curl_error)?;
        easy.follow_location(true).map_err(map_curl_error)?;
        easy.max_redirections(10).map_err(map_curl_error)?;
        easy.useragent(&self.user_agent).map_err(map_curl_error)?;
        easy.connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
            .map_err(map_curl_error)?;
        // `timeout` bounds inactivity, not the whole transfer: large videos may
        // take far longer than `timeout` while data keeps arriving.
        easy.low_speed_limit(STALL_SPEED_BYTES).map_err(map_curl_error)?;
        // curl counts the stall window in whole seconds; zero would disable it.
        easy.low_speed_time(timeout.max(Duration::from_secs(1)))
            .map_err(map_curl_error)?;

        let mut write_err: Option<io::Error> = None;
        let performed = {
            let mut transfer = easy.transfer();
            transfer
                .write_function(|data| match sink.write_all(data) {
                    Ok(()) => Ok(data.len()),
                    Err(e) => {
                        write_err = Some(e);
                        Ok(0) // abort transfer
                    }
                })
                .map_err(map_curl_error)?;
            transfer.perform()
        };

        if let Some(e) = write_err {
            return Err(AttemptError::Storage(e));
        }
        performed.map_err(map_curl_error)?;

        easy.response_code().map_err(map_curl_error)
    }
}
