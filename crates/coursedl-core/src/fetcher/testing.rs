//! Scripted in-memory transport for fetcher and pool tests.

use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::transport::Transport;
use crate::retry::AttemptError;

/// What one attempt against a URL does.
#[derive(Debug, Clone)]
pub(crate) enum Step {
    /// 200 with this body.
    Body(Vec<u8>),
    /// Non-2xx status with a small error page.
    Status(u32),
    /// Writes some bytes, then times out.
    PartialThenTimeout(Vec<u8>),
}

/// Replays per-URL scripts; once a script runs out its last step repeats.
/// Unscripted URLs answer 200 with the URL as body.
pub(crate) struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    calls: Mutex<Vec<String>>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    /// Every attempt blocks for `delay` before answering.
    pub(crate) fn with_delay(delay: Duration) -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            delay,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub(crate) fn script(&self, url: &str, steps: Vec<Step>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), steps.into());
    }

    pub(crate) fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_step(&self, url: &str) -> Step {
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(url) {
            Some(steps) if steps.len() > 1 => steps.pop_front().unwrap(),
            Some(steps) => steps
                .front()
                .cloned()
                .unwrap_or_else(|| Step::Body(url.as_bytes().to_vec())),
            None => Step::Body(url.as_bytes().to_vec()),
        }
    }
}

impl Transport for ScriptedTransport {
    fn get(&self, url: &str, _timeout: Duration, sink: &mut dyn Write) -> Result<u32, AttemptError> {
        self.calls.lock().unwrap().push(url.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        let result = match self.next_step(url) {
            Step::Body(body) => sink.write_all(&body).map(|()| 200).map_err(AttemptError::from),
            Step::Status(code) => sink
                .write_all(b"error page")
                .map(|()| code)
                .map_err(AttemptError::from),
            Step::PartialThenTimeout(bytes) => {
                let _ = sink.write_all(&bytes);
                Err(AttemptError::Timeout)
            }
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
