//! Minimal HTTP/1.1 server for integration tests.
//!
//! Routes by path:
//! - `/ok/<name>` answers 200 with the configured body.
//! - `/missing/<name>` answers 404.
//! - `/flaky/<name>` answers 503 for the first `flaky_failures` hits on that
//!   path, then 200 with the body.
//! - `/slow/<name>` answers 200 with `slow_body`, one byte every `slow_byte_delay`.
//! - `/stall/<name>` answers 200, sends half of `slow_body`, then goes silent
//!   for `stall_for` before closing.
//!
//! Every response carries Content-Length and `Connection: close`.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub body: Vec<u8>,
    /// 503 responses served per `/flaky/...` path before it succeeds.
    pub flaky_failures: usize,
    /// Body for `/slow/...` and `/stall/...`.
    pub slow_body: Vec<u8>,
    pub slow_byte_delay: Duration,
    pub stall_for: Duration,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            body: (0u8..=255).cycle().take(32 * 1024).collect(),
            flaky_failures: 1,
            slow_body: b"0123456789abcdefghijklmno".to_vec(),
            slow_byte_delay: Duration::from_millis(100),
            stall_for: Duration::from_secs(5),
        }
    }
}

/// Handle to a running server. Lives until the process exits.
#[derive(Clone)]
pub struct TestServer {
    base: String,
    hits: Arc<Mutex<HashMap<String, usize>>>,
}

impl TestServer {
    /// `path` must start with `/`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn hits(&self, path: &str) -> usize {
        self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }
}

pub fn start() -> TestServer {
    start_with_options(ServerOptions::default())
}

pub fn start_with_options(opts: ServerOptions) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let hits = Arc::new(Mutex::new(HashMap::new()));
    let opts = Arc::new(opts);
    let server_hits = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let opts = Arc::clone(&opts);
            let hits = Arc::clone(&server_hits);
            thread::spawn(move || handle(stream, &opts, &hits));
        }
    });
    TestServer {
        base: format!("http://127.0.0.1:{}", port),
        hits,
    }
}

fn handle(mut stream: TcpStream, opts: &ServerOptions, hits: &Mutex<HashMap<String, usize>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_nodelay(true);
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    let seen = {
        let mut hits = hits.lock().unwrap();
        let count = hits.entry(path.clone()).or_insert(0);
        *count += 1;
        *count
    };

    if path.starts_with("/slow/") || path.starts_with("/stall/") {
        let _ = stream.write_all(head("200 OK", opts.slow_body.len()).as_bytes());
        if path.starts_with("/slow/") {
            for byte in &opts.slow_body {
                thread::sleep(opts.slow_byte_delay);
                if stream.write_all(std::slice::from_ref(byte)).is_err() {
                    return;
                }
            }
        } else {
            let _ = stream.write_all(&opts.slow_body[..opts.slow_body.len() / 2]);
            thread::sleep(opts.stall_for);
        }
        return;
    }

    let (status, body): (&str, &[u8]) = if path.starts_with("/ok/") {
        ("200 OK", &opts.body)
    } else if path.starts_with("/flaky/") && seen <= opts.flaky_failures {
        ("503 Service Unavailable", b"try again later")
    } else if path.starts_with("/flaky/") {
        ("200 OK", &opts.body)
    } else {
        ("404 Not Found", b"not found")
    };
    let _ = stream.write_all(head(status, body.len()).as_bytes());
    let _ = stream.write_all(body);
}

fn head(status: &str, len: usize) -> String {
    format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nContent-Type: application/octet-stream\r\nConnection: close\r\n\r\n",
        status, len
    )
}
