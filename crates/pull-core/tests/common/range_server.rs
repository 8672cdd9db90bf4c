//! Minimal HTTP/1.1 server that supports HEAD and Range GET for integration tests.
//!
//! Serves a single static body. Responds to HEAD with Content-Length and
//! Accept-Ranges: bytes; responds to GET with Range with 206 Partial Content.
//! Switches in `RangeServerOptions` make it misbehave in specific ways.
//! Any path starting with `/redirect` answers 302 to `/`.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// What HEAD reports as Content-Length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadLength {
    Actual,
    Omit,
    Raw(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct RangeServerOptions {
    /// If false, HEAD omits `Accept-Ranges: bytes`.
    pub advertise_ranges: bool,
    pub head_length: HeadLength,
    /// If false, GET ignores Range and returns 200 with the full body and no Content-Range.
    pub support_ranges: bool,
    /// Declare (and send) this many bytes more than requested.
    pub declare_extra: usize,
    /// Send this many bytes more than requested with no Content-Length (close-delimited).
    pub overflow_extra: usize,
    /// Answer 500 to the range starting at this offset.
    pub fail_range_start: Option<u64>,
    /// Sleep before answering the range starting at this offset.
    pub delay_range_start: Option<(u64, Duration)>,
}

impl Default for RangeServerOptions {
    fn default() -> Self {
        Self {
            advertise_ranges: true,
            head_length: HeadLength::Actual,
            support_ranges: true,
            declare_extra: 0,
            overflow_extra: 0,
            fail_range_start: None,
            delay_range_start: None,
        }
    }
}

/// A running test server. It lives until the process exits.
#[derive(Clone)]
pub struct RangeServer {
    /// Base URL, e.g. "http://127.0.0.1:12345/".
    pub url: String,
    gets: Arc<AtomicUsize>,
    user_agents: Arc<Mutex<Vec<String>>>,
}

impl RangeServer {
    /// Number of GET requests served so far.
    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// `User-Agent` values seen, in arrival order.
    pub fn user_agents(&self) -> Vec<String> {
        self.user_agents.lock().unwrap().clone()
    }
}

/// Starts a server in a background thread serving `body`.
pub fn start(body: Vec<u8>) -> RangeServer {
    start_with_options(body, RangeServerOptions::default())
}

/// Like `start` but allows customizing server behavior.
pub fn start_with_options(body: Vec<u8>, opts: RangeServerOptions) -> RangeServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let server = RangeServer {
        url: format!("http://127.0.0.1:{}/", port),
        gets: Arc::new(AtomicUsize::new(0)),
        user_agents: Arc::new(Mutex::new(Vec::new())),
    };
    let body = Arc::new(body);
    let shared = server.clone();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let shared = shared.clone();
            thread::spawn(move || handle(stream, &body, opts, &shared));
        }
    });
    server
}

struct Request {
    method: String,
    path: String,
    range: Option<(u64, u64)>,
    user_agent: Option<String>,
}

fn read_request(stream: &mut TcpStream) -> Option<Request> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") && buf.len() < 16 * 1024 {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    let text = std::str::from_utf8(&buf).ok()?;
    parse_request(text)
}

fn handle(mut stream: TcpStream, body: &[u8], opts: RangeServerOptions, server: &RangeServer) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));
    let Some(req) = read_request(&mut stream) else {
        return;
    };
    if let Some(ua) = req.user_agent.clone() {
        server.user_agents.lock().unwrap().push(ua);
    }

    if req.path.starts_with("/redirect") {
        let _ = stream.write_all(
            b"HTTP/1.1 302 Found\r\nLocation: /\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        return;
    }

    let total = body.len() as u64;
    if req.method.eq_ignore_ascii_case("HEAD") {
        let length = match opts.head_length {
            HeadLength::Actual => format!("Content-Length: {}\r\n", total),
            HeadLength::Omit => String::new(),
            HeadLength::Raw(v) => format!("Content-Length: {}\r\n", v),
        };
        let accept_ranges = if opts.advertise_ranges {
            "Accept-Ranges: bytes\r\n"
        } else {
            ""
        };
        let response = format!(
            "HTTP/1.1 200 OK\r\n{}{}Connection: close\r\n\r\n",
            length, accept_ranges
        );
        let _ = stream.write_all(response.as_bytes());
        return;
    }

    if !req.method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nConnection: close\r\n\r\n");
        return;
    }
    server.gets.fetch_add(1, Ordering::SeqCst);

    if !opts.support_ranges || req.range.is_none() {
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            total
        );
        let _ = stream.write_all(response.as_bytes());
        let _ = stream.write_all(body);
        return;
    }

    let (start, end_incl) = req.range.unwrap_or((0, u64::MAX));
    if let Some((delayed, pause)) = opts.delay_range_start {
        if delayed == start {
            thread::sleep(pause);
        }
    }
    if opts.fail_range_start == Some(start) {
        let _ = stream.write_all(
            b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        return;
    }

    let end_incl = end_incl.min(total.saturating_sub(1));
    if start > end_incl {
        let response = format!(
            "HTTP/1.1 416 Range Not Satisfiable\r\nContent-Range: bytes */{}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            total
        );
        let _ = stream.write_all(response.as_bytes());
        return;
    }
    let slice = &body[start as usize..=end_incl as usize];
    let content_range = format!("bytes {}-{}/{}", start, end_incl, total);

    let mut payload = slice.to_vec();
    let length_header = if opts.overflow_extra > 0 {
        payload.extend(std::iter::repeat(0xAB).take(opts.overflow_extra));
        String::new()
    } else {
        payload.extend(std::iter::repeat(0xCD).take(opts.declare_extra));
        format!("Content-Length: {}\r\n", payload.len())
    };
    let response = format!(
        "HTTP/1.1 206 Partial Content\r\n{}Content-Range: {}\r\nConnection: close\r\n\r\n",
        length_header, content_range
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.write_all(&payload);
}

/// Parses the request line plus the Range and User-Agent headers.
fn parse_request(request: &str) -> Option<Request> {
    let mut lines = request.lines();
    let mut first = lines.next()?.split_whitespace();
    let method = first.next()?.to_string();
    let path = first.next().unwrap_or("/").to_string();
    let mut range = None;
    let mut user_agent = None;
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            let value = value.trim();
            if name.trim().eq_ignore_ascii_case("user-agent") {
                user_agent = Some(value.to_string());
            }
            if name.trim().eq_ignore_ascii_case("range") {
                if let Some(part) = value.strip_prefix("bytes=") {
                    if let Some((a, b)) = part.split_once('-') {
                        let start = a.trim().parse::<u64>().unwrap_or(0);
                        let end = b.trim();
                        let end_incl = if end.is_empty() {
                            u64::MAX
                        } else {
                            end.parse::<u64>().unwrap_or(0)
                        };
                        range = Some((start, end_incl));
                    }
                }
            }
        }
    }
    Some(Request {
        method,
        path,
        range,
        user_agent,
    })
}
