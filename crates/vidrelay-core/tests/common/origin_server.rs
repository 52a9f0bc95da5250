//! Minimal HTTP/1.1 origin that answers HEAD and GET for integration tests.
//!
//! Serves a generated body (byte `i` is `i % 251`) so large transfers need no
//! allocation. Counts HEAD and GET requests, and aborted body writes, so
//! tests can assert which round trips happened.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Long enough to outlast any deadline a test configures.
const STALL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct OriginOptions {
    pub head_status: u16,
    pub get_status: u16,
    /// `Content-Type` sent on HEAD and GET; `None` omits it.
    pub content_type: Option<String>,
    /// If true, GET omits `Content-Type` even when HEAD sends one.
    pub omit_get_content_type: bool,
    /// `Content-Length` declared on HEAD; `None` omits it.
    pub head_length: Option<u64>,
    /// If false, GET sends no `Content-Length` and ends the body by closing.
    pub get_declares_length: bool,
    /// Actual number of body bytes sent on GET.
    pub body_len: u64,
    /// If true, HEAD is read but never answered (until the stall elapses).
    pub stall_head: bool,
    /// Stop sending the GET body after this many bytes and hold the socket open.
    pub stall_body_after: Option<u64>,
}

impl OriginOptions {
    /// A well-behaved video origin that declares its true length.
    pub fn video(body_len: u64) -> Self {
        Self {
            head_status: 200,
            get_status: 200,
            content_type: Some("video/mp4".to_string()),
            omit_get_content_type: false,
            head_length: Some(body_len),
            get_declares_length: true,
            body_len,
            stall_head: false,
            stall_body_after: None,
        }
    }
}

pub struct Origin {
    base: String,
    heads: Arc<AtomicUsize>,
    gets: Arc<AtomicUsize>,
    aborted: Arc<AtomicUsize>,
}

impl Origin {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path.trim_start_matches('/'))
    }

    pub fn head_count(&self) -> usize {
        self.heads.load(Ordering::SeqCst)
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// GET bodies whose write failed because the peer went away.
    pub fn aborted_count(&self) -> usize {
        self.aborted.load(Ordering::SeqCst)
    }
}

/// Expected body content for a given length.
pub fn expected_body(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Starts the origin in a background thread. It runs until the process exits.
pub fn start(opts: OriginOptions) -> Origin {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let heads = Arc::new(AtomicUsize::new(0));
    let gets = Arc::new(AtomicUsize::new(0));
    let aborted = Arc::new(AtomicUsize::new(0));

    let origin = Origin {
        base: format!("http://127.0.0.1:{}/", port),
        heads: Arc::clone(&heads),
        gets: Arc::clone(&gets),
        aborted: Arc::clone(&aborted),
    };

    let opts = Arc::new(opts);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let opts = Arc::clone(&opts);
            let counters = (Arc::clone(&heads), Arc::clone(&gets), Arc::clone(&aborted));
            thread::spawn(move || handle(stream, &opts, counters));
        }
    });
    origin
}

/// Returns a port nothing is listening on.
pub fn closed_port_url(path: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/{}", port, path.trim_start_matches('/'))
}

fn read_request_head(stream: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return None,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
        if buf.len() > 16 * 1024 {
            return None;
        }
    }
    String::from_utf8(buf).ok()
}

fn handle(
    mut stream: TcpStream,
    opts: &OriginOptions,
    (heads, gets, aborted): (Arc<AtomicUsize>, Arc<AtomicUsize>, Arc<AtomicUsize>),
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));
    let request = match read_request_head(&mut stream) {
        Some(r) => r,
        None => return,
    };
    let method = request.split_whitespace().next().unwrap_or("");

    if method.eq_ignore_ascii_case("HEAD") {
        heads.fetch_add(1, Ordering::SeqCst);
        if opts.stall_head {
            thread::sleep(STALL);
            return;
        }
        let mut head = format!("HTTP/1.1 {} Status\r\nConnection: close\r\n", opts.head_status);
        if let Some(ct) = &opts.content_type {
            head.push_str(&format!("Content-Type: {}\r\n", ct));
        }
        if let Some(len) = opts.head_length {
            head.push_str(&format!("Content-Length: {}\r\n", len));
        }
        head.push_str("\r\n");
        let _ = stream.write_all(head.as_bytes());
        return;
    }

    if method.eq_ignore_ascii_case("GET") {
        gets.fetch_add(1, Ordering::SeqCst);
        let success = (200..300).contains(&opts.get_status);
        let mut head = format!("HTTP/1.1 {} Status\r\nConnection: close\r\n", opts.get_status);
        if let Some(ct) = opts.content_type.as_ref().filter(|_| !opts.omit_get_content_type) {
            head.push_str(&format!("Content-Type: {}\r\n", ct));
        }
        if !success {
            head.push_str("Content-Length: 0\r\n\r\n");
            let _ = stream.write_all(head.as_bytes());
            return;
        }
        if opts.get_declares_length {
            head.push_str(&format!("Content-Length: {}\r\n", opts.body_len));
        }
        head.push_str("\r\n");
        if stream.write_all(head.as_bytes()).is_err() {
            aborted.fetch_add(1, Ordering::SeqCst);
            return;
        }

        let pattern: Vec<u8> = (0..251u32 * 64).map(|i| (i % 251) as u8).collect();
        let stall_at = opts.stall_body_after.unwrap_or(u64::MAX);
        let mut sent = 0u64;
        while sent < opts.body_len {
            if sent >= stall_at {
                let _ = stream.flush();
                thread::sleep(STALL);
                return;
            }
            let n = (opts.body_len - sent)
                .min(stall_at - sent)
                .min(pattern.len() as u64) as usize;
            if stream.write_all(&pattern[..n]).is_err() {
                aborted.fetch_add(1, Ordering::SeqCst);
                return;
            }
            sent += n as u64;
        }
        let _ = stream.flush();
        return;
    }

    let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nConnection: close\r\n\r\n");
}
