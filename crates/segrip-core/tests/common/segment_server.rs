//! Minimal HTTP/1.1 server that serves numbered segments and HLS playlists.
//!
//! `GET .../video<N>.jpeg` returns `seg<N>`; `GET .../playlist.m3u8` and
//! `GET .../<resolution>/video.m3u8` return playlists describing
//! `segment_count` segments. Anything else is 404.

use std::collections::{HashMap, HashSet};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Debug, Clone, Default)]
pub struct SegmentServerOptions {
    /// Number of segments the playlists advertise.
    pub segment_count: usize,
    /// Resolution directory named by the master playlist.
    pub resolution: String,
    /// Indices that always return 404.
    pub missing: HashSet<usize>,
    /// Indices whose first request returns 503; later ones succeed.
    pub flaky: HashSet<usize>,
}

pub struct SegmentServer {
    /// Base URL, e.g. `http://127.0.0.1:12345/`.
    pub base_url: String,
    /// Total GET requests seen.
    pub requests: Arc<AtomicUsize>,
}

pub fn segment_body(index: usize) -> Vec<u8> {
    format!("seg{}", index).into_bytes()
}

/// Starts the server on a background thread. It runs until the process exits.
pub fn start(opts: SegmentServerOptions) -> SegmentServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let requests = Arc::new(AtomicUsize::new(0));
    let seen: Arc<Mutex<HashMap<usize, usize>>> = Arc::new(Mutex::new(HashMap::new()));
    let opts = Arc::new(opts);
    let counter = Arc::clone(&requests);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let opts = Arc::clone(&opts);
            let counter = Arc::clone(&counter);
            let seen = Arc::clone(&seen);
            thread::spawn(move || handle(stream, &opts, &counter, &seen));
        }
    });
    SegmentServer {
        base_url: format!("http://127.0.0.1:{}/", port),
        requests,
    }
}

fn handle(
    mut stream: std::net::TcpStream,
    opts: &SegmentServerOptions,
    requests: &AtomicUsize,
    seen: &Mutex<HashMap<usize, usize>>,
) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let mut first = request.lines().next().unwrap_or("").split_whitespace();
    let method = first.next().unwrap_or("");
    let path = first.next().unwrap_or("/");
    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n");
        return;
    }
    requests.fetch_add(1, Ordering::SeqCst);

    let (status, body) = route(path, opts, seen);
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        body.len()
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.write_all(&body);
}

fn route(
    path: &str,
    opts: &SegmentServerOptions,
    seen: &Mutex<HashMap<usize, usize>>,
) -> (&'static str, Vec<u8>) {
    let name = path.rsplit('/').next().unwrap_or("");
    if name == "playlist.m3u8" {
        return ("200 OK", master_playlist(&opts.resolution).into_bytes());
    }
    if name == "video.m3u8" {
        return ("200 OK", media_playlist(opts.segment_count).into_bytes());
    }
    let index = name
        .strip_prefix("video")
        .and_then(|s| s.strip_suffix(".jpeg"))
        .and_then(|s| s.parse::<usize>().ok());
    let Some(index) = index else {
        return ("404 Not Found", Vec::new());
    };
    if opts.missing.contains(&index) {
        return ("404 Not Found", Vec::new());
    }
    let hits = {
        let mut seen = seen.lock().unwrap();
        let e = seen.entry(index).or_insert(0);
        *e += 1;
        *e
    };
    if opts.flaky.contains(&index) && hits == 1 {
        return ("503 Service Unavailable", Vec::new());
    }
    ("200 OK", segment_body(index))
}

fn master_playlist(resolution: &str) -> String {
    format!(
        "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=400000,RESOLUTION=320x180\n320x180/video.m3u8\n\
         #EXT-X-STREAM-INF:BANDWIDTH=2800000\n{}/video.m3u8\n",
        resolution
    )
}

fn media_playlist(count: usize) -> String {
    let mut s = String::from("#EXTM3U\n#EXT-X-VERSION:3\n");
    for i in 0..count {
        s.push_str(&format!("#EXTINF:4.000000,\nvideo{}.jpeg\n", i));
    }
    s.push_str("#EXT-X-ENDLIST\n");
    s
}
