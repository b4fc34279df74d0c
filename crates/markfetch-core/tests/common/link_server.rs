//! Minimal HTTP/1.1 server for retriever integration tests.
//!
//! Routes:
//! - `/ok` -> 200
//! - `/a` -> 302 to `/b`, `/b` -> 200
//! - `/missing` -> 404
//! - `/slow` -> sleeps 3s before answering
//! - `/loop` -> 302 to itself
//!
//! Query strings are ignored. Every response carries `Connection: close`.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

/// Starts the server in a background thread and returns its base URL
/// (e.g. "http://127.0.0.1:12345/"). The server runs until the process exits.
pub fn start() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let base = format!("http://127.0.0.1:{}/", listener.local_addr().unwrap().port());
    let served = base.clone();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let base = served.clone();
            thread::spawn(move || handle(stream, &base));
        }
    });
    base
}

/// A URL on a port nothing listens on.
pub fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/", port)
}

fn handle(mut stream: TcpStream, base: &str) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 4096];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let request = String::from_utf8_lossy(&buf[..n]);
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .split('?')
        .next()
        .unwrap_or("/")
        .to_string();

    let response = match path.as_str() {
        "/ok" | "/b" => reply("200 OK", None, "fine"),
        "/a" => reply("302 Found", Some(format!("{}b", base)), ""),
        "/loop" => reply("302 Found", Some(format!("{}loop", base)), ""),
        "/slow" => {
            thread::sleep(Duration::from_secs(3));
            reply("200 OK", None, "late")
        }
        _ => reply("404 Not Found", None, "missing"),
    };
    let _ = stream.write_all(response.as_bytes());
}

fn reply(status: &str, location: Option<String>, body: &str) -> String {
    let location = location
        .map(|l| format!("Location: {}\r\n", l))
        .unwrap_or_default();
    format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n{}",
        status,
        body.len(),
        location,
        body
    )
}
