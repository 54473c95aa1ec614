//! Scripted transport and a raw HTTP stub for unit tests.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse, Transport};

#[derive(Default)]
struct Script {
    replies: VecDeque<Result<HttpResponse, TransportError>>,
    sent: Vec<HttpRequest>,
}

/// Replays queued replies in order and records every request it receives.
/// Clones share the same script.
#[derive(Clone, Default)]
pub(crate) struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_response(&self, response: HttpResponse) {
        self.script.lock().unwrap().replies.push_back(Ok(response));
    }

    pub(crate) fn push_failure(&self, err: TransportError) {
        self.script.lock().unwrap().replies.push_back(Err(err));
    }

    pub(crate) fn sent(&self) -> Vec<HttpRequest> {
        self.script.lock().unwrap().sent.clone()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut script = self.script.lock().unwrap();
        script.sent.push(request.clone());
        script
            .replies
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("script exhausted".to_string())))
    }
}

pub(crate) fn json_response(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        headers: vec![(
            "content-type".to_string(),
            "application/json; charset=utf-8".to_string(),
        )],
        body: body.to_string(),
    }
}

/// Serves every connection a 200 `text/html` reply of 11 MiB, one more than
/// `UreqTransport` reads. Returns the address and a count of accepted
/// connections.
pub(crate) fn serve_oversized_body() -> (SocketAddr, Arc<AtomicUsize>) {
    const BODY_BYTES: usize = 11 * 1024 * 1024;

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            counter.fetch_add(1, Ordering::SeqCst);
            thread::spawn(move || {
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut content_length = 0;
                loop {
                    let mut line = String::new();
                    if reader.read_line(&mut line).unwrap_or(0) == 0 || line == "\r\n" {
                        break;
                    }
                    if let Some((name, value)) = line.split_once(':') {
                        if name.eq_ignore_ascii_case("content-length") {
                            content_length = value.trim().parse().unwrap_or(0);
                        }
                    }
                }
                let mut request_body = vec![0; content_length];
                let _ = reader.read_exact(&mut request_body);

                let head = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {BODY_BYTES}\r\n\r\n"
                );
                if stream.write_all(head.as_bytes()).is_err() {
                    return;
                }
                let chunk = [b'a'; 64 * 1024];
                for _ in 0..BODY_BYTES / chunk.len() {
                    // The client hangs up once it hits its limit.
                    if stream.write_all(&chunk).is_err() {
                        return;
                    }
                }
            });
        }
    });

    (addr, hits)
}
