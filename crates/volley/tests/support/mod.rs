#![allow(dead_code)]

use hyper::StatusCode;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use volley::{RequestOutcome, RequestSender, SendError};

pub const OK_RESPONSE: &[u8] =
    b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok";

/// Reads until the end of the request head.
async fn read_request_head(socket: &mut TcpStream) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }
    buf
}

/// Mock HTTP server: answers every connection with `response` after `delay`.
/// Each request head it saw is forwarded on the returned channel.
pub async fn spawn_responder(
    delay: Duration,
    response: &'static [u8],
) -> (SocketAddr, mpsc::UnboundedReceiver<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (seen_tx, seen_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let seen_tx = seen_tx.clone();
            tokio::spawn(async move {
                let head = read_request_head(&mut socket).await;
                let _ = seen_tx.send(head);
                tokio::time::sleep(delay).await;
                let _ = socket.write_all(response).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, seen_rx)
}

/// An address nothing is listening on.
pub async fn refused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// In-memory sender that sleeps instead of touching the network and tracks
/// how many calls are live at once.
pub struct ScriptedSender {
    pub calls: AtomicUsize,
    pub live: AtomicUsize,
    pub peak_live: AtomicUsize,
    latency: fn(usize) -> Duration,
    fails: fn(usize) -> bool,
}

impl ScriptedSender {
    pub fn new(latency: fn(usize) -> Duration, fails: fn(usize) -> bool) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            live: AtomicUsize::new(0),
            peak_live: AtomicUsize::new(0),
            latency,
            fails,
        }
    }

    pub fn succeeding(latency: fn(usize) -> Duration) -> Self {
        Self::new(latency, |_| false)
    }
}

impl RequestSender for ScriptedSender {
    async fn send(&self) -> RequestOutcome {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_live.fetch_max(live, Ordering::SeqCst);

        let elapsed = (self.latency)(call);
        tokio::time::sleep(elapsed).await;
        self.live.fetch_sub(1, Ordering::SeqCst);

        if (self.fails)(call) {
            RequestOutcome::Failure {
                elapsed,
                error: SendError::Aborted,
            }
        } else {
            RequestOutcome::Success {
                elapsed,
                status: StatusCode::OK,
            }
        }
    }
}

/// Records every progress callback.
#[derive(Default)]
pub struct RecordingProgress {
    pub updates: Vec<(usize, usize)>,
    pub finished: usize,
}

impl volley::Progress for RecordingProgress {
    fn update(&mut self, completed: usize, total: usize) {
        self.updates.push((completed, total));
    }

    fn finish(&mut self) {
        self.finished += 1;
    }
}
