//! One request/response cycle against the target.
//!
//! Every invocation opens its own TCP connection, writes a bodiless GET with
//! `Connection: close`, reads the full response and tears the connection
//! down again. Transport errors never escape as faults; they come back as a
//! [`RequestOutcome::Failure`].

use crate::target::Target;
use hyper::header::{CONNECTION, HOST, USER_AGENT};
use hyper::{Body, Method, Request, StatusCode};
use std::future::Future;
use std::io;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpStream;
use tracing::debug;

const USER_AGENT_VALUE: &str = concat!("volley/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum SendError {
    #[error("connect failed: {0}")]
    Connect(#[source] io::Error),
    #[error("http handshake failed: {0}")]
    Handshake(#[source] hyper::Error),
    #[error("cannot build request: {0}")]
    Build(#[from] hyper::http::Error),
    #[error("request failed: {0}")]
    Request(#[source] hyper::Error),
    #[error("reading response body failed: {0}")]
    Body(#[source] hyper::Error),
    #[error("request task ended without reporting")]
    Aborted,
}

/// Result of one sender invocation.
#[derive(Debug)]
pub enum RequestOutcome {
    Success {
        elapsed: Duration,
        status: StatusCode,
    },
    /// `elapsed` covers the attempt up to the failure point, whichever step
    /// failed. It never feeds into latency statistics.
    Failure { elapsed: Duration, error: SendError },
}

impl RequestOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RequestOutcome::Success { .. })
    }

    /// Latency of a successful request.
    pub fn latency(&self) -> Option<Duration> {
        match self {
            RequestOutcome::Success { elapsed, .. } => Some(*elapsed),
            RequestOutcome::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&SendError> {
        match self {
            RequestOutcome::Failure { error, .. } => Some(error),
            RequestOutcome::Success { .. } => None,
        }
    }
}

/// Something the controller can launch once per request.
///
/// Implementations must be cheap to share: the controller keeps a single
/// instance behind an `Arc` and calls `send` from many tasks at once.
pub trait RequestSender: Send + Sync + 'static {
    fn send(&self) -> impl Future<Output = RequestOutcome> + Send;
}

/// Plain-HTTP sender backed by a hyper client connection per request.
#[derive(Debug, Clone)]
pub struct HttpSender {
    target: Target,
}

impl HttpSender {
    pub fn new(target: Target) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    fn build_request(&self) -> Result<Request<Body>, SendError> {
        Ok(Request::builder()
            .method(Method::GET)
            .uri(self.target.path_and_query())
            .header(HOST, self.target.host_header())
            .header(USER_AGENT, USER_AGENT_VALUE)
            .header(CONNECTION, "close")
            .body(Body::empty())?)
    }

    async fn exchange(&self, stream: TcpStream) -> Result<StatusCode, SendError> {
        let request = self.build_request()?;
        let (mut sender, conn) = hyper::client::conn::handshake(stream)
            .await
            .map_err(SendError::Handshake)?;
        let conn = tokio::spawn(conn);

        let result = async {
            let response = sender
                .send_request(request)
                .await
                .map_err(SendError::Request)?;
            let status = response.status();
            hyper::body::to_bytes(response.into_body())
                .await
                .map_err(SendError::Body)?;
            Ok::<_, SendError>(status)
        }
        .await;

        // Drops the socket on every path, success or not.
        drop(sender);
        conn.abort();
        result
    }
}

impl RequestSender for HttpSender {
    async fn send(&self) -> RequestOutcome {
        let start = Instant::now();

        let result = match TcpStream::connect(self.target.socket_addr()).await {
            Ok(stream) => self.exchange(stream).await,
            Err(e) => Err(SendError::Connect(e)),
        };
        let elapsed = start.elapsed();

        match result {
            Ok(status) => RequestOutcome::Success { elapsed, status },
            Err(error) => {
                debug!(
                    target_addr = %self.target.socket_addr(),
                    error = %error,
                    elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                    "Request failed"
                );
                RequestOutcome::Failure { elapsed, error }
            }
        }
    }
}
