//! Target URL validation.
//!
//! Only plain `http` URLs are accepted. A URL without an explicit port is
//! normalized to port 80.

use hyper::http::uri::InvalidUri;
use hyper::Uri;
use thiserror::Error;

const HTTP_SCHEME: &str = "http";
const DEFAULT_HTTP_PORT: u16 = 80;

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("url is invalid: {0}")]
    InvalidUri(#[from] InvalidUri),
    #[error("unsupported protocol scheme {0:?}")]
    UnsupportedScheme(String),
    #[error("url has no host")]
    MissingHost,
}

/// A validated endpoint. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    host: String,
    port: u16,
    explicit_port: bool,
    path_and_query: String,
}

impl Target {
    pub fn parse(raw: &str) -> Result<Self, TargetError> {
        let uri: Uri = raw.trim().parse()?;

        let scheme = uri.scheme_str().unwrap_or_default();
        if !scheme.eq_ignore_ascii_case(HTTP_SCHEME) {
            return Err(TargetError::UnsupportedScheme(scheme.to_string()));
        }

        let host = match uri.host() {
            Some(h) if !h.is_empty() => h.to_string(),
            _ => return Err(TargetError::MissingHost),
        };

        let path_and_query = match uri.path_and_query().map(|p| p.as_str()) {
            None | Some("") => "/".to_string(),
            Some(p) if p.starts_with('?') => format!("/{}", p),
            Some(p) => p.to_string(),
        };

        Ok(Self {
            host,
            port: uri.port_u16().unwrap_or(DEFAULT_HTTP_PORT),
            explicit_port: uri.port().is_some(),
            path_and_query,
        })
    }

    /// Host as written in the URL (IPv6 literals keep their brackets).
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path_and_query(&self) -> &str {
        &self.path_and_query
    }

    /// `host:port` suitable for a TCP connect.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Value for the `Host` request header.
    pub fn host_header(&self) -> String {
        if self.explicit_port {
            self.socket_addr()
        } else {
            self.host.clone()
        }
    }
}
