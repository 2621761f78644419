//! Replayable upstream request.
//!
//! # Responsibilities
//! - Buffer the inbound body so one request can be re-issued on local retry and failover
//! - Keep the client address for `X-Forwarded-For` and failure logs
//!
//! # Design Decisions
//! - Bodies above the configured limit are rejected before buffering when
//!   `Content-Length` declares them, otherwise while reading
//! - Cloning is cheap: `Bytes` is reference counted

use std::net::SocketAddr;

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, Method, Request, Uri, Version},
};
use thiserror::Error;

/// Error raised while buffering an inbound request.
#[derive(Debug, Error)]
pub enum BufferError {
    #[error("request body of {declared} bytes exceeds limit of {limit} bytes")]
    TooLarge { declared: u64, limit: usize },

    #[error("failed to read request body: {0}")]
    Read(#[from] axum::Error),
}

/// A fully buffered request that can be forwarded any number of times.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub uri: Uri,
    pub version: Version,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub client_addr: Option<SocketAddr>,
}

impl UpstreamRequest {
    /// Create a body-less request. Mostly useful for tests and probes.
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            client_addr: None,
        }
    }

    /// Buffer an inbound request, enforcing `limit` on the body size.
    pub async fn buffer(
        request: Request<Body>,
        client_addr: Option<SocketAddr>,
        limit: usize,
    ) -> Result<Self, BufferError> {
        let (parts, body) = request.into_parts();

        let declared = parts
            .headers
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        if let Some(declared) = declared {
            if declared > limit as u64 {
                return Err(BufferError::TooLarge { declared, limit });
            }
        }

        let body = axum::body::to_bytes(body, limit).await?;

        Ok(Self {
            method: parts.method,
            uri: parts.uri,
            version: parts.version,
            headers: parts.headers,
            body,
            client_addr,
        })
    }

    /// Request path, used in logs.
    pub fn path(&self) -> &str {
        self.uri.path()
    }
}
