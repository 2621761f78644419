//! Request forwarding primitive.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → request.rs (buffer body into a replayable UpstreamRequest)
//!     → Forwarder::forward(target, request)
//!         - client.rs (hyper-util client, URI rewrite, hop-by-hop stripping)
//!     → Response on success | ForwardError on any transport failure
//! ```
//!
//! # Design Decisions
//! - The forwarder only reports success or failure; retry and failover policy
//!   live in the dispatcher
//! - A backend response of any status is a success; only transport errors fail
//! - Object-safe trait so backends share one forwarder behind `Arc<dyn Forwarder>`

use std::time::Duration;

use axum::{body::Body, http::Response};
use futures_util::future::BoxFuture;
use thiserror::Error;
use url::Url;

pub mod client;
pub mod request;

pub use client::HttpForwarder;
pub use request::{BufferError, UpstreamRequest};

/// Failure to obtain a response from a backend.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("upstream timed out after {0:?}")]
    Timeout(Duration),

    #[error("upstream transport error: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),

    #[error("invalid upstream target: {0}")]
    InvalidTarget(String),
}

/// Relays one request to a target and reports the outcome.
pub trait Forwarder: Send + Sync {
    fn forward<'a>(
        &'a self,
        target: &'a Url,
        request: UpstreamRequest,
    ) -> BoxFuture<'a, Result<Response<Body>, ForwardError>>;
}
