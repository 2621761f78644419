//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single upstream instance
//! - Track liveness (alive/dead) under concurrent readers and writers
//! - Relay requests to the instance through the shared forwarder

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{body::Body, http::Response};
use url::Url;

use crate::forward::{ForwardError, Forwarder, UpstreamRequest};

/// A single backend server.
pub struct Backend {
    /// Endpoint this backend forwards to. Never changes after construction.
    url: Url,
    /// Liveness flag. Written by the health monitor and the failover path.
    alive: AtomicBool,
    /// Forwarding primitive shared by all backends.
    forwarder: Arc<dyn Forwarder>,
}

impl Backend {
    /// Create a new backend. Backends start out alive.
    pub fn new(url: Url, forwarder: Arc<dyn Forwarder>) -> Self {
        Self {
            url,
            alive: AtomicBool::new(true),
            forwarder,
        }
    }

    /// The endpoint of this backend.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Set the liveness flag.
    pub fn set_alive(&self, alive: bool) {
        self.alive.store(alive, Ordering::Release);
    }

    /// Read the liveness flag.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Forward one request to this backend.
    pub async fn forward(&self, request: UpstreamRequest) -> Result<Response<Body>, ForwardError> {
        self.forwarder.forward(&self.url, request).await
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("url", &self.url.as_str())
            .field("alive", &self.is_alive())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::http::{Method, StatusCode};
    use futures_util::future::BoxFuture;

    /// Forwarder that answers every request with 200 OK.
    pub(crate) struct OkForwarder;

    impl Forwarder for OkForwarder {
        fn forward<'a>(
            &'a self,
            _target: &'a Url,
            _request: UpstreamRequest,
        ) -> BoxFuture<'a, Result<Response<Body>, ForwardError>> {
            Box::pin(async { Ok(Response::new(Body::empty())) })
        }
    }

    pub(crate) fn backend(url: &str) -> Arc<Backend> {
        Arc::new(Backend::new(Url::parse(url).unwrap(), Arc::new(OkForwarder)))
    }

    #[test]
    fn test_backend_starts_alive() {
        let b = backend("http://127.0.0.1:5001");
        assert!(b.is_alive());
        assert_eq!(b.url().as_str(), "http://127.0.0.1:5001/");
    }

    #[test]
    fn test_set_alive_is_idempotent() {
        let b = backend("http://127.0.0.1:5001");
        b.set_alive(true);
        b.set_alive(true);
        assert!(b.is_alive());

        b.set_alive(false);
        b.set_alive(false);
        assert!(!b.is_alive());
    }

    #[test]
    fn test_concurrent_flips_observe_whole_values() {
        let b = backend("http://127.0.0.1:5001");
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let b = b.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        b.set_alive(i % 2 == 0);
                        let _ = b.is_alive();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        b.set_alive(true);
        assert!(b.is_alive());
    }

    #[tokio::test]
    async fn test_forward_delegates_to_forwarder() {
        let b = backend("http://127.0.0.1:5001");
        let response = b
            .forward(UpstreamRequest::new(Method::GET, "/".parse().unwrap()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
