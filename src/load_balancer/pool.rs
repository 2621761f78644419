//! Backend pool management.
//!
//! # Responsibilities
//! - Hold the ordered, fixed set of backends
//! - Select the next live backend via round-robin
//! - Flip liveness by URL on behalf of the failover path
//! - Run a synchronous health check pass over every member

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::health::probe::Probe;
use crate::load_balancer::{backend::Backend, round_robin::RoundRobin};
use crate::observability::metrics;

/// Error building a pool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("backend pool must contain at least one backend")]
    Empty,
}

/// Collects backends during initialization.
#[derive(Debug, Default)]
pub struct PoolBuilder {
    members: Vec<Arc<Backend>>,
}

impl PoolBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a backend. Order defines rotation order.
    pub fn add(mut self, backend: Backend) -> Self {
        tracing::info!(url = %backend.url(), "Configured backend");
        self.members.push(Arc::new(backend));
        self
    }

    /// Finish initialization. Fails if no backend was added.
    pub fn build(self) -> Result<BackendPool, PoolError> {
        if self.members.is_empty() {
            return Err(PoolError::Empty);
        }
        Ok(BackendPool {
            members: self.members,
            balancer: RoundRobin::new(),
        })
    }
}

/// A fixed, non-empty set of backends with a shared rotation cursor.
#[derive(Debug)]
pub struct BackendPool {
    members: Vec<Arc<Backend>>,
    balancer: RoundRobin,
}

impl BackendPool {
    pub fn builder() -> PoolBuilder {
        PoolBuilder::new()
    }

    /// Select the next live backend, or `None` if every backend is dead.
    pub fn next_live(&self) -> Option<Arc<Backend>> {
        let selected = self.balancer.next_live(&self.members);
        if selected.is_none() {
            tracing::debug!(backend_count = self.members.len(), "No live backends in pool");
        }
        selected
    }

    /// Set liveness of the backend with the given URL. Unknown URLs are ignored.
    pub fn set_status(&self, url: &Url, alive: bool) {
        if let Some(backend) = self.members.iter().find(|b| b.url() == url) {
            backend.set_alive(alive);
            metrics::record_backend_health(url.as_str(), alive);
        }
    }

    /// Probe every backend in order and record the result as its liveness.
    pub async fn health_check(&self, probe: &dyn Probe, timeout: Duration) {
        for backend in &self.members {
            let alive = probe.can_connect(backend.url(), timeout).await;
            backend.set_alive(alive);
            metrics::record_backend_health(backend.url().as_str(), alive);

            let status = if alive { "up" } else { "down" };
            tracing::info!(url = %backend.url(), status, "Health check result");
        }
    }

    /// All backends in rotation order.
    pub fn backends(&self) -> &[Arc<Backend>] {
        &self.members
    }

    /// Number of backends. Never zero.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Number of backends currently marked alive.
    pub fn live_count(&self) -> usize {
        self.members.iter().filter(|b| b.is_alive()).count()
    }
}
