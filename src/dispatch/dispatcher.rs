//! Request dispatch and failover.
//!
//! # Responsibilities
//! - Select a live backend for each request
//! - Retry a failed forward against the same backend with a fixed backoff
//! - Mark a backend dead once its local retries are exhausted and re-dispatch
//! - Answer 503 when the pool is exhausted or the attempt cap is reached
//!
//! # Design Decisions
//! - A successful local retry returns immediately; the backend stays alive
//! - Counters travel as an explicit `AttemptState`, one per request
//! - Forwarding errors never reach the client; only 503 does

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    http::{Response, StatusCode},
    response::IntoResponse,
};
use tracing::field;

use crate::dispatch::attempt::AttemptState;
use crate::forward::{ForwardError, UpstreamRequest};
use crate::load_balancer::{Backend, BackendPool};
use crate::observability::metrics;
use crate::resilience::RetryPolicy;

/// Body of the response sent when no backend can serve a request.
pub const UNAVAILABLE_BODY: &str = "Server not available";

/// Routes requests to pool backends and handles failover.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    pool: Arc<BackendPool>,
    policy: RetryPolicy,
}

impl Dispatcher {
    pub fn new(pool: Arc<BackendPool>, policy: RetryPolicy) -> Self {
        Self { pool, policy }
    }

    pub fn pool(&self) -> &Arc<BackendPool> {
        &self.pool
    }

    /// Serve one request, failing over between backends as needed.
    pub async fn handle(&self, request: UpstreamRequest) -> Response<Body> {
        let start = Instant::now();
        let method = request.method.to_string();
        let mut state = AttemptState::default();

        loop {
            if !self.policy.can_attempt(&state) {
                tracing::warn!(
                    remote_addr = request.client_addr.map(field::display),
                    path = %request.path(),
                    attempts = state.attempts,
                    max_attempts = self.policy.max_attempts,
                    "Attempt limit reached"
                );
                return unavailable(&method, start);
            }

            let Some(backend) = self.pool.next_live() else {
                tracing::warn!(
                    remote_addr = request.client_addr.map(field::display),
                    path = %request.path(),
                    attempts = state.attempts,
                    "No live backends"
                );
                return unavailable(&method, start);
            };

            match self.forward_with_retries(&backend, &request, &mut state).await {
                Ok(response) => {
                    metrics::record_request(&method, response.status().as_u16(), backend.url().as_str(), start);
                    return response;
                }
                Err(e) => {
                    self.pool.set_status(backend.url(), false);
                    metrics::record_failover(backend.url().as_str());
                    tracing::warn!(
                        remote_addr = request.client_addr.map(field::display),
                        path = %request.path(),
                        attempts = state.attempts,
                        backend = %backend.url(),
                        error = %e,
                        "Backend marked dead, re-dispatching"
                    );
                    state.next_attempt();
                }
            }
        }
    }

    /// Forward to one backend, retrying locally until the policy gives up.
    async fn forward_with_retries(
        &self,
        backend: &Backend,
        request: &UpstreamRequest,
        state: &mut AttemptState,
    ) -> Result<Response<Body>, ForwardError> {
        loop {
            match backend.forward(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    tracing::debug!(
                        remote_addr = request.client_addr.map(field::display),
                        path = %request.path(),
                        attempts = state.attempts,
                        backend = %backend.url(),
                        local_retries = state.local_retries,
                        error = %e,
                        "Forward failed"
                    );
                    if !self.policy.can_retry_locally(state) {
                        return Err(e);
                    }
                    tokio::time::sleep(self.policy.backoff).await;
                    state.retry_locally();
                    metrics::record_local_retry(backend.url().as_str());
                }
            }
        }
    }
}

fn unavailable(method: &str, start: Instant) -> Response<Body> {
    metrics::record_request(method, StatusCode::SERVICE_UNAVAILABLE.as_u16(), "none", start);
    (StatusCode::SERVICE_UNAVAILABLE, UNAVAILABLE_BODY).into_response()
}
