//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the backend pool, forwarder and dispatcher from configuration
//! - Create the Axum router that sends every request to the dispatcher
//! - Wire up middleware (request ID, tracing)
//! - Spawn the health monitor and serve until shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::validation::parse_backend_url;
use crate::config::{validate_config, ProxyConfig};
use crate::dispatch::Dispatcher;
use crate::forward::{BufferError, Forwarder, HttpForwarder, UpstreamRequest};
use crate::health::{HealthMonitor, TcpProbe};
use crate::lifecycle::shutdown::wait as wait_for_shutdown;
use crate::lifecycle::startup::StartupError;
use crate::load_balancer::{Backend, BackendPool};
use crate::resilience::RetryPolicy;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub max_body_bytes: usize,
}

/// HTTP server for the load balancer.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    pool: Arc<BackendPool>,
}

impl HttpServer {
    /// Create a server that forwards over HTTP.
    pub fn new(config: ProxyConfig) -> Result<Self, StartupError> {
        let forwarder = Arc::new(HttpForwarder::new(Duration::from_secs(config.timeouts.upstream_secs)));
        Self::with_forwarder(config, forwarder)
    }

    /// Create a server with a custom forwarding primitive.
    pub fn with_forwarder(config: ProxyConfig, forwarder: Arc<dyn Forwarder>) -> Result<Self, StartupError> {
        validate_config(&config).map_err(StartupError::Validation)?;

        let mut builder = BackendPool::builder();
        for backend in &config.backends {
            let url = parse_backend_url(&backend.url).map_err(|e| StartupError::Validation(vec![e]))?;
            builder = builder.add(Backend::new(url, forwarder.clone()));
        }
        let pool = Arc::new(builder.build()?);

        let policy = RetryPolicy::from_config(&config.failover, pool.len());
        let state = AppState {
            dispatcher: Arc::new(Dispatcher::new(pool.clone(), policy)),
            max_body_bytes: config.limits.max_body_bytes,
        };

        let router = Self::build_router(state);
        Ok(Self { router, config, pool })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// There is no whole-request timeout layer: each forward attempt is
    /// bounded by the forwarder, and the attempt cap bounds failover.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server on `listener` until `shutdown_rx` fires.
    pub async fn run(self, listener: TcpListener, shutdown_rx: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backends = self.pool.len(),
            "Load balancer started"
        );

        if self.config.health_check.enabled {
            let monitor = HealthMonitor::new(self.pool.clone(), Arc::new(TcpProbe), &self.config.health_check);
            tokio::spawn(monitor.run());
        } else {
            tracing::info!("Active health checks disabled");
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(wait_for_shutdown(shutdown_rx))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The backend pool, shared with the admin API.
    pub fn pool(&self) -> &Arc<BackendPool> {
        &self.pool
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Buffer the inbound request and hand it to the dispatcher.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(client_addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
        remote_addr = %client_addr,
        "Proxying request"
    );

    let upstream = match UpstreamRequest::buffer(request, Some(client_addr), state.max_body_bytes).await {
        Ok(upstream) => upstream,
        Err(e @ BufferError::TooLarge { .. }) => {
            tracing::warn!(request_id = %request_id, error = %e, "Rejecting request");
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Rejecting request");
            return (StatusCode::BAD_REQUEST, "Failed to read request body").into_response();
        }
    };

    state.dispatcher.handle(upstream).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forward::ForwardError;
    use futures_util::future::BoxFuture;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tower::ServiceExt;
    use url::Url;

    /// Forwarder where host `a` hangs until the upstream timeout and every
    /// other host answers with its name.
    #[derive(Default)]
    struct HangingForwarder {
        calls: Mutex<HashMap<String, usize>>,
    }

    impl HangingForwarder {
        fn calls(&self, host: &str) -> usize {
            self.calls.lock().unwrap().get(host).copied().unwrap_or(0)
        }
    }

    impl Forwarder for HangingForwarder {
        fn forward<'a>(
            &'a self,
            target: &'a Url,
            _request: UpstreamRequest,
        ) -> BoxFuture<'a, Result<Response<Body>, ForwardError>> {
            let host = target.host_str().unwrap_or_default().to_string();
            *self.calls.lock().unwrap().entry(host.clone()).or_insert(0) += 1;
            Box::pin(async move {
                if host == "a" {
                    let timeout = Duration::from_secs(30);
                    tokio::time::sleep(timeout).await;
                    Err(ForwardError::Timeout(timeout))
                } else {
                    Ok(Response::new(Body::from(host)))
                }
            })
        }
    }

    #[test]
    fn test_new_rejects_empty_backends() {
        let err = HttpServer::new(ProxyConfig::default()).err().unwrap();
        assert!(matches!(err, StartupError::Validation(_)));
    }

    #[test]
    fn test_new_rejects_malformed_url() {
        let err = HttpServer::new(ProxyConfig::with_servers("http://ok:1,::not-a-url")).err().unwrap();
        assert!(err.to_string().contains("::not-a-url"));
    }

    #[test]
    fn test_new_builds_pool_in_order() {
        let server = HttpServer::new(ProxyConfig::with_servers("http://a:1,http://b:2")).unwrap();
        let urls: Vec<_> = server.pool().backends().iter().map(|b| b.url().to_string()).collect();
        assert_eq!(urls, vec!["http://a:1/", "http://b:2/"]);
        assert_eq!(server.pool().live_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_backend_is_failed_over_and_marked_dead() {
        let forwarder = Arc::new(HangingForwarder::default());
        // First selection lands on index 1, the hanging backend.
        let server = HttpServer::with_forwarder(ProxyConfig::with_servers("http://b:1,http://a:1"), forwarder.clone()).unwrap();

        let request = Request::builder()
            .uri("/")
            .extension(ConnectInfo(SocketAddr::from(([10, 0, 0, 1], 5555))))
            .body(Body::empty())
            .unwrap();
        let started = tokio::time::Instant::now();
        let response = server.router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"b");
        assert_eq!(forwarder.calls("a"), 4);
        assert_eq!(forwarder.calls("b"), 1);
        assert!(started.elapsed() >= Duration::from_secs(120));

        let alive: Vec<bool> = server.pool().backends().iter().map(|b| b.is_alive()).collect();
        assert_eq!(alive, vec![true, false]);
    }
}
