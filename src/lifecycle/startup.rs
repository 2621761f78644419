//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the server from a validated configuration
//! - Start background pieces (metrics exporter, admin API)
//! - Bind the proxy listener last and serve until a signal arrives
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::admin;
use crate::config::validation::join_errors;
use crate::config::{ProxyConfig, ValidationError};
use crate::http::HttpServer;
use crate::lifecycle::shutdown::wait as wait_for_shutdown;
use crate::lifecycle::{signals, Shutdown};
use crate::load_balancer::PoolError;
use crate::observability::metrics;

/// Fatal error before or while serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("invalid {field} '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start every subsystem and serve until SIGINT/SIGTERM.
pub async fn start(config: ProxyConfig) -> Result<(), StartupError> {
    let server = HttpServer::new(config.clone())?;

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::InvalidAddress {
                field: "observability.metrics_address",
                value: config.observability.metrics_address.clone(),
            })?;
        metrics::init_metrics(addr);
    }

    let shutdown = Shutdown::new();

    if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        tracing::info!(address = %listener.local_addr()?, "Admin API listening");

        let router = admin::setup_admin_router(server.pool().clone(), &config.admin.api_key);
        let admin_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(wait_for_shutdown(admin_shutdown))
                .await
            {
                tracing::error!(error = %e, "Admin API stopped");
            }
        });
    }

    let listener = TcpListener::bind(config.listen_address()).await?;

    let trigger = shutdown.clone();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        tracing::info!("Shutdown signal received");
        trigger.trigger();
    });

    server.run(listener, shutdown.subscribe()).await?;
    Ok(())
}
