//! failover-proxy
//!
//! A round-robin reverse proxy that routes around dead backends.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ http server ──▶ dispatcher ──▶ pool.next_live() ──▶ backend ──▶ Backend Server
//!                                  │                                  │
//!                                  │◀──── forward failed (retries) ───┘
//!                                  └──▶ pool.set_status(url, false) ──▶ select again
//!
//!   health monitor ── every 2 min, TCP probe ──▶ backend.set_alive(result)
//! ```
//!
//! # Usage
//!
//! ```text
//! failover-proxy --servers http://localhost:5001,http://localhost:5002 --port 3030
//! failover-proxy --config proxy.toml
//! ```

use std::path::PathBuf;

use clap::Parser;

use failover_proxy::config::{read_config, validate_config, validation::join_errors, ProxyConfig};
use failover_proxy::lifecycle;
use failover_proxy::observability::logging;

#[derive(Parser)]
#[command(name = "failover-proxy")]
#[command(about = "Round-robin HTTP load balancer with failover", long_about = None)]
struct Cli {
    /// Load balanced servers, use commas to separate
    #[arg(long)]
    servers: Option<String>,

    /// Port to serve
    #[arg(long)]
    port: Option<u16>,

    /// Optional TOML config file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn into_config(self) -> Result<ProxyConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => ProxyConfig::default(),
        };

        if let Some(servers) = &self.servers {
            config.set_servers(servers);
        }
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    logging::init_logging(&config.observability.log_level);

    tracing::info!("failover-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    if let Err(errors) = validate_config(&config) {
        tracing::error!(errors = %join_errors(&errors), "Invalid configuration");
        return Err(join_errors(&errors).into());
    }

    tracing::info!(
        listen = %config.listen_address(),
        backends = config.backends.len(),
        health_interval_secs = config.health_check.interval_secs,
        "Configuration loaded"
    );

    lifecycle::start(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
