//! Round-robin HTTP load balancer with health checks and failover.

// Core subsystems
pub mod config;
pub mod forward;
pub mod http;

// Traffic management
pub mod dispatch;
pub mod health;
pub mod load_balancer;

// Cross-cutting concerns
pub mod admin;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::schema::ProxyConfig;
pub use dispatch::Dispatcher;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use load_balancer::BackendPool;
