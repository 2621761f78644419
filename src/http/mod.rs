//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace, timeout)
//!     → proxy handler (buffer body into UpstreamRequest)
//!     → dispatcher (select backend, forward, fail over)
//!     → Send response to client
//! ```

pub mod server;

pub use server::{AppState, HttpServer};
