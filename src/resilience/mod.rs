//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Forward to backend fails:
//!     → retries.rs (local retry with fixed backoff?)
//!     → exhausted: backend marked dead, another selection allowed?
//! ```
//!
//! # Design Decisions
//! - Every external call has a deadline (forwarder timeout, probe timeout)
//! - Local retries are bounded per backend selection
//! - Backend selections are bounded per request

pub mod retries;

pub use retries::RetryPolicy;
