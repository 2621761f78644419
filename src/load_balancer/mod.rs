//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher asks for a backend
//!     → pool.rs (fixed member list)
//!     → round_robin.rs (rotate from shared cursor, skip dead backends)
//!     → backend.rs (forward request through shared forwarder)
//!     → Return backend or None when every backend is dead
//! ```
//!
//! # Design Decisions
//! - Membership is fixed at startup; only liveness changes afterwards
//! - Liveness is a per-backend atomic, the cursor a single shared counter
//! - Dead backends excluded from selection until a health check revives them

pub mod backend;
pub mod pool;
pub mod round_robin;

pub use backend::Backend;
pub use pool::{BackendPool, PoolBuilder, PoolError};
