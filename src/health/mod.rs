//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer (default every 2 minutes)
//!     → Pool health check pass, one backend at a time
//!     → probe.rs (TCP connect with timeout)
//!     → Backend::set_alive(result)
//!
//! Passive failure detection lives in the dispatcher:
//!     Forward fails after local retries
//!     → Pool::set_status(url, false)
//! ```
//!
//! # Design Decisions
//! - A single probe result decides liveness; no thresholds
//! - The monitor never blocks request handling; it runs on its own task
//! - Probe failures are liveness signals, logged but never propagated

pub mod active;
pub mod probe;

pub use active::HealthMonitor;
pub use probe::{Probe, TcpProbe};
