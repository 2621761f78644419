//! Dispatch and failover subsystem.
//!
//! # Data Flow
//! ```text
//! Buffered request
//!     → dispatcher.rs: pool.next_live()
//!         - None → 503
//!     → backend.forward(request)
//!         - Ok → response
//!         - Err → local retry (fixed backoff, bounded)
//!             - exhausted → mark dead, attempts += 1, select again
//! ```
//!
//! # Design Decisions
//! - The retry chain is a loop over an explicit `AttemptState`, not recursion
//! - Pool exhaustion is the only failure the client sees

pub mod attempt;
pub mod dispatcher;

pub use attempt::AttemptState;
pub use dispatcher::{Dispatcher, UNAVAILABLE_BODY};
