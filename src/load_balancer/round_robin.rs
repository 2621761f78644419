//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::load_balancer::backend::Backend;

/// Round-robin selector that skips dead backends.
///
/// Stores a shared cursor to rotate through backends. The cursor is
/// incremented before use, so a fresh selector starts at index 1.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the next alive backend, scanning at most `backends.len()` candidates.
    pub fn next_live(&self, backends: &[Arc<Backend>]) -> Option<Arc<Backend>> {
        let len = backends.len();
        if len == 0 {
            return None;
        }

        let start = self.cursor.fetch_add(1, Ordering::Relaxed).wrapping_add(1) % len;

        for i in 0..len {
            let index = (start + i) % len;
            let backend = &backends[index];
            if backend.is_alive() {
                // Continue rotation from the live backend. Racy but only a hint.
                if index != start {
                    self.cursor.store(index, Ordering::Relaxed);
                }
                return Some(backend.clone());
            }
        }
        None
    }
}
