//! Per-request retry counters.

/// Counters carried through one logical request's retry chain.
///
/// `attempts` counts backend selections (starting at 1). `local_retries`
/// counts retries against the currently selected backend and resets whenever
/// a new backend is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptState {
    pub attempts: u32,
    pub local_retries: u32,
}

impl Default for AttemptState {
    fn default() -> Self {
        Self {
            attempts: 1,
            local_retries: 0,
        }
    }
}

impl AttemptState {
    /// Record one more retry against the same backend.
    pub fn retry_locally(&mut self) {
        self.local_retries += 1;
    }

    /// Move on to a freshly selected backend.
    pub fn next_attempt(&mut self) {
        self.attempts += 1;
        self.local_retries = 0;
    }
}
