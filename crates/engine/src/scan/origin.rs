//! Time origin — the lazily-resolved epoch anchor for offset-only logs.
//!
//! Set at most once and read many times. `OnceLock` keeps the same contract
//! if a future front end parallelizes across files (never across fragments
//! of one file).

use std::sync::OnceLock;

#[derive(Debug, Default)]
pub struct TimeOrigin {
    epoch_ms: OnceLock<i64>,
}

impl TimeOrigin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_epoch_ms(epoch_ms: i64) -> Self {
        let origin = Self::new();
        origin.set(epoch_ms);
        origin
    }

    /// First writer wins; later calls are no-ops.
    pub fn set(&self, epoch_ms: i64) {
        let _ = self.epoch_ms.set(epoch_ms);
    }

    pub fn get(&self) -> Option<i64> {
        self.epoch_ms.get().copied()
    }
}
