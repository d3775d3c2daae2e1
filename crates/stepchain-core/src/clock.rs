//! Audio-domain clock abstraction

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Monotonic clock in the audio domain, in seconds.
///
/// All trigger times are expressed against this clock, never wall-clock time.
pub trait AudioClock: Send + Sync {
    /// Current time, or `None` while the audio backend is not yet running
    fn now(&self) -> Option<f64>;
}

/// Settable clock shared between clones.
///
/// Drives the scheduler deterministically: advance it, then poll.
#[derive(Debug, Clone)]
pub struct ManualClock {
    time_raw: Arc<AtomicU64>,
    running: Arc<AtomicBool>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            time_raw: Arc::new(AtomicU64::new(start.to_bits())),
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Clock that reports unavailable until `start` is called
    pub fn stopped() -> Self {
        let clock = Self::new(0.0);
        clock.running.store(false, Ordering::SeqCst);
        clock
    }

    pub fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
    }

    pub fn time(&self) -> f64 {
        f64::from_bits(self.time_raw.load(Ordering::SeqCst))
    }

    pub fn set(&self, time: f64) {
        self.time_raw.store(time.to_bits(), Ordering::SeqCst);
    }

    pub fn advance(&self, delta: f64) {
        self.set(self.time() + delta);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl AudioClock for ManualClock {
    fn now(&self) -> Option<f64> {
        self.running.load(Ordering::SeqCst).then(|| self.time())
    }
}
