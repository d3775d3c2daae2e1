//! Process-local audio clock

use std::time::Instant;

use stepchain_core::AudioClock;

/// Seconds since construction, read from the monotonic system clock.
/// Stands in for an audio device clock when no backend is attached.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioClock for MonotonicClock {
    fn now(&self) -> Option<f64> {
        Some(self.origin.elapsed().as_secs_f64())
    }
}
