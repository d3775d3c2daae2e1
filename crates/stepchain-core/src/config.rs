//! Scheduler configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 25;
pub const DEFAULT_LOOK_AHEAD_MS: u64 = 100;

/// Timing of the two-rate scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Wall-clock period of the poll tick
    pub poll_interval_ms: u64,
    /// How far ahead of the audio clock steps are committed
    pub look_ahead_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            look_ahead_ms: DEFAULT_LOOK_AHEAD_MS,
        }
    }
}

impl EngineConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Look-ahead window in audio-clock seconds
    pub fn look_ahead_secs(&self) -> f64 {
        self.look_ahead_ms as f64 / 1000.0
    }
}
