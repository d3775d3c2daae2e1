//! Transport state and look-ahead step scheduling

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::AudioClock;
use crate::config::EngineConfig;

/// Transport playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// One unit of scheduler output
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tick {
    /// `step` fires at `time` on the audio clock
    Step { step: usize, time: f64 },
    /// The last step of a bar fired; the next bar starts at `time`
    BarCompleted { bar: u64, time: f64 },
}

/// Playback position and the look-ahead cursor.
///
/// The poll tick asks for ticks until the cursor passes `now + look_ahead`.
/// Trigger times advance by exact step durations from the cursor, never from
/// the poll time, so late polls don't drift the grid.
pub struct Transport {
    clock: Box<dyn AudioClock>,
    state: TransportState,
    /// Step that fires at `next_trigger_time`
    current_step: usize,
    next_trigger_time: f64,
    /// Set when the last step of a bar fired and the wrap hasn't been reported
    wrap_pending: bool,
    bars_completed: u64,
    look_ahead: f64,
}

impl Transport {
    pub fn new(clock: Box<dyn AudioClock>, config: &EngineConfig) -> Self {
        Self {
            clock,
            state: TransportState::Stopped,
            current_step: 0,
            next_trigger_time: 0.0,
            wrap_pending: false,
            bars_completed: 0,
            look_ahead: config.look_ahead_secs(),
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    pub fn is_paused(&self) -> bool {
        self.state == TransportState::Paused
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn next_trigger_time(&self) -> f64 {
        self.next_trigger_time
    }

    /// Bars completed since playback last started from stop
    pub fn bars_completed(&self) -> u64 {
        self.bars_completed
    }

    /// Audio clock time, or zero while the clock is unavailable
    pub fn now(&self) -> f64 {
        self.clock.now().unwrap_or(0.0)
    }

    /// Latest time steps may be committed for on this poll
    pub fn horizon(&self) -> f64 {
        self.now() + self.look_ahead
    }

    /// Whether the next step to fire opens a bar
    pub fn at_bar_start(&self) -> bool {
        self.current_step == 0 && !self.wrap_pending
    }

    /// Start or resume. Returns false if already playing.
    pub fn play(&mut self) -> bool {
        if self.is_playing() {
            return false;
        }

        if self.state == TransportState::Stopped {
            self.current_step = 0;
            self.wrap_pending = false;
            self.bars_completed = 0;
        }

        self.next_trigger_time = match self.clock.now() {
            Some(now) => now,
            None => {
                warn!("Audio clock unavailable, scheduling from time zero");
                0.0
            }
        };

        info!(
            step = self.current_step,
            resumed = self.state == TransportState::Paused,
            at = self.next_trigger_time,
            "Transport playing"
        );
        self.state = TransportState::Playing;
        true
    }

    /// Halt scheduling, keeping the position. Returns false if not playing.
    pub fn pause(&mut self) -> bool {
        if !self.is_playing() {
            return false;
        }
        self.state = TransportState::Paused;
        info!(step = self.current_step, "Transport paused");
        true
    }

    /// Halt and rewind to step 0. Returns false if already stopped.
    pub fn stop(&mut self) -> bool {
        if self.state == TransportState::Stopped {
            return false;
        }
        self.state = TransportState::Stopped;
        self.current_step = 0;
        self.wrap_pending = false;
        self.bars_completed = 0;
        info!("Transport stopped");
        true
    }

    /// Time at which step 0 fires next
    pub fn next_bar_time(&self, step_count: usize, step_duration: f64) -> f64 {
        let remaining = step_count.saturating_sub(self.current_step) % step_count.max(1);
        self.next_trigger_time + remaining as f64 * step_duration
    }

    /// Next scheduler output before `horizon`, if any.
    ///
    /// A bar wrap is reported immediately after the last step of the bar,
    /// regardless of the horizon, and before the first step of the next one.
    /// A cursor left beyond a shrunken `step_count` also counts as a wrap.
    pub fn next_tick(&mut self, horizon: f64, step_count: usize, step_duration: f64) -> Option<Tick> {
        if !self.is_playing() {
            return None;
        }

        if self.wrap_pending || self.current_step >= step_count {
            self.wrap_pending = false;
            self.current_step = 0;
            self.bars_completed += 1;
            debug!(bar = self.bars_completed, "Bar completed");
            return Some(Tick::BarCompleted {
                bar: self.bars_completed,
                time: self.next_trigger_time,
            });
        }

        if self.next_trigger_time >= horizon {
            return None;
        }

        let tick = Tick::Step {
            step: self.current_step,
            time: self.next_trigger_time,
        };

        self.next_trigger_time += step_duration;
        self.current_step += 1;
        if self.current_step >= step_count {
            self.current_step = 0;
            self.wrap_pending = true;
        }

        Some(tick)
    }
}
