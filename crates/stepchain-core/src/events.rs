//! Outward event surface

use crossbeam_channel::{Receiver, Sender, unbounded};
use serde::Serialize;

/// Events observers can watch. They never drive the engine back.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum EngineEvent {
    /// A step was committed to play at `time` on the audio clock
    StepTriggered { step: usize, time: f64 },
    /// A bar wrapped; `time` is when the next bar starts
    BarCompleted { bar: u64, time: f64 },
    TempoChanged { bpm: u32 },
    PatternSwitched { slot: usize },
    /// A switch was deferred to the bar boundary at `at`
    PatternSwitchQueued { slot: usize, at: f64 },
    ChainStarted { slot: usize },
    ChainStopped,
    /// The chain wrapped back to an earlier slot
    ChainLooped { slot: usize },
    /// No playable slot left; chain mode ended and playback stopped
    ChainCompleted,
}

/// Synchronous fan-out to channel subscribers.
///
/// Receivers are unbounded so bar events are never dropped; a subscriber
/// must drain its receiver or drop it. Dropped receivers are pruned on the
/// next emit.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<Sender<EngineEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<EngineEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    pub fn emit(&mut self, event: EngineEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
