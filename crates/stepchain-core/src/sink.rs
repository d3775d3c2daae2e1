//! Outbound trigger contracts

use std::sync::{Arc, Mutex};

use crate::pattern::TrackId;

pub const DEFAULT_VELOCITY: f32 = 1.0;

/// Receiver of sound triggers. Fire-and-forget: nothing is returned and
/// playback completion is never reported back.
pub trait TriggerSink: Send {
    /// Fire an instrument track at `at` seconds on the audio clock
    fn trigger_track(&mut self, track: &TrackId, at: f64, velocity: f32);

    /// Fire a one-shot sample slot at `at` seconds on the audio clock
    fn trigger_sample(&mut self, slot: u8, at: f64);
}

/// A single dispatched trigger
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    Track { track: TrackId, at: f64, velocity: f32 },
    Sample { slot: u8, at: f64 },
}

impl Trigger {
    pub fn at(&self) -> f64 {
        match self {
            Self::Track { at, .. } | Self::Sample { at, .. } => *at,
        }
    }

    /// Track id that produced this trigger
    pub fn track_id(&self) -> TrackId {
        match self {
            Self::Track { track, .. } => track.clone(),
            Self::Sample { slot, .. } => TrackId::sample(*slot),
        }
    }
}

/// Keeps every trigger in memory; clones share the same log
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    triggers: Arc<Mutex<Vec<Trigger>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far
    pub fn triggers(&self) -> Vec<Trigger> {
        self.triggers.lock().map(|t| t.clone()).unwrap_or_default()
    }

    /// Drain the log
    pub fn take(&self) -> Vec<Trigger> {
        self.triggers
            .lock()
            .map(|mut t| std::mem::take(&mut *t))
            .unwrap_or_default()
    }

    fn push(&self, trigger: Trigger) {
        if let Ok(mut triggers) = self.triggers.lock() {
            triggers.push(trigger);
        }
    }
}

impl TriggerSink for RecordingSink {
    fn trigger_track(&mut self, track: &TrackId, at: f64, velocity: f32) {
        self.push(Trigger::Track {
            track: track.clone(),
            at,
            velocity,
        });
    }

    fn trigger_sample(&mut self, slot: u8, at: f64) {
        self.push(Trigger::Sample { slot, at });
    }
}
