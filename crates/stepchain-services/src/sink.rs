//! Trigger sink that forwards to a channel

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use stepchain_core::{TrackId, Trigger, TriggerSink};
use tracing::debug;

/// Hands triggers to another thread (an audio backend, a logger).
///
/// Never blocks the poll tick: when the channel is full the trigger is
/// dropped and counted.
pub struct ChannelSink {
    tx: Sender<Trigger>,
    dropped: u64,
}

impl ChannelSink {
    pub fn new(tx: Sender<Trigger>) -> Self {
        Self { tx, dropped: 0 }
    }

    /// Sink plus the receiving end of a channel holding `capacity` triggers
    pub fn bounded(capacity: usize) -> (Self, Receiver<Trigger>) {
        let (tx, rx) = bounded(capacity);
        (Self::new(tx), rx)
    }

    /// Triggers lost to a full channel
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn forward(&mut self, trigger: Trigger) {
        match self.tx.try_send(trigger) {
            Ok(()) => {}
            Err(TrySendError::Full(trigger)) => {
                self.dropped += 1;
                debug!(at = trigger.at(), dropped = self.dropped, "Trigger channel full");
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

impl TriggerSink for ChannelSink {
    fn trigger_track(&mut self, track: &TrackId, at: f64, velocity: f32) {
        self.forward(Trigger::Track {
            track: track.clone(),
            at,
            velocity,
        });
    }

    fn trigger_sample(&mut self, slot: u8, at: f64) {
        self.forward(Trigger::Sample { slot, at });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forwards_triggers() {
        let (mut sink, rx) = ChannelSink::bounded(4);
        sink.trigger_track(&TrackId::from("kick"), 0.5, 1.0);
        sink.trigger_sample(2, 0.75);

        assert_eq!(rx.try_recv().unwrap().track_id(), TrackId::from("kick"));
        assert_eq!(rx.try_recv().unwrap(), Trigger::Sample { slot: 2, at: 0.75 });
    }

    #[test]
    fn test_full_channel_drops() {
        let (mut sink, rx) = ChannelSink::bounded(1);
        sink.trigger_sample(0, 0.0);
        sink.trigger_sample(1, 0.1);
        assert_eq!(sink.dropped(), 1);
        assert_eq!(rx.len(), 1);
    }

    #[test]
    fn test_disconnected_is_silent() {
        let (mut sink, rx) = ChannelSink::bounded(1);
        drop(rx);
        sink.trigger_sample(0, 0.0);
        assert_eq!(sink.dropped(), 0);
    }
}
