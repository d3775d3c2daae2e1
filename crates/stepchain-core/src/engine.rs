//! Engine: owns transport, bank and chain and runs the poll tick

use crossbeam_channel::Receiver;
use tracing::{debug, info};

use crate::bank::{PatternBank, PendingSwitch, SwitchOutcome};
use crate::chain::{ChainDecision, ChainPlayer};
use crate::clock::AudioClock;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::events::{EngineEvent, EventBus};
use crate::pattern::{Pattern, TimeSignature, TrackId};
use crate::sink::{DEFAULT_VELOCITY, TriggerSink};
use crate::snapshot::BankSnapshot;
use crate::transport::{Tick, Transport};

/// The sequencer. Single-threaded: the caller invokes [`Engine::poll`] on a
/// fixed interval and every other method between polls.
pub struct Engine {
    transport: Transport,
    bank: PatternBank,
    chain: ChainPlayer,
    /// Chain mode requested; the player goes active once playback starts
    chain_armed: bool,
    sink: Box<dyn TriggerSink>,
    events: EventBus,
    config: EngineConfig,
}

impl Engine {
    pub fn new(clock: Box<dyn AudioClock>, sink: Box<dyn TriggerSink>, config: EngineConfig) -> Self {
        Self {
            transport: Transport::new(clock, &config),
            bank: PatternBank::new(),
            chain: ChainPlayer::new(),
            chain_armed: false,
            sink,
            events: EventBus::new(),
            config,
        }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn bank(&self) -> &PatternBank {
        &self.bank
    }

    pub fn chain(&self) -> &ChainPlayer {
        &self.chain
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The pattern being played and edited
    pub fn live(&self) -> &Pattern {
        self.bank.live()
    }

    pub fn chain_mode_enabled(&self) -> bool {
        self.chain_armed
    }

    pub fn subscribe(&mut self) -> Receiver<EngineEvent> {
        self.events.subscribe()
    }

    // --- Scheduling ---

    /// One poll tick. Commits every step due before `now + look_ahead` and
    /// returns how many were scheduled.
    pub fn poll(&mut self) -> usize {
        if !self.transport.is_playing() {
            return 0;
        }

        let horizon = self.transport.horizon();
        let mut scheduled = 0;

        loop {
            if self.transport.at_bar_start() {
                let cursor = self.transport.next_trigger_time();
                self.land_switch(|bank| bank.land_due(cursor));
            }

            let step_count = self.bank.live().step_count();
            let step_duration = self.bank.live().step_duration();
            let Some(tick) = self.transport.next_tick(horizon, step_count, step_duration) else {
                break;
            };

            match tick {
                Tick::Step { step, time } => {
                    self.dispatch(step, time);
                    self.events.emit(EngineEvent::StepTriggered { step, time });
                    scheduled += 1;
                }
                Tick::BarCompleted { bar, time } => {
                    self.events.emit(EngineEvent::BarCompleted { bar, time });
                    self.advance_chain();
                }
            }
        }

        scheduled
    }

    fn dispatch(&mut self, step: usize, time: f64) {
        for track in self.bank.live().active_tracks_at(step) {
            match track.sample_slot() {
                Some(slot) => self.sink.trigger_sample(slot, time),
                None => self.sink.trigger_track(track, time, DEFAULT_VELOCITY),
            }
        }
    }

    fn advance_chain(&mut self) {
        match self.chain.on_bar_completed(&self.bank) {
            ChainDecision::Idle | ChainDecision::Repeat { .. } => {}
            ChainDecision::Advance { from, to, looped } => {
                if looped {
                    self.events.emit(EngineEvent::ChainLooped { slot: to });
                }
                if from != to {
                    self.request_switch(to);
                }
            }
            ChainDecision::Exhausted => {
                self.chain_armed = false;
                self.events.emit(EngineEvent::ChainCompleted);
                self.stop();
            }
        }
    }

    // --- Transport ---

    /// Start or resume. An armed chain starts with playback.
    pub fn play(&mut self) -> bool {
        if self.transport.is_playing() {
            return false;
        }

        if self.chain_armed && !self.chain.is_active() && !self.begin_chain() {
            self.chain_armed = false;
        }

        self.transport.play();
        self.rearm_pending();
        true
    }

    pub fn pause(&mut self) -> bool {
        self.transport.pause()
    }

    /// Stop and rewind. Deactivates the chain and lands any queued switch.
    pub fn stop(&mut self) -> bool {
        let stopped = self.transport.stop();
        if self.chain.stop() {
            self.events.emit(EngineEvent::ChainStopped);
        }
        self.land_switch(PatternBank::land_now);
        stopped
    }

    // --- Pattern editing ---

    pub fn step(&self, track: &TrackId, step: usize) -> Result<bool> {
        self.bank.live().step(track, step)
    }

    pub fn set_step(&mut self, track: impl Into<TrackId>, step: usize, on: bool) -> Result<()> {
        self.bank.live_mut().set_step(track, step, on)
    }

    pub fn toggle_step(&mut self, track: impl Into<TrackId>, step: usize) -> Result<bool> {
        self.bank.live_mut().toggle_step(track, step)
    }

    pub fn clear_track(&mut self, track: &TrackId) -> bool {
        self.bank.live_mut().clear_track(track)
    }

    pub fn clear_all(&mut self) {
        self.bank.live_mut().clear_all();
    }

    pub fn add_track(&mut self, track: impl Into<TrackId>) -> bool {
        self.bank.live_mut().add_track(track)
    }

    pub fn remove_track(&mut self, track: &TrackId) -> bool {
        self.bank.live_mut().remove_track(track)
    }

    pub fn fill_euclidean(&mut self, track: impl Into<TrackId>, pulses: usize, rotation: usize) {
        self.bank.live_mut().fill_euclidean(track, pulses, rotation);
    }

    /// Resize the live pattern; a queued switch moves to the new bar end
    pub fn set_step_count(&mut self, steps: usize) -> usize {
        let applied = self.bank.live_mut().set_step_count(steps);
        self.rearm_pending();
        applied
    }

    pub fn set_tempo(&mut self, bpm: u32) -> u32 {
        let before = self.bank.live().tempo();
        let applied = self.bank.live_mut().set_tempo(bpm);
        if applied != before {
            self.events.emit(EngineEvent::TempoChanged { bpm: applied });
            self.rearm_pending();
        }
        applied
    }

    pub fn set_time_signature(&mut self, time_signature: TimeSignature) {
        self.bank.live_mut().set_time_signature(time_signature);
    }

    // --- Bank ---

    pub fn save_current_to_slot(&mut self, index: usize) -> Result<()> {
        self.bank.save_current_to_slot(index)
    }

    /// Manual slot switch. While the chain is active it follows the new slot
    /// and restarts its repeat count.
    pub fn switch_to(&mut self, index: usize) -> Result<SwitchOutcome> {
        let mid_bar = !self.transport.at_bar_start();
        let outcome = self.switch_bank(index)?;
        self.chain.follow(index, mid_bar);
        Ok(outcome)
    }

    pub fn cancel_queued_switch(&mut self) -> Option<usize> {
        let PendingSwitch { slot, .. } = self.bank.cancel_pending()?;
        debug!(slot, "Queued switch cancelled");
        Some(slot)
    }

    pub fn clear_slot(&mut self, index: usize) -> Result<()> {
        self.bank.clear_slot(index)
    }

    pub fn set_repeats(&mut self, index: usize, repeats: u32) -> Result<u8> {
        self.bank.set_repeats(index, repeats)
    }

    pub fn copy_slot(&mut self, from: usize, to: usize) -> Result<()> {
        self.bank.copy_slot(from, to)
    }

    // --- Chain ---

    /// Arm or disarm chain mode. Arming while playing starts the chain now.
    pub fn set_chain_mode(&mut self, enabled: bool) {
        if !enabled {
            self.stop_chain();
            return;
        }

        self.chain_armed = true;
        if self.transport.is_playing() && !self.chain.is_active() && !self.begin_chain() {
            self.chain_armed = false;
        }
    }

    /// Start the chain from the first playable slot and make sure playback
    /// is running. Returns false, touching nothing, when no slot has hits.
    pub fn start_chain(&mut self) -> bool {
        if self.chain.is_active() {
            return true;
        }
        if !self.begin_chain() {
            return false;
        }

        self.chain_armed = true;
        if !self.transport.is_playing() {
            self.transport.play();
        }
        true
    }

    pub fn stop_chain(&mut self) {
        self.chain_armed = false;
        if self.chain.stop() {
            self.events.emit(EngineEvent::ChainStopped);
        }
    }

    fn begin_chain(&mut self) -> bool {
        let Some(slot) = self.chain.start(&self.bank) else {
            return false;
        };

        self.events.emit(EngineEvent::ChainStarted { slot });
        if !self.transport.at_bar_start() {
            self.chain.begin_mid_bar();
        }
        self.request_switch(slot);
        true
    }

    // --- Persistence ---

    pub fn export_snapshot(&self) -> BankSnapshot {
        BankSnapshot::capture(&self.bank, self.chain_armed)
    }

    /// Replace the bank. Playback stops first; a rejected snapshot changes
    /// nothing.
    pub fn import_snapshot(&mut self, snapshot: BankSnapshot) -> Result<()> {
        snapshot.validate()?;
        self.stop();

        let before = self.bank.live().tempo();
        self.bank.restore(snapshot.slots, snapshot.current_slot_index)?;
        self.chain_armed = snapshot.chain_mode_enabled;
        info!(
            slot = snapshot.current_slot_index,
            chain = snapshot.chain_mode_enabled,
            "Bank imported"
        );
        self.announce_switch(snapshot.current_slot_index, before);
        Ok(())
    }

    // --- Switch plumbing ---

    fn switch_bank(&mut self, index: usize) -> Result<SwitchOutcome> {
        let before = self.bank.live().tempo();
        let outcome = self.bank.switch_to(index, &self.transport)?;
        match outcome {
            SwitchOutcome::Switched { slot } => self.announce_switch(slot, before),
            SwitchOutcome::Queued { slot, due } => {
                debug!(slot, due, "Switch queued for bar boundary");
                self.events.emit(EngineEvent::PatternSwitchQueued { slot, at: due });
            }
        }
        Ok(outcome)
    }

    /// Internal switch requests always carry a bank index
    fn request_switch(&mut self, index: usize) {
        if let Err(e) = self.switch_bank(index) {
            debug!(slot = index, error = %e, "Switch declined");
        }
    }

    fn land_switch(&mut self, land: impl FnOnce(&mut PatternBank) -> Option<usize>) {
        let before = self.bank.live().tempo();
        if let Some(slot) = land(&mut self.bank) {
            self.announce_switch(slot, before);
        }
    }

    fn announce_switch(&mut self, slot: usize, tempo_before: u32) {
        self.events.emit(EngineEvent::PatternSwitched { slot });
        let tempo = self.bank.live().tempo();
        if tempo != tempo_before {
            self.events.emit(EngineEvent::TempoChanged { bpm: tempo });
        }
    }

    fn rearm_pending(&mut self) {
        if let Some(PendingSwitch { slot, due }) = self.bank.rearm(&self.transport) {
            debug!(slot, due, "Queued switch re-armed");
            self.events.emit(EngineEvent::PatternSwitchQueued { slot, at: due });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::NUM_SLOTS;
    use crate::chain::ChainState;
    use crate::clock::ManualClock;
    use crate::sink::{RecordingSink, Trigger};
    use crate::transport::TransportState;
    use approx::assert_relative_eq;

    struct Rig {
        engine: Engine,
        clock: ManualClock,
        sink: RecordingSink,
        events: Receiver<EngineEvent>,
    }

    impl Rig {
        fn new() -> Self {
            let clock = ManualClock::new(0.0);
            let sink = RecordingSink::new();
            let mut engine = Engine::new(
                Box::new(clock.clone()),
                Box::new(sink.clone()),
                EngineConfig::default(),
            );
            let events = engine.subscribe();
            Self { engine, clock, sink, events }
        }

        /// Advance in poll-interval steps until `until`
        fn run_until(&mut self, until: f64) {
            while self.clock.time() < until {
                self.clock.advance(0.025);
                self.engine.poll();
            }
        }

        fn events(&self) -> Vec<EngineEvent> {
            self.events.try_iter().collect()
        }

        /// Track ids triggered at `at`
        fn tracks_at(&self, at: f64) -> Vec<String> {
            self.sink
                .triggers()
                .into_iter()
                .filter(|t| (t.at() - at).abs() < 1e-9)
                .map(|t| t.track_id().to_string())
                .collect()
        }
    }

    fn save_hit(engine: &mut Engine, slot: usize, track: &str) {
        engine.clear_all();
        engine.set_step(track, 0, true).unwrap();
        engine.save_current_to_slot(slot).unwrap();
    }

    #[test]
    fn test_poll_routes_tracks_and_samples() {
        let mut rig = Rig::new();
        rig.engine.set_step("kick", 0, true).unwrap();
        rig.engine.set_step(TrackId::sample(3), 0, true).unwrap();
        rig.engine.set_step("hat", 1, true).unwrap();

        rig.engine.play();
        assert_eq!(rig.engine.poll(), 1);
        assert_eq!(
            rig.sink.take(),
            vec![
                Trigger::Track { track: TrackId::from("kick"), at: 0.0, velocity: 1.0 },
                Trigger::Sample { slot: 3, at: 0.0 },
            ]
        );
        assert_eq!(rig.events(), vec![EngineEvent::StepTriggered { step: 0, time: 0.0 }]);
    }

    #[test]
    fn test_stopped_engine_schedules_nothing() {
        let mut rig = Rig::new();
        rig.engine.set_step("kick", 0, true).unwrap();
        rig.run_until(1.0);
        assert!(rig.sink.triggers().is_empty());
    }

    #[test]
    fn test_bar_events_follow_last_step() {
        let mut rig = Rig::new();
        rig.engine.play();
        rig.run_until(3.95);

        let events = rig.events();
        let bars: Vec<u64> = events
            .iter()
            .filter_map(|e| match e {
                EngineEvent::BarCompleted { bar, .. } => Some(*bar),
                _ => None,
            })
            .collect();
        assert_eq!(bars, vec![1, 2]);

        let first_bar = events
            .iter()
            .position(|e| matches!(e, EngineEvent::BarCompleted { .. }))
            .unwrap();
        assert_eq!(events[first_bar - 1], EngineEvent::StepTriggered { step: 15, time: 1.875 });
        assert_eq!(events[first_bar + 1], EngineEvent::StepTriggered { step: 0, time: 2.0 });
    }

    #[test]
    fn test_switch_while_stopped_is_synchronous() {
        let mut rig = Rig::new();
        save_hit(&mut rig.engine, 3, "snare");
        rig.engine.set_tempo(90);
        rig.events();

        let outcome = rig.engine.switch_to(3).unwrap();
        assert_eq!(outcome, SwitchOutcome::Switched { slot: 3 });
        assert_eq!(rig.engine.bank().active_slot(), 3);
        assert_eq!(
            rig.events(),
            vec![EngineEvent::PatternSwitched { slot: 3 }, EngineEvent::TempoChanged { bpm: 120 }]
        );
    }

    #[test]
    fn test_queued_switch_lands_on_bar() {
        let mut rig = Rig::new();
        save_hit(&mut rig.engine, 1, "snare");
        save_hit(&mut rig.engine, 0, "kick");
        rig.engine.play();
        rig.run_until(1.0);
        rig.events();

        let outcome = rig.engine.switch_to(1).unwrap();
        assert_eq!(outcome, SwitchOutcome::Queued { slot: 1, due: 2.0 });
        assert_eq!(rig.engine.bank().active_slot(), 0);
        assert_eq!(rig.events(), vec![EngineEvent::PatternSwitchQueued { slot: 1, at: 2.0 }]);

        rig.run_until(2.05);
        assert_eq!(rig.tracks_at(0.0), vec!["kick"]);
        assert_eq!(rig.tracks_at(2.0), vec!["snare"]);
        assert!(rig.events().contains(&EngineEvent::PatternSwitched { slot: 1 }));
    }

    #[test]
    fn test_queued_switch_seeds_empty_slot_at_landing() {
        let mut rig = Rig::new();
        rig.engine.set_step("kick", 0, true).unwrap();
        rig.engine.set_step("snare", 8, true).unwrap();
        rig.engine.play();
        rig.run_until(1.0);

        let outcome = rig.engine.switch_to(7).unwrap();
        assert_eq!(outcome, SwitchOutcome::Queued { slot: 7, due: 2.0 });
        // Edits made before the bar ends are part of the copy
        rig.engine.set_step("hat", 12, true).unwrap();
        assert!(rig.engine.bank().slot(7).unwrap().is_empty());

        rig.run_until(2.05);
        let slot = rig.engine.bank().slot(7).unwrap();
        assert!(!slot.is_empty());
        assert_eq!(slot.pattern().hit_count(), 3);
        assert_eq!(rig.engine.bank().active_slot(), 7);
        assert_eq!(rig.tracks_at(2.0), vec!["kick"]);
    }

    #[test]
    fn test_play_with_unavailable_clock() {
        let clock = ManualClock::stopped();
        let sink = RecordingSink::new();
        let mut engine = Engine::new(
            Box::new(clock.clone()),
            Box::new(sink.clone()),
            EngineConfig::default(),
        );
        engine.set_step("kick", 0, true).unwrap();

        assert!(engine.play());
        assert!(engine.transport().is_playing());
        assert_eq!(engine.poll(), 1);
        assert_eq!(
            sink.triggers(),
            vec![Trigger::Track { track: TrackId::from("kick"), at: 0.0, velocity: 1.0 }]
        );

        // Scheduling picks up once the clock reports time
        clock.start();
        clock.set(0.3);
        assert_eq!(engine.poll(), 3);
    }

    #[test]
    fn test_later_request_supersedes() {
        let mut rig = Rig::new();
        save_hit(&mut rig.engine, 1, "snare");
        save_hit(&mut rig.engine, 2, "clap");
        rig.engine.play();
        rig.run_until(0.5);

        rig.engine.switch_to(1).unwrap();
        rig.engine.switch_to(2).unwrap();
        rig.run_until(2.05);
        assert_eq!(rig.engine.bank().active_slot(), 2);
        assert_eq!(rig.tracks_at(2.0), vec!["clap"]);
    }

    #[test]
    fn test_cancel_queued_switch() {
        let mut rig = Rig::new();
        save_hit(&mut rig.engine, 1, "snare");
        rig.engine.play();
        rig.engine.poll();

        rig.engine.switch_to(1).unwrap();
        assert_eq!(rig.engine.cancel_queued_switch(), Some(1));
        rig.run_until(2.05);
        assert_eq!(rig.engine.bank().active_slot(), 0);
    }

    #[test]
    fn test_tempo_change_rearms_deadline() {
        let mut rig = Rig::new();
        save_hit(&mut rig.engine, 1, "snare");
        rig.engine.play();
        rig.run_until(1.0);
        rig.engine.switch_to(1).unwrap();
        rig.events();

        assert_eq!(rig.engine.set_tempo(60), 60);
        let events = rig.events();
        assert_eq!(events[0], EngineEvent::TempoChanged { bpm: 60 });
        let EngineEvent::PatternSwitchQueued { slot, at } = events[1] else {
            panic!("expected re-armed switch, got {:?}", events[1]);
        };
        assert_eq!(slot, 1);
        // Step 9 due at 1.125, seven steps of 0.25 s remain
        assert_relative_eq!(at, 2.875);

        // Unchanged tempo is silent
        rig.engine.set_tempo(60);
        assert!(rig.events().is_empty());
    }

    #[test]
    fn test_stop_lands_pending_switch() {
        let mut rig = Rig::new();
        save_hit(&mut rig.engine, 4, "snare");
        rig.engine.play();
        rig.run_until(0.5);
        rig.engine.switch_to(4).unwrap();

        assert!(rig.engine.stop());
        assert_eq!(rig.engine.bank().active_slot(), 4);
        assert_eq!(rig.engine.bank().pending(), None);
        assert_eq!(rig.engine.transport().current_step(), 0);
    }

    #[test]
    fn test_chain_without_content_touches_nothing() {
        let mut rig = Rig::new();
        rig.engine.save_current_to_slot(0).unwrap();
        assert!(!rig.engine.start_chain());
        assert_eq!(rig.engine.chain().state(), ChainState::Inactive);
        assert_eq!(rig.engine.transport().state(), TransportState::Stopped);
        assert!(!rig.engine.chain_mode_enabled());
        assert!(rig.events().is_empty());
    }

    #[test]
    fn test_start_chain_plays_first_playable_slot() {
        let mut rig = Rig::new();
        save_hit(&mut rig.engine, 2, "snare");
        rig.engine.clear_all();

        assert!(rig.engine.start_chain());
        assert!(rig.engine.transport().is_playing());
        assert_eq!(rig.engine.bank().active_slot(), 2);
        assert_eq!(
            rig.events(),
            vec![EngineEvent::ChainStarted { slot: 2 }, EngineEvent::PatternSwitched { slot: 2 }]
        );

        rig.engine.poll();
        assert_eq!(rig.tracks_at(0.0), vec!["snare"]);
    }

    #[test]
    fn test_chain_mode_armed_before_play() {
        let mut rig = Rig::new();
        save_hit(&mut rig.engine, 0, "kick");
        rig.engine.set_chain_mode(true);
        assert!(rig.engine.chain_mode_enabled());
        assert!(!rig.engine.chain().is_active());

        rig.engine.play();
        assert!(rig.engine.chain().is_active());
    }

    #[test]
    fn test_chain_enabled_mid_bar_skips_partial_bar() {
        let mut rig = Rig::new();
        save_hit(&mut rig.engine, 0, "kick");
        save_hit(&mut rig.engine, 1, "snare");
        rig.engine.switch_to(0).unwrap();
        rig.engine.play();
        rig.run_until(1.0);

        rig.engine.set_chain_mode(true);
        assert!(rig.engine.chain().is_active());
        // Partial bar ends at 2.0; slot 0 then plays its full bar until 4.0
        rig.run_until(4.05);
        assert_eq!(rig.tracks_at(2.0), vec!["kick"]);
        assert_eq!(rig.tracks_at(4.0), vec!["snare"]);
    }

    #[test]
    fn test_pause_keeps_chain_stop_ends_it() {
        let mut rig = Rig::new();
        save_hit(&mut rig.engine, 0, "kick");
        rig.engine.start_chain();
        rig.run_until(0.5);

        rig.engine.pause();
        assert!(rig.engine.chain().is_active());

        rig.engine.stop();
        assert!(!rig.engine.chain().is_active());
        assert!(rig.events().contains(&EngineEvent::ChainStopped));
        // Still armed, so the next play restarts the chain
        assert!(rig.engine.chain_mode_enabled());
        rig.engine.play();
        assert!(rig.engine.chain().is_active());
    }

    #[test]
    fn test_exhausted_chain_stops_playback() {
        let mut rig = Rig::new();
        save_hit(&mut rig.engine, 0, "kick");
        rig.engine.start_chain();
        rig.run_until(1.0);

        rig.engine.clear_slot(0).unwrap();
        rig.run_until(2.5);

        assert!(rig.events().contains(&EngineEvent::ChainCompleted));
        assert_eq!(rig.engine.transport().state(), TransportState::Stopped);
        assert!(!rig.engine.chain_mode_enabled());
    }

    #[test]
    fn test_manual_switch_followed_by_chain() {
        let mut rig = Rig::new();
        save_hit(&mut rig.engine, 0, "kick");
        save_hit(&mut rig.engine, 5, "snare");
        save_hit(&mut rig.engine, 7, "clap");
        rig.engine.set_repeats(5, 2).unwrap();
        rig.engine.start_chain();

        rig.engine.switch_to(5).unwrap();
        assert_eq!(rig.engine.chain().current_slot(), 5);

        // Switch landed before step 0, so both bars count for slot 5
        rig.run_until(4.05);
        assert_eq!(rig.tracks_at(0.0), vec!["snare"]);
        assert_eq!(rig.tracks_at(2.0), vec!["snare"]);
        assert_eq!(rig.tracks_at(4.0), vec!["clap"]);
    }

    #[test]
    fn test_invalid_index_declined() {
        let mut rig = Rig::new();
        let before = rig.engine.live().clone();

        assert!(rig.engine.toggle_step("kick", 16).unwrap_err().is_invalid_index());
        assert!(rig.engine.switch_to(NUM_SLOTS).is_err());
        assert!(rig.engine.set_repeats(11, 2).is_err());
        assert_eq!(rig.engine.live(), &before);
        assert!(rig.events().is_empty());
    }

    #[test]
    fn test_snapshot_round_trip_through_engine() {
        let mut rig = Rig::new();
        save_hit(&mut rig.engine, 6, "snare");
        rig.engine.set_repeats(6, 4).unwrap();
        rig.engine.set_chain_mode(true);
        let snapshot = rig.engine.export_snapshot();
        assert!(snapshot.chain_mode_enabled);

        let mut other = Rig::new();
        other.engine.play();
        other.engine.import_snapshot(snapshot).unwrap();
        assert_eq!(other.engine.transport().state(), TransportState::Stopped);
        assert!(other.engine.chain_mode_enabled());
        assert_eq!(other.engine.bank().slot(6).unwrap().repeats(), 4);
    }

    #[test]
    fn test_rejected_snapshot_changes_nothing() {
        let mut rig = Rig::new();
        rig.engine.play();
        let mut snapshot = rig.engine.export_snapshot();
        snapshot.slots.truncate(4);

        assert!(rig.engine.import_snapshot(snapshot).is_err());
        assert!(rig.engine.transport().is_playing());
    }
}
