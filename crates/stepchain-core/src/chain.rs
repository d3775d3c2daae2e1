//! Chain mode: bar-driven progression through bank slots

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::bank::{NUM_SLOTS, PatternBank};

/// Chain player state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChainState {
    #[default]
    Inactive,
    Active,
}

/// What the chain wants after a bar boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainDecision {
    /// Chain mode is off
    Idle,
    /// Keep looping the current slot
    Repeat { slot: usize, completed: u8, of: u8 },
    /// Move to `to`; `looped` when the scan wrapped back to an earlier slot
    Advance { from: usize, to: usize, looped: bool },
    /// No slot has audible content; chain mode is over
    Exhausted,
}

/// Song-mode state machine.
///
/// Slots are chosen by content, not by the bank's emptiness flag: a slot
/// that was saved and later had every step cleared is skipped.
#[derive(Debug, Clone, Default)]
pub struct ChainPlayer {
    state: ChainState,
    current_slot: usize,
    repeats_completed: u8,
    /// The next bar boundary closes a bar that started before this slot did
    skip_partial_bar: bool,
}

impl ChainPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ChainState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == ChainState::Active
    }

    pub fn current_slot(&self) -> usize {
        self.current_slot
    }

    pub fn repeats_completed(&self) -> u8 {
        self.repeats_completed
    }

    /// First slot with audible content, scanning `start`, `start + 1`, ...
    /// and wrapping once around the bank
    pub fn find_playable(bank: &PatternBank, start: usize) -> Option<usize> {
        (0..NUM_SLOTS)
            .map(|offset| (start + offset) % NUM_SLOTS)
            .find(|&index| bank.slots()[index].has_content())
    }

    /// Enter `Active` on the first playable slot. Returns `None` and stays
    /// `Inactive` when no slot has content.
    pub fn start(&mut self, bank: &PatternBank) -> Option<usize> {
        let Some(slot) = Self::find_playable(bank, 0) else {
            self.state = ChainState::Inactive;
            info!("Chain start declined, no slot has active steps");
            return None;
        };

        self.state = ChainState::Active;
        self.current_slot = slot;
        self.repeats_completed = 0;
        self.skip_partial_bar = false;
        info!(slot, "Chain started");
        Some(slot)
    }

    /// Don't count the bar currently in progress toward the current slot
    pub fn begin_mid_bar(&mut self) {
        self.skip_partial_bar = true;
    }

    /// Manual override: make `slot` current and restart its repeat count
    pub fn follow(&mut self, slot: usize, mid_bar: bool) {
        if !self.is_active() {
            return;
        }
        self.current_slot = slot;
        self.repeats_completed = 0;
        self.skip_partial_bar = mid_bar;
        debug!(slot, "Chain following manual switch");
    }

    /// Advance the state machine on a bar boundary
    pub fn on_bar_completed(&mut self, bank: &PatternBank) -> ChainDecision {
        if !self.is_active() {
            return ChainDecision::Idle;
        }

        if self.skip_partial_bar {
            self.skip_partial_bar = false;
            return ChainDecision::Repeat {
                slot: self.current_slot,
                completed: self.repeats_completed,
                of: self.slot_repeats(bank),
            };
        }

        self.repeats_completed = self.repeats_completed.saturating_add(1);
        let of = self.slot_repeats(bank);
        if self.repeats_completed < of {
            return ChainDecision::Repeat {
                slot: self.current_slot,
                completed: self.repeats_completed,
                of,
            };
        }

        let from = self.current_slot;
        self.repeats_completed = 0;
        match Self::find_playable(bank, (from + 1) % NUM_SLOTS) {
            Some(to) => {
                self.current_slot = to;
                let looped = to <= from;
                debug!(from, to, looped, "Chain advancing");
                ChainDecision::Advance { from, to, looped }
            }
            None => {
                self.state = ChainState::Inactive;
                info!("Chain exhausted, no playable slot left");
                ChainDecision::Exhausted
            }
        }
    }

    /// Leave chain mode. Returns false if it wasn't active.
    pub fn stop(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.state = ChainState::Inactive;
        self.repeats_completed = 0;
        self.skip_partial_bar = false;
        info!("Chain stopped");
        true
    }

    fn slot_repeats(&self, bank: &PatternBank) -> u8 {
        bank.slots()[self.current_slot].repeats()
    }
}
