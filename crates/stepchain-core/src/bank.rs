//! Pattern bank with quantized slot switching

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, StepchainError};
use crate::pattern::Pattern;
use crate::transport::Transport;

pub const NUM_SLOTS: usize = 10;
pub const MIN_REPEATS: u8 = 1;
pub const MAX_REPEATS: u8 = 16;

/// Tolerance when comparing a switch deadline against the scheduler cursor
const DEADLINE_EPSILON: f64 = 1e-6;

fn default_repeats() -> u32 {
    MIN_REPEATS as u32
}

/// One of the bank's fixed slots.
///
/// `is_empty` is bookkeeping: set by clearing, unset by saving. A saved slot
/// whose steps are all off is not empty; use [`PatternSlot::has_content`] to
/// ask whether it would make a sound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PatternSlotData", into = "PatternSlotData")]
pub struct PatternSlot {
    pattern: Pattern,
    repeats: u8,
    is_empty: bool,
}

/// Wire form of a slot. Out-of-range repeats are clamped on the way in, and
/// a missing `is_empty` flag is derived from the pattern's hits.
#[derive(Serialize, Deserialize)]
struct PatternSlotData {
    pattern: Pattern,
    #[serde(default = "default_repeats")]
    repeats: u32,
    #[serde(default)]
    is_empty: Option<bool>,
}

impl From<PatternSlotData> for PatternSlot {
    fn from(data: PatternSlotData) -> Self {
        let has_content = data.pattern.has_active_steps();
        let repeats = data.repeats.clamp(MIN_REPEATS as u32, MAX_REPEATS as u32) as u8;
        Self {
            pattern: data.pattern,
            repeats,
            // A slot carrying hits is never flagged empty
            is_empty: data.is_empty.unwrap_or(true) && !has_content,
        }
    }
}

impl From<PatternSlot> for PatternSlotData {
    fn from(slot: PatternSlot) -> Self {
        Self {
            pattern: slot.pattern,
            repeats: u32::from(slot.repeats),
            is_empty: Some(slot.is_empty),
        }
    }
}

impl Default for PatternSlot {
    fn default() -> Self {
        Self {
            pattern: Pattern::default(),
            repeats: MIN_REPEATS,
            is_empty: true,
        }
    }
}

impl PatternSlot {
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn repeats(&self) -> u8 {
        self.repeats
    }

    pub fn is_empty(&self) -> bool {
        self.is_empty
    }

    /// Whether any step inside the pattern's active range is on
    pub fn has_content(&self) -> bool {
        self.pattern.has_active_steps()
    }

}

/// A switch waiting for its bar boundary
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingSwitch {
    pub slot: usize,
    /// Audio-clock time of the bar boundary the switch lands on
    pub due: f64,
}

/// Result of a switch request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SwitchOutcome {
    /// The live pattern was replaced before returning
    Switched { slot: usize },
    /// The switch lands on the bar boundary at `due`
    Queued { slot: usize, due: f64 },
}

/// Ten pattern slots plus the live pattern the transport plays
#[derive(Debug, Clone)]
pub struct PatternBank {
    slots: [PatternSlot; NUM_SLOTS],
    live: Pattern,
    active_slot: usize,
    pending: Option<PendingSwitch>,
}

impl Default for PatternBank {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|_| PatternSlot::default()),
            live: Pattern::default(),
            active_slot: 0,
            pending: None,
        }
    }
}

fn check_slot(index: usize) -> Result<()> {
    if index >= NUM_SLOTS {
        return Err(StepchainError::InvalidSlot(index));
    }
    Ok(())
}

impl PatternBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// The pattern being edited and scheduled
    pub fn live(&self) -> &Pattern {
        &self.live
    }

    pub fn live_mut(&mut self) -> &mut Pattern {
        &mut self.live
    }

    /// Slot the live pattern was loaded from
    pub fn active_slot(&self) -> usize {
        self.active_slot
    }

    pub fn pending(&self) -> Option<PendingSwitch> {
        self.pending
    }

    pub fn slot(&self, index: usize) -> Result<&PatternSlot> {
        check_slot(index)?;
        Ok(&self.slots[index])
    }

    pub fn slots(&self) -> &[PatternSlot] {
        &self.slots
    }

    /// Snapshot the live pattern into `index`
    pub fn save_current_to_slot(&mut self, index: usize) -> Result<()> {
        check_slot(index)?;
        let slot = &mut self.slots[index];
        slot.pattern = self.live.clone();
        slot.is_empty = false;
        debug!(slot = index, hits = slot.pattern.hit_count(), "Saved live pattern to slot");
        Ok(())
    }

    /// Request the live pattern come from `index`.
    ///
    /// Stopped or paused transports swap immediately. A playing transport
    /// queues the switch for the next bar boundary; a later request replaces
    /// an earlier one.
    pub fn switch_to(&mut self, index: usize, transport: &Transport) -> Result<SwitchOutcome> {
        check_slot(index)?;

        if !transport.is_playing() {
            self.pending = None;
            self.apply(index);
            return Ok(SwitchOutcome::Switched { slot: index });
        }

        let due = transport.next_bar_time(self.live.step_count(), self.live.step_duration());
        if let Some(previous) = self.pending.replace(PendingSwitch { slot: index, due }) {
            debug!(superseded = previous.slot, slot = index, "Queued switch replaced");
        }
        Ok(SwitchOutcome::Queued { slot: index, due })
    }

    /// Land the queued switch if its deadline is at or before `cursor`
    pub fn land_due(&mut self, cursor: f64) -> Option<usize> {
        let pending = self.pending?;
        if pending.due > cursor + DEADLINE_EPSILON {
            return None;
        }
        self.land_now()
    }

    /// Land the queued switch regardless of its deadline
    pub fn land_now(&mut self) -> Option<usize> {
        let PendingSwitch { slot, .. } = self.pending.take()?;
        self.apply(slot);
        Some(slot)
    }

    /// Recompute the deadline after tempo or length changes
    pub fn rearm(&mut self, transport: &Transport) -> Option<PendingSwitch> {
        let due = transport.next_bar_time(self.live.step_count(), self.live.step_duration());
        let pending = self.pending.as_mut()?;
        pending.due = due;
        Some(*pending)
    }

    pub fn cancel_pending(&mut self) -> Option<PendingSwitch> {
        self.pending.take()
    }

    /// Reset to an all-off pattern at default tempo, keeping `repeats`
    pub fn clear_slot(&mut self, index: usize) -> Result<()> {
        check_slot(index)?;
        let slot = &mut self.slots[index];
        slot.pattern = Pattern::default();
        slot.is_empty = true;
        Ok(())
    }

    /// Set bar repeats for chain playback, returning the clamped value
    pub fn set_repeats(&mut self, index: usize, repeats: u32) -> Result<u8> {
        check_slot(index)?;
        let clamped = repeats.clamp(MIN_REPEATS as u32, MAX_REPEATS as u32) as u8;
        self.slots[index].repeats = clamped;
        Ok(clamped)
    }

    /// Duplicate one slot into another
    pub fn copy_slot(&mut self, from: usize, to: usize) -> Result<()> {
        check_slot(from)?;
        check_slot(to)?;
        if from != to {
            self.slots[to] = self.slots[from].clone();
        }
        Ok(())
    }

    /// Replace all slots and reload the live pattern from `active_slot`
    pub fn restore(&mut self, slots: Vec<PatternSlot>, active_slot: usize) -> Result<()> {
        let found = slots.len();
        let slots: [PatternSlot; NUM_SLOTS] = slots
            .try_into()
            .map_err(|_| StepchainError::SlotCount { found, expected: NUM_SLOTS })?;
        check_slot(active_slot)?;

        self.slots = slots;
        self.pending = None;
        self.active_slot = active_slot;
        self.live = self.slots[active_slot].pattern.clone();
        Ok(())
    }

    /// Load `index` into the live pattern. An empty slot first takes a copy
    /// of the live pattern so switching never throws away what's being edited.
    fn apply(&mut self, index: usize) {
        let slot = &mut self.slots[index];
        if slot.is_empty {
            slot.pattern = self.live.clone();
            slot.is_empty = false;
            debug!(slot = index, "Empty slot seeded from live pattern");
        }
        self.live = slot.pattern.clone();
        self.active_slot = index;
        debug!(slot = index, tempo = self.live.tempo(), steps = self.live.step_count(), "Switched slot");
    }
}
