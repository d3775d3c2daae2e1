//! Serializable bank state for the persistence collaborator

use serde::{Deserialize, Serialize};

use crate::bank::{NUM_SLOTS, PatternBank, PatternSlot};
use crate::error::{Result, StepchainError};

/// Everything needed to rebuild a bank: all ten slots plus which slot is
/// loaded and whether chain mode is on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankSnapshot {
    pub slots: Vec<PatternSlot>,
    #[serde(default)]
    pub current_slot_index: usize,
    #[serde(default)]
    pub chain_mode_enabled: bool,
}

impl BankSnapshot {
    pub fn capture(bank: &PatternBank, chain_mode_enabled: bool) -> Self {
        Self {
            slots: bank.slots().to_vec(),
            current_slot_index: bank.active_slot(),
            chain_mode_enabled,
        }
    }

    /// Reject snapshots the bank can't take
    pub fn validate(&self) -> Result<()> {
        if self.slots.len() != NUM_SLOTS {
            return Err(StepchainError::SlotCount {
                found: self.slots.len(),
                expected: NUM_SLOTS,
            });
        }
        if self.current_slot_index >= NUM_SLOTS {
            return Err(StepchainError::InvalidSlot(self.current_slot_index));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate. Patterns and slots come back normalized.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Self = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{MAX_STEPS, MAX_TEMPO, TrackId};

    #[test]
    fn test_capture_and_restore() {
        let mut bank = PatternBank::new();
        bank.live_mut().set_step("kick", 0, true).unwrap();
        bank.save_current_to_slot(4).unwrap();
        bank.set_repeats(4, 3).unwrap();

        let json = BankSnapshot::capture(&bank, true).to_json().unwrap();
        let snapshot = BankSnapshot::from_json(&json).unwrap();
        assert!(snapshot.chain_mode_enabled);
        assert_eq!(snapshot.slots[4].repeats(), 3);
        assert!(snapshot.slots[3].is_empty());

        let mut restored = PatternBank::new();
        restored.restore(snapshot.slots, 4).unwrap();
        assert!(restored.live().step(&TrackId::from("kick"), 0).unwrap());
    }

    #[test]
    fn test_wrong_slot_count_rejected() {
        let json = r#"{ "slots": [], "current_slot_index": 0 }"#;
        let err = BankSnapshot::from_json(json).unwrap_err();
        assert!(matches!(err, StepchainError::SlotCount { found: 0, expected: 10 }));
    }

    #[test]
    fn test_bad_current_index_rejected() {
        let mut snapshot = BankSnapshot::capture(&PatternBank::new(), false);
        snapshot.current_slot_index = 10;
        assert!(snapshot.validate().unwrap_err().is_invalid_index());
    }

    #[test]
    fn test_import_normalizes_patterns() {
        let slot = r#"{ "pattern": { "step_count": 99, "tempo": 250, "time_signature": "12/8",
            "tracks": { "hat": [true, false, true] } }, "repeats": 40 }"#;
        let slots = vec![slot; NUM_SLOTS].join(",");
        let json = format!(r#"{{ "slots": [{slots}] }}"#);

        let snapshot = BankSnapshot::from_json(&json).unwrap();
        let slot = &snapshot.slots[0];
        assert_eq!(slot.pattern().step_count(), MAX_STEPS);
        assert_eq!(slot.pattern().tempo(), MAX_TEMPO);
        assert_eq!(slot.pattern().track(&TrackId::from("hat")).map(<[bool]>::len), Some(MAX_STEPS));
        assert!(!slot.is_empty());
        assert_eq!(slot.repeats(), 16);

        let mut bank = PatternBank::new();
        bank.restore(snapshot.slots, 0).unwrap();
        assert_eq!(bank.slot(0).unwrap().repeats(), 16);
    }

    #[test]
    fn test_import_clamps_out_of_range_repeats() {
        let slot = |repeats: i64| format!(r#"{{ "pattern": {{ "tempo": 300 }}, "repeats": {repeats} }}"#);
        let mut slots = vec![slot(300), slot(0)];
        slots.extend((2..NUM_SLOTS).map(|_| slot(3)));
        let json = format!(r#"{{ "slots": [{}] }}"#, slots.join(","));

        let snapshot = BankSnapshot::from_json(&json).unwrap();
        assert_eq!(snapshot.slots[0].repeats(), 16);
        assert_eq!(snapshot.slots[1].repeats(), 1);
        assert_eq!(snapshot.slots[2].repeats(), 3);
        assert_eq!(snapshot.slots[0].pattern().tempo(), MAX_TEMPO);
    }

    #[test]
    fn test_missing_empty_flag_follows_content() {
        let silent = r#"{ "pattern": { "tracks": { "kick": [0, 0, 0, 0] } } }"#;
        let loud = r#"{ "pattern": { "tracks": { "kick": [1, 0, 0, 0] } } }"#;
        let saved_silent = r#"{ "pattern": {}, "is_empty": false }"#;
        let flagged_loud = r#"{ "pattern": { "tracks": { "kick": [true] } }, "is_empty": true }"#;
        let mut slots = vec![silent, loud, saved_silent, flagged_loud];
        slots.resize(NUM_SLOTS, silent);
        let json = format!(r#"{{ "slots": [{}] }}"#, slots.join(","));

        let snapshot = BankSnapshot::from_json(&json).unwrap();
        assert!(snapshot.slots[0].is_empty());
        assert!(!snapshot.slots[1].is_empty());
        assert!(!snapshot.slots[2].is_empty());
        assert!(!snapshot.slots[3].is_empty());
        assert!(snapshot.slots[9].is_empty());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(BankSnapshot::from_json("{"), Err(StepchainError::Json(_))));
    }
}
