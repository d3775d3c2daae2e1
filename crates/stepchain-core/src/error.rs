//! Error types for stepchain

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StepchainError {
    #[error("Slot index out of range: {0}")]
    InvalidSlot(usize),
    #[error("Step {step} outside active range 0..{step_count}")]
    InvalidStep { step: usize, step_count: usize },
    #[error("Snapshot has {found} slots, expected {expected}")]
    SlotCount { found: usize, expected: usize },
    #[error("Snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StepchainError {
    /// Index errors are routine UI races; callers decline them instead of failing
    pub fn is_invalid_index(&self) -> bool {
        matches!(self, Self::InvalidSlot(_) | Self::InvalidStep { .. })
    }
}

pub type Result<T> = std::result::Result<T, StepchainError>;
