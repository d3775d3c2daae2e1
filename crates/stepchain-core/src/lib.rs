//! stepchain-core: Step sequencer, pattern bank and chain mode

pub mod algorithms;
pub mod bank;
pub mod chain;
mod clock;
mod config;
pub mod engine;
mod error;
mod events;
pub mod pattern;
mod sink;
mod snapshot;
pub mod transport;

pub use algorithms::euclidean_rhythm;
pub use bank::{NUM_SLOTS, PatternBank, PatternSlot, PendingSwitch, SwitchOutcome};
pub use chain::{ChainDecision, ChainPlayer, ChainState};
pub use clock::{AudioClock, ManualClock};
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{Result, StepchainError};
pub use events::{EngineEvent, EventBus};
pub use pattern::{Pattern, TimeSignature, TrackId};
pub use sink::{RecordingSink, Trigger, TriggerSink};
pub use snapshot::BankSnapshot;
pub use transport::{Tick, Transport, TransportState};
