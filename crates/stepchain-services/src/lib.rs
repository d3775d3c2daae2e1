//! stepchain-services: Clock, trigger output and the poll-tick driver

pub mod clock;
pub mod driver;
pub mod sink;

pub use clock::MonotonicClock;
pub use driver::{DriverCommand, DriverError, PlaybackDriver};
pub use sink::ChannelSink;
