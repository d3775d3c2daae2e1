//! stepchain: plays a pattern bank in chain mode and logs what it schedules

mod config;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel::select;
use stepchain_core::{BankSnapshot, Engine, EngineEvent, PatternBank};
use stepchain_services::{ChannelSink, DriverCommand, MonotonicClock, PlaybackDriver};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_BARS: u64 = 8;
const TRIGGER_BUFFER: usize = 1024;
const IDLE_TIMEOUT: Duration = Duration::from_secs(2);

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("stepchain=debug".parse()?))
        .init();

    let config = config::load_config();
    let mut args = std::env::args().skip(1);
    let session = args.next().map(PathBuf::from).or(config.session.path);
    let bars = match args.next() {
        Some(arg) => arg.parse().with_context(|| format!("Bar count must be a number, got {arg:?}"))?,
        None => DEFAULT_BARS,
    };

    let snapshot = match &session {
        Some(path) => load_session(path)?,
        None => demo_bank()?,
    };

    info!(?session, bars, "Starting stepchain");

    let (sink, triggers) = ChannelSink::bounded(TRIGGER_BUFFER);
    let mut engine = Engine::new(Box::new(MonotonicClock::new()), Box::new(sink), config.engine);
    let events = engine.subscribe();
    engine.import_snapshot(snapshot)?;

    let driver = PlaybackDriver::spawn(engine)?;
    driver.send(DriverCommand::StartChain)?;

    loop {
        select! {
            recv(events) -> event => match event {
                Ok(EngineEvent::BarCompleted { bar, .. }) if bar >= bars => break,
                Ok(EngineEvent::ChainCompleted) => {
                    info!("Chain finished");
                    break;
                }
                Ok(EngineEvent::StepTriggered { .. }) => {}
                Ok(event) => info!(?event, "Engine event"),
                Err(_) => break,
            },
            recv(triggers) -> trigger => {
                if let Ok(trigger) = trigger {
                    info!(track = %trigger.track_id(), at = trigger.at(), "Trigger");
                }
            },
            default(IDLE_TIMEOUT) => {
                warn!("Nothing scheduled, is any slot populated?");
                break;
            }
        }
    }

    driver.shutdown()?;
    Ok(())
}

fn load_session(path: &Path) -> Result<BankSnapshot> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read session {}", path.display()))?;
    let snapshot = BankSnapshot::from_json(&json)
        .with_context(|| format!("Invalid session {}", path.display()))?;
    Ok(snapshot)
}

/// Three slots of Euclidean grooves, chained
fn demo_bank() -> Result<BankSnapshot> {
    let mut bank = PatternBank::new();
    let grooves: [(&[(&str, usize, usize)], u32); 3] = [
        (&[("kick", 4, 0), ("hat", 8, 1)], 2),
        (&[("kick", 3, 0), ("snare", 2, 4), ("sample-0", 5, 2)], 1),
        (&[("kick", 5, 0), ("hat", 11, 0)], 1),
    ];

    for (slot, (tracks, repeats)) in grooves.iter().enumerate() {
        let live = bank.live_mut();
        live.clear_all();
        for &(track, pulses, rotation) in tracks.iter() {
            live.fill_euclidean(track, pulses, rotation);
        }
        bank.save_current_to_slot(slot)?;
        bank.set_repeats(slot, *repeats)?;
    }

    Ok(BankSnapshot::capture(&bank, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_bank_chains_three_slots() {
        let snapshot = demo_bank().unwrap();
        assert!(snapshot.chain_mode_enabled);
        let populated: Vec<usize> = snapshot
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.has_content())
            .map(|(index, _)| index)
            .collect();
        assert_eq!(populated, vec![0, 1, 2]);
        assert_eq!(snapshot.slots[0].repeats(), 2);
        assert_eq!(snapshot.slots[1].pattern().hit_count(), 10);
    }
}
