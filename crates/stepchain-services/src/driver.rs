//! Poll-tick driver: runs an `Engine` on its own thread

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, select, tick, unbounded, Receiver, Sender};
use stepchain_core::{BankSnapshot, Engine, EngineEvent, StepchainError, TimeSignature, TrackId};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Driver thread not running")]
    Disconnected,
    #[error("Failed to spawn driver thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("Driver thread panicked")]
    Panicked,
}

/// Engine operations that can be issued from any thread
#[derive(Debug, Clone)]
pub enum DriverCommand {
    Play,
    Pause,
    Stop,
    SetTempo(u32),
    SetStepCount(usize),
    SetTimeSignature(TimeSignature),
    SetStep { track: TrackId, step: usize, on: bool },
    ToggleStep { track: TrackId, step: usize },
    ClearTrack(TrackId),
    ClearAll,
    FillEuclidean { track: TrackId, pulses: usize, rotation: usize },
    SaveToSlot(usize),
    SwitchTo(usize),
    CancelQueuedSwitch,
    ClearSlot(usize),
    SetRepeats { slot: usize, repeats: u32 },
    CopySlot { from: usize, to: usize },
    SetChainMode(bool),
    StartChain,
    StopChain,
    Import(BankSnapshot),
}

enum Message {
    Command(DriverCommand),
    Export(Sender<BankSnapshot>),
    Subscribe(Sender<Receiver<EngineEvent>>),
    Shutdown,
}

/// Handle to the driver thread. Dropping it stops playback and joins.
pub struct PlaybackDriver {
    sender: Sender<Message>,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl PlaybackDriver {
    /// Move `engine` onto a new thread that polls it every
    /// `poll_interval_ms` and applies commands between polls
    pub fn spawn(engine: Engine) -> Result<Self, DriverError> {
        let (sender, receiver) = unbounded();
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let thread = thread::Builder::new()
            .name("stepchain-poll".into())
            .spawn(move || {
                driver_loop(engine, receiver);
                running_clone.store(false, Ordering::SeqCst);
            })?;

        Ok(Self {
            sender,
            running,
            thread: Some(thread),
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn send(&self, command: DriverCommand) -> Result<(), DriverError> {
        self.sender
            .send(Message::Command(command))
            .map_err(|_| DriverError::Disconnected)
    }

    pub fn play(&self) -> Result<(), DriverError> {
        self.send(DriverCommand::Play)
    }

    pub fn pause(&self) -> Result<(), DriverError> {
        self.send(DriverCommand::Pause)
    }

    pub fn stop(&self) -> Result<(), DriverError> {
        self.send(DriverCommand::Stop)
    }

    /// Snapshot of the bank after every command sent so far has applied
    pub fn export_snapshot(&self) -> Result<BankSnapshot, DriverError> {
        let (tx, rx) = bounded(1);
        self.sender
            .send(Message::Export(tx))
            .map_err(|_| DriverError::Disconnected)?;
        rx.recv().map_err(|_| DriverError::Disconnected)
    }

    pub fn subscribe(&self) -> Result<Receiver<EngineEvent>, DriverError> {
        let (tx, rx) = bounded(1);
        self.sender
            .send(Message::Subscribe(tx))
            .map_err(|_| DriverError::Disconnected)?;
        rx.recv().map_err(|_| DriverError::Disconnected)
    }

    /// Stop playback and wait for the thread to exit
    pub fn shutdown(mut self) -> Result<(), DriverError> {
        self.join()
    }

    fn join(&mut self) -> Result<(), DriverError> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };
        let _ = self.sender.send(Message::Shutdown);
        thread.join().map_err(|_| DriverError::Panicked)
    }
}

impl Drop for PlaybackDriver {
    fn drop(&mut self) {
        if let Err(e) = self.join() {
            warn!(error = %e, "Driver shutdown failed");
        }
    }
}

fn driver_loop(mut engine: Engine, receiver: Receiver<Message>) {
    let ticker = tick(engine.config().poll_interval());
    info!(interval_ms = engine.config().poll_interval_ms, "Driver started");

    loop {
        select! {
            recv(receiver) -> message => match message {
                Ok(Message::Command(command)) => {
                    let poll_now = matches!(command, DriverCommand::Play | DriverCommand::StartChain);
                    if let Err(e) = apply(&mut engine, command) {
                        warn!(error = %e, "Command declined");
                    }
                    // Commit the first steps without waiting for the next tick
                    if poll_now {
                        engine.poll();
                    }
                }
                Ok(Message::Export(reply)) => {
                    let _ = reply.send(engine.export_snapshot());
                }
                Ok(Message::Subscribe(reply)) => {
                    let _ = reply.send(engine.subscribe());
                }
                Ok(Message::Shutdown) | Err(_) => break,
            },
            recv(ticker) -> _ => {
                engine.poll();
            }
        }
    }

    engine.stop();
    info!("Driver stopped");
}

fn apply(engine: &mut Engine, command: DriverCommand) -> Result<(), StepchainError> {
    debug!(?command, "Applying command");
    match command {
        DriverCommand::Play => {
            engine.play();
        }
        DriverCommand::Pause => {
            engine.pause();
        }
        DriverCommand::Stop => {
            engine.stop();
        }
        DriverCommand::SetTempo(bpm) => {
            engine.set_tempo(bpm);
        }
        DriverCommand::SetStepCount(steps) => {
            engine.set_step_count(steps);
        }
        DriverCommand::SetTimeSignature(time_signature) => engine.set_time_signature(time_signature),
        DriverCommand::SetStep { track, step, on } => engine.set_step(track, step, on)?,
        DriverCommand::ToggleStep { track, step } => {
            engine.toggle_step(track, step)?;
        }
        DriverCommand::ClearTrack(track) => {
            engine.clear_track(&track);
        }
        DriverCommand::ClearAll => engine.clear_all(),
        DriverCommand::FillEuclidean { track, pulses, rotation } => {
            engine.fill_euclidean(track, pulses, rotation)
        }
        DriverCommand::SaveToSlot(slot) => engine.save_current_to_slot(slot)?,
        DriverCommand::SwitchTo(slot) => {
            engine.switch_to(slot)?;
        }
        DriverCommand::CancelQueuedSwitch => {
            engine.cancel_queued_switch();
        }
        DriverCommand::ClearSlot(slot) => engine.clear_slot(slot)?,
        DriverCommand::SetRepeats { slot, repeats } => {
            engine.set_repeats(slot, repeats)?;
        }
        DriverCommand::CopySlot { from, to } => engine.copy_slot(from, to)?,
        DriverCommand::SetChainMode(enabled) => engine.set_chain_mode(enabled),
        DriverCommand::StartChain => {
            engine.start_chain();
        }
        DriverCommand::StopChain => engine.stop_chain(),
        DriverCommand::Import(snapshot) => engine.import_snapshot(snapshot)?,
    }
    Ok(())
}
