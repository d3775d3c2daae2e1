//! Step grid for one bar

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::algorithms::euclidean_rhythm;
use crate::error::{Result, StepchainError};

pub const MIN_STEPS: usize = 4;
pub const MAX_STEPS: usize = 48;
pub const DEFAULT_STEPS: usize = 16;

pub const MIN_TEMPO: u32 = 60;
/// Enforced ceiling. Older product copy advertised 200 BPM; nothing above 180 is accepted.
pub const MAX_TEMPO: u32 = 180;
pub const DEFAULT_TEMPO: u32 = 120;

/// Track ids with this prefix fire the one-shot sample sink
pub const SAMPLE_TRACK_PREFIX: &str = "sample-";

/// Identifier for one row of the grid (an instrument or a sample slot)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Track bound to a one-shot sample slot
    pub fn sample(slot: u8) -> Self {
        Self(format!("{SAMPLE_TRACK_PREFIX}{slot}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Sample slot for `sample-<n>` ids, `None` for instrument tracks
    pub fn sample_slot(&self) -> Option<u8> {
        self.0.strip_prefix(SAMPLE_TRACK_PREFIX)?.parse().ok()
    }
}

impl From<&str> for TrackId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TrackId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Meter of a pattern. Only affects visual grouping, never scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeSignature {
    #[default]
    #[serde(rename = "4/4")]
    FourFour,
    #[serde(rename = "3/4")]
    ThreeFour,
    #[serde(rename = "12/8")]
    TwelveEight,
}

/// Clamp a requested step count into the supported range
pub fn clamp_step_count(steps: usize) -> usize {
    steps.clamp(MIN_STEPS, MAX_STEPS)
}

/// Clamp a requested tempo into the supported range
pub fn clamp_tempo(bpm: u32) -> u32 {
    bpm.clamp(MIN_TEMPO, MAX_TEMPO)
}

/// Duration of one sixteenth-note step in seconds
pub fn step_duration(bpm: u32) -> f64 {
    60.0 / (4.0 * bpm as f64)
}

/// Serialized shape of a pattern; converted through `Pattern` so every
/// deserialized value is clamped and padded.
#[derive(Serialize, Deserialize)]
struct PatternData {
    #[serde(default)]
    tracks: BTreeMap<TrackId, Vec<StepValue>>,
    #[serde(default = "default_tempo")]
    tempo: u32,
    #[serde(default)]
    time_signature: TimeSignature,
    #[serde(default = "default_steps")]
    step_count: usize,
}

/// A stored step: `true`/`false` or `1`/`0`. Written back as booleans.
#[derive(Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
enum StepValue {
    Flag(bool),
    Level(u8),
}

impl StepValue {
    fn is_on(self) -> bool {
        match self {
            Self::Flag(on) => on,
            Self::Level(level) => level > 0,
        }
    }
}

fn default_tempo() -> u32 {
    DEFAULT_TEMPO
}

fn default_steps() -> usize {
    DEFAULT_STEPS
}

/// One bar of steps for any number of tracks.
///
/// Every track always stores `MAX_STEPS` values so resizing the active
/// `step_count` never discards hits. Reads and writes are limited to
/// `0..step_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PatternData", into = "PatternData")]
pub struct Pattern {
    step_count: usize,
    tempo: u32,
    time_signature: TimeSignature,
    tracks: BTreeMap<TrackId, Vec<bool>>,
}

impl Default for Pattern {
    fn default() -> Self {
        Self {
            step_count: DEFAULT_STEPS,
            tempo: DEFAULT_TEMPO,
            time_signature: TimeSignature::default(),
            tracks: BTreeMap::new(),
        }
    }
}

impl From<PatternData> for Pattern {
    fn from(data: PatternData) -> Self {
        let tracks = data
            .tracks
            .into_iter()
            .map(|(id, steps)| {
                let mut steps: Vec<bool> = steps.into_iter().map(StepValue::is_on).collect();
                steps.resize(MAX_STEPS, false);
                (id, steps)
            })
            .collect();

        Self {
            step_count: clamp_step_count(data.step_count),
            tempo: clamp_tempo(data.tempo),
            time_signature: data.time_signature,
            tracks,
        }
    }
}

impl From<Pattern> for PatternData {
    fn from(pattern: Pattern) -> Self {
        let tracks = pattern
            .tracks
            .into_iter()
            .map(|(id, steps)| (id, steps.into_iter().map(StepValue::Flag).collect()))
            .collect();

        Self {
            tracks,
            tempo: pattern.tempo,
            time_signature: pattern.time_signature,
            step_count: pattern.step_count,
        }
    }
}

impl Pattern {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty pattern with the given tracks registered
    pub fn with_tracks<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TrackId>,
    {
        let mut pattern = Self::default();
        for id in ids {
            pattern.add_track(id);
        }
        pattern
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// Resize the active step range, returning the applied (clamped) count.
    /// Stored hits beyond the new range are kept.
    pub fn set_step_count(&mut self, steps: usize) -> usize {
        self.step_count = clamp_step_count(steps);
        self.step_count
    }

    pub fn tempo(&self) -> u32 {
        self.tempo
    }

    /// Set tempo in BPM, returning the applied (clamped) value
    pub fn set_tempo(&mut self, bpm: u32) -> u32 {
        self.tempo = clamp_tempo(bpm);
        self.tempo
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    pub fn set_time_signature(&mut self, time_signature: TimeSignature) {
        self.time_signature = time_signature;
    }

    /// Sixteenth-note duration at this pattern's tempo, in seconds
    pub fn step_duration(&self) -> f64 {
        step_duration(self.tempo)
    }

    /// Register a track; returns false if it already existed
    pub fn add_track(&mut self, id: impl Into<TrackId>) -> bool {
        let id = id.into();
        if self.tracks.contains_key(&id) {
            return false;
        }
        self.tracks.insert(id, vec![false; MAX_STEPS]);
        true
    }

    pub fn remove_track(&mut self, id: &TrackId) -> bool {
        self.tracks.remove(id).is_some()
    }

    pub fn track_ids(&self) -> impl Iterator<Item = &TrackId> {
        self.tracks.keys()
    }

    /// Full stored row (always `MAX_STEPS` long)
    pub fn track(&self, id: &TrackId) -> Option<&[bool]> {
        self.tracks.get(id).map(Vec::as_slice)
    }

    fn check_step(&self, step: usize) -> Result<()> {
        if step >= self.step_count {
            return Err(StepchainError::InvalidStep {
                step,
                step_count: self.step_count,
            });
        }
        Ok(())
    }

    fn row_mut(&mut self, id: TrackId) -> &mut Vec<bool> {
        self.tracks.entry(id).or_insert_with(|| vec![false; MAX_STEPS])
    }

    /// Read one step. Unknown tracks read as off.
    pub fn step(&self, id: &TrackId, step: usize) -> Result<bool> {
        self.check_step(step)?;
        Ok(self.tracks.get(id).is_some_and(|row| row[step]))
    }

    /// Write one step, registering the track if needed
    pub fn set_step(&mut self, id: impl Into<TrackId>, step: usize, on: bool) -> Result<()> {
        self.check_step(step)?;
        self.row_mut(id.into())[step] = on;
        Ok(())
    }

    /// Flip one step and return its new value
    pub fn toggle_step(&mut self, id: impl Into<TrackId>, step: usize) -> Result<bool> {
        self.check_step(step)?;
        let row = self.row_mut(id.into());
        row[step] = !row[step];
        Ok(row[step])
    }

    /// Turn every step of one track off; returns false for unknown tracks
    pub fn clear_track(&mut self, id: &TrackId) -> bool {
        match self.tracks.get_mut(id) {
            Some(row) => {
                row.fill(false);
                true
            }
            None => false,
        }
    }

    /// Turn every step of every track off, keeping the tracks registered
    pub fn clear_all(&mut self) {
        for row in self.tracks.values_mut() {
            row.fill(false);
        }
    }

    /// Overwrite the active range of a track with a Euclidean distribution
    pub fn fill_euclidean(&mut self, id: impl Into<TrackId>, pulses: usize, rotation: usize) {
        let steps = self.step_count;
        let rhythm = euclidean_rhythm(steps, pulses, rotation);
        self.row_mut(id.into())[..steps].copy_from_slice(&rhythm);
    }

    /// Tracks with a hit at `step`; nothing outside the active range
    pub fn active_tracks_at(&self, step: usize) -> impl Iterator<Item = &TrackId> {
        let in_range = step < self.step_count;
        self.tracks
            .iter()
            .filter(move |(_, row)| in_range && row[step])
            .map(|(id, _)| id)
    }

    /// Number of audible hits across all tracks
    pub fn hit_count(&self) -> usize {
        self.tracks
            .values()
            .map(|row| row[..self.step_count].iter().filter(|&&on| on).count())
            .sum()
    }

    /// Whether any track has a hit inside the active range
    pub fn has_active_steps(&self) -> bool {
        self.tracks.values().any(|row| row[..self.step_count].contains(&true))
    }
}
