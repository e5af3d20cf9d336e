//! Lanes, notes and the looped chart generator.

use std::fmt;
use std::str::FromStr;

use crate::clock::time_of_beat;
use crate::settings::{Settings, sanitize_bpm};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Lane {
    Left,
    Down,
    Up,
    Right,
}

/// Lane order used for lane assignment and left-to-right layout.
pub const LANES: [Lane; 4] = [Lane::Left, Lane::Down, Lane::Up, Lane::Right];

/// Beat offsets of one 16-beat loop.
pub const PATTERN_BEATS: [f64; 20] = [
    0.0, 1.0, 2.0, 3.0, //
    4.0, 4.5, 5.0, 5.5, //
    6.0, 7.0, 8.0, 9.0, //
    10.0, 10.5, 11.0, 11.5, //
    12.0, 13.0, 14.0, 15.0,
];

pub const LOOP_BEATS: f64 = 16.0;

impl Lane {
    pub fn index(self) -> usize {
        match self {
            Lane::Left => 0,
            Lane::Down => 1,
            Lane::Up => 2,
            Lane::Right => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Lane::Left => "left",
            Lane::Down => "down",
            Lane::Up => "up",
            Lane::Right => "right",
        }
    }

    /// Maps a `KeyboardEvent.key` value to its lane.
    pub fn from_key(key: &str) -> Option<Lane> {
        match key {
            "ArrowLeft" => Some(Lane::Left),
            "ArrowDown" => Some(Lane::Down),
            "ArrowUp" => Some(Lane::Up),
            "ArrowRight" => Some(Lane::Right),
            _ => None,
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLaneError(pub String);

impl fmt::Display for ParseLaneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown lane '{}'", self.0)
    }
}

impl std::error::Error for ParseLaneError {}

impl FromStr for Lane {
    type Err = ParseLaneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LANES
            .iter()
            .copied()
            .find(|l| l.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseLaneError(s.to_string()))
    }
}

/// Deterministic lane for a pattern beat: `LANES[floor((beat * 7) mod 4)]`.
pub fn lane_for_beat(beat: f64) -> Lane {
    let idx = (beat * 7.0).rem_euclid(LANES.len() as f64).floor() as usize;
    LANES[idx.min(LANES.len() - 1)]
}

#[derive(Clone, Debug, PartialEq)]
pub struct Note {
    pub lane: Lane,
    /// Ideal press time in seconds.
    pub time: f64,
    pub spawn_time: f64,
    pub judged: bool,
    pub hit: bool,
}

impl Note {
    pub fn new(lane: Lane, time: f64, travel: f64) -> Self {
        Self {
            lane,
            time,
            spawn_time: time - travel,
            judged: false,
            hit: false,
        }
    }

    /// Fall progress from spawn (0) to the judgment line (1).
    pub fn progress(&self, now: f64) -> f64 {
        let span = self.time - self.spawn_time;
        if span <= 0.0 {
            return 1.0;
        }
        ((now - self.spawn_time) / span).clamp(0.0, 1.0)
    }

    pub fn is_pending(&self) -> bool {
        !self.judged
    }
}

/// Builds `loop_count` repetitions of [`PATTERN_BEATS`], repetition `k`
/// shifted by `16 * k + loop_start_beat` beats. The result is ordered by
/// judgment time.
pub fn generate(loop_start_beat: f64, loop_count: u32, bpm: f64, settings: &Settings) -> Vec<Note> {
    let bpm = sanitize_bpm(bpm);
    let mut notes = Vec::with_capacity(loop_count as usize * PATTERN_BEATS.len());
    for k in 0..loop_count {
        let offset = loop_start_beat + LOOP_BEATS * k as f64;
        for &b in PATTERN_BEATS.iter() {
            let time = time_of_beat(offset + b, bpm);
            notes.push(Note::new(lane_for_beat(b), time, settings.travel));
        }
    }
    log::debug!(
        "generated {} notes ({} loops @ {bpm} BPM, travel {}s)",
        notes.len(),
        loop_count,
        settings.travel
    );
    notes
}
