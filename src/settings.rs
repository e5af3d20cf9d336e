//! Difficulty presets, tempo limits and session configuration.

use std::fmt;
use std::str::FromStr;

pub const DEFAULT_BPM: f64 = 120.0;
pub const MIN_BPM: f64 = 40.0;
pub const MAX_BPM: f64 = 300.0;

/// Song length the director scores, in beats.
pub const DEFAULT_TOTAL_BEATS: u32 = 96;
/// Chart loops generated per session (16 beats each).
pub const DEFAULT_LOOPS: u32 = 6;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

/// Travel time and hit window for one difficulty. Always replaced as a whole.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Settings {
    /// Seconds a note spends falling from spawn to the judgment line.
    pub travel: f64,
    /// Radius (seconds) of the base OK window around judgment time.
    pub hit_window: f64,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];

    pub fn settings(self) -> Settings {
        match self {
            Difficulty::Easy => Settings {
                travel: 2.4,
                hit_window: 0.26,
            },
            Difficulty::Normal => Settings {
                travel: 1.8,
                hit_window: 0.18,
            },
            Difficulty::Hard => Settings {
                travel: 1.0,
                hit_window: 0.12,
            },
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Difficulty::default().settings()
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDifficultyError(pub String);

impl fmt::Display for ParseDifficultyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown difficulty '{}' (expected easy, normal or hard)", self.0)
    }
}

impl std::error::Error for ParseDifficultyError {}

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ParseDifficultyError(s.to_string())),
        }
    }
}

/// Makes a tempo safe to divide by. Non-finite input falls back to
/// [`DEFAULT_BPM`], anything else is clamped into `[MIN_BPM, MAX_BPM]`.
pub fn sanitize_bpm(bpm: f64) -> f64 {
    if !bpm.is_finite() {
        log::warn!("non-finite tempo {bpm}, using {DEFAULT_BPM} BPM");
        return DEFAULT_BPM;
    }
    let clamped = bpm.clamp(MIN_BPM, MAX_BPM);
    if clamped != bpm {
        log::warn!("tempo {bpm} BPM out of range, clamped to {clamped}");
    }
    clamped
}

/// Everything a session needs to know before it starts.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GameConfig {
    pub difficulty: Difficulty,
    pub bpm: f64,
    pub loops: u32,
    pub total_beats: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal,
            bpm: DEFAULT_BPM,
            loops: DEFAULT_LOOPS,
            total_beats: DEFAULT_TOTAL_BEATS,
        }
    }
}

impl GameConfig {
    #[cfg(feature = "serde_json")]
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut cfg: GameConfig = serde_json::from_str(json)?;
        cfg.bpm = sanitize_bpm(cfg.bpm);
        Ok(cfg)
    }
}
