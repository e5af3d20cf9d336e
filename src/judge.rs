//! Timing judgment: nearest-note matching, the tier table and the miss sweep.
//!
//! [`judge`] and [`sweep`] are the only two places a note's `judged` flag is
//! set. Both use [`outer_window`], so a note is either matched by a press
//! inside the outer window or swept once that window has passed, never both.

use std::fmt;

use crate::chart::{Lane, Note};

/// Outer acceptance window as a multiple of the base hit window, shared by
/// [`judge`] and [`sweep`].
pub const OUTER_WINDOW_FACTOR: f64 = 1.5;

pub fn outer_window(hit_window: f64) -> f64 {
    OUTER_WINDOW_FACTOR * hit_window
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Tier {
    Sick,
    Good,
    Ok,
    Bad,
    Miss,
}

impl Tier {
    pub const ALL: [Tier; 5] = [Tier::Sick, Tier::Good, Tier::Ok, Tier::Bad, Tier::Miss];

    /// Feedback tag shown by the front end.
    pub fn tag(self) -> &'static str {
        match self {
            Tier::Sick => "SICK",
            Tier::Good => "GOOD",
            Tier::Ok => "OK",
            Tier::Bad => "BAD",
            Tier::Miss => "MISS",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn effect(self) -> TierEffect {
        match self {
            Tier::Miss => MISS_EFFECT,
            _ => TIER_TABLE
                .iter()
                .find(|rule| rule.tier == self)
                .map(|rule| rule.effect)
                .unwrap_or(MISS_EFFECT),
        }
    }

    /// True for tiers that keep the combo going.
    pub fn is_positive(self) -> bool {
        matches!(self.effect().combo, ComboEffect::Extend)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComboEffect {
    Extend,
    Break,
}

/// Scoreboard deltas attached to a tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TierEffect {
    pub score: u32,
    pub combo: ComboEffect,
    pub health: i32,
}

/// One row of the tier table: a note whose absolute error is `<= threshold(window)`
/// lands in `tier`, unless an earlier row already matched.
pub struct TierRule {
    pub tier: Tier,
    pub threshold: fn(f64) -> f64,
    pub effect: TierEffect,
}

pub const MISS_EFFECT: TierEffect = TierEffect {
    score: 0,
    combo: ComboEffect::Break,
    health: -7,
};

/// Ordered by ascending threshold; scanned top to bottom.
pub static TIER_TABLE: [TierRule; 4] = [
    TierRule {
        tier: Tier::Sick,
        threshold: |w| f64::min(0.06, 0.33 * w),
        effect: TierEffect {
            score: 400,
            combo: ComboEffect::Extend,
            health: 4,
        },
    },
    TierRule {
        tier: Tier::Good,
        threshold: |w| f64::min(0.12, 0.66 * w),
        effect: TierEffect {
            score: 260,
            combo: ComboEffect::Extend,
            health: 2,
        },
    },
    TierRule {
        tier: Tier::Ok,
        threshold: |w| w,
        effect: TierEffect {
            score: 150,
            combo: ComboEffect::Extend,
            health: 1,
        },
    },
    TierRule {
        tier: Tier::Bad,
        threshold: outer_window,
        effect: TierEffect {
            score: 40,
            combo: ComboEffect::Break,
            health: -3,
        },
    },
];

/// Tier for an absolute timing error against `hit_window`.
pub fn classify(distance: f64, hit_window: f64) -> Tier {
    let distance = distance.abs();
    TIER_TABLE
        .iter()
        .find(|rule| distance <= (rule.threshold)(hit_window))
        .map(|rule| rule.tier)
        .unwrap_or(Tier::Miss)
}

/// Result of one lane press.
#[derive(Clone, Debug, PartialEq)]
pub struct Judgment {
    pub tier: Tier,
    pub lane: Lane,
    /// Index of the matched note, `None` for an empty-lane or out-of-window miss.
    pub note: Option<usize>,
    /// Absolute distance to the matched note in seconds (0 when unmatched).
    pub distance: f64,
}

/// Index and distance of the unjudged note in `lane` closest to `now`.
/// On ties the earliest note in chart order wins.
pub fn nearest_pending(notes: &[Note], lane: Lane, now: f64) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, note) in notes.iter().enumerate() {
        if note.lane != lane || note.judged {
            continue;
        }
        let dt = (note.time - now).abs();
        match best {
            Some((_, best_dt)) if dt >= best_dt => {}
            _ => best = Some((idx, dt)),
        }
    }
    best
}

/// Judges a press in `lane` at `now`. Marks the matched note judged/hit;
/// leaves every note untouched on a miss.
pub fn judge(notes: &mut [Note], lane: Lane, now: f64, hit_window: f64) -> Judgment {
    let miss = Judgment {
        tier: Tier::Miss,
        lane,
        note: None,
        distance: 0.0,
    };
    let Some((idx, distance)) = nearest_pending(notes, lane, now) else {
        return miss;
    };
    if distance > outer_window(hit_window) {
        return miss;
    }
    let note = &mut notes[idx];
    note.judged = true;
    note.hit = true;
    Judgment {
        tier: classify(distance, hit_window),
        lane,
        note: Some(idx),
        distance,
    }
}

/// Resolves every unjudged note whose outer window closed before `now` as a
/// miss. Returns the indices resolved in this pass.
pub fn sweep(notes: &mut [Note], now: f64, hit_window: f64) -> Vec<usize> {
    let limit = outer_window(hit_window);
    let mut missed = Vec::new();
    for (idx, note) in notes.iter_mut().enumerate() {
        if !note.judged && now - note.time > limit {
            note.judged = true;
            note.hit = false;
            missed.push(idx);
        }
    }
    missed
}
