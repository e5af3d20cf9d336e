//! Score, combo and health bookkeeping.

use crate::judge::{ComboEffect, Tier};

pub const MAX_HEALTH: i32 = 100;

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Scoreboard {
    pub score: u64,
    pub combo: u32,
    pub max_combo: u32,
    /// Always within `0..=MAX_HEALTH`.
    pub health: i32,
    /// Judgment counts indexed by [`Tier::index`].
    pub tier_counts: [u32; 5],
}

impl Default for Scoreboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Scoreboard {
    pub fn new() -> Self {
        Self {
            score: 0,
            combo: 0,
            max_combo: 0,
            health: MAX_HEALTH,
            tier_counts: [0; 5],
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Applies the tier's deltas and returns the health left afterwards.
    pub fn apply(&mut self, tier: Tier) -> i32 {
        let effect = tier.effect();
        self.score = self.score.saturating_add(effect.score as u64);
        match effect.combo {
            ComboEffect::Extend => {
                self.combo = self.combo.saturating_add(1);
                self.max_combo = self.max_combo.max(self.combo);
            }
            ComboEffect::Break => self.combo = 0,
        }
        self.health = (self.health + effect.health).clamp(0, MAX_HEALTH);
        self.tier_counts[tier.index()] += 1;
        self.health
    }

    pub fn is_depleted(&self) -> bool {
        self.health <= 0
    }

    pub fn count(&self, tier: Tier) -> u32 {
        self.tier_counts[tier.index()]
    }

    /// Share of resolved notes that were not misses, in percent. Empty-lane
    /// presses count as misses too.
    pub fn hit_rate(&self) -> f64 {
        let total: u32 = self.tier_counts.iter().sum();
        if total == 0 {
            return 0.0;
        }
        let misses = self.count(Tier::Miss);
        (total - misses) as f64 / total as f64 * 100.0
    }
}
