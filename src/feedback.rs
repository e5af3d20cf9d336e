//! Short-lived judgment flashes rendered above the lane targets.

use crate::chart::Lane;
use crate::judge::Tier;

pub const HIT_FX_SECS: f64 = 0.6;
pub const MISS_FX_SECS: f64 = 0.8;

#[derive(Clone, Debug, PartialEq)]
pub struct Feedback {
    pub tier: Tier,
    pub lane: Lane,
    pub age: f64,
    pub lifetime: f64,
}

impl Feedback {
    pub fn new(tier: Tier, lane: Lane) -> Self {
        let lifetime = if tier == Tier::Miss { MISS_FX_SECS } else { HIT_FX_SECS };
        Self {
            tier,
            lane,
            age: 0.0,
            lifetime,
        }
    }

    /// Opacity for fade-out, 1 when fresh and 0 when expired.
    pub fn alpha(&self) -> f64 {
        (1.0 - self.age / self.lifetime).clamp(0.0, 1.0)
    }

    pub fn remaining(&self) -> f64 {
        (self.lifetime - self.age).max(0.0)
    }

    pub fn expired(&self) -> bool {
        self.age >= self.lifetime
    }
}

/// Ages every flash by `dt` and drops the expired ones.
pub fn update(effects: &mut Vec<Feedback>, dt: f64) {
    for fx in effects.iter_mut() {
        fx.age += dt;
    }
    effects.retain(|fx| !fx.expired());
}
