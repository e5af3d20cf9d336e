//! On-stage characters: visibility flags and the small timers that animate them.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Actor {
    /// Lead, always on stage.
    Sonic,
    /// Mid-song duet partner.
    Tails,
    /// Finale guests.
    Knuckles,
    Amy,
}

impl Actor {
    pub const ALL: [Actor; 4] = [Actor::Sonic, Actor::Tails, Actor::Knuckles, Actor::Amy];
    pub const GUESTS: [Actor; 3] = [Actor::Tails, Actor::Knuckles, Actor::Amy];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Idle bob speed in animation units per second.
const ANIM_SPEED: f64 = 6.0;
const ANIM_MAX: f64 = 3.0;
/// Per-frame chance that the lead strikes a taunt pose on its own.
const TAUNT_CHANCE: f64 = 0.005;
const RANDOM_TAUNT_SECS: f64 = 0.6;

#[derive(Clone, Debug, PartialEq)]
pub struct ActorState {
    pub active: bool,
    pub anim: f64,
    pub anim_dir: f64,
    /// Counts down after an entrance; the renderer slides the sprite in while > 0.
    pub entrance_timer: f64,
    pub taunt_timer: f64,
}

impl ActorState {
    fn new(active: bool) -> Self {
        Self {
            active,
            anim: 0.0,
            anim_dir: 1.0,
            entrance_timer: 0.0,
            taunt_timer: 0.0,
        }
    }

    fn animate(&mut self, dt: f64) {
        self.anim += self.anim_dir * dt * ANIM_SPEED;
        if self.anim > ANIM_MAX || self.anim < 0.0 {
            self.anim_dir = -self.anim_dir;
            self.anim = self.anim.clamp(0.0, ANIM_MAX);
        }
        if self.entrance_timer > 0.0 {
            self.entrance_timer = (self.entrance_timer - dt).max(0.0);
        }
        if self.taunt_timer > 0.0 {
            self.taunt_timer = (self.taunt_timer - dt).max(0.0);
        }
    }

    pub fn taunting(&self) -> bool {
        self.taunt_timer > 0.0
    }
}

/// Xorshift64 generator for the lead's random taunts.
#[derive(Clone, Debug)]
pub struct TauntRng(u64);

impl TauntRng {
    pub fn seeded(seed: u64) -> Self {
        Self(if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed })
    }

    #[cfg(feature = "rng")]
    pub fn from_entropy() -> Self {
        let mut buf = [0u8; 8];
        match getrandom::getrandom(&mut buf) {
            Ok(()) => Self::seeded(u64::from_le_bytes(buf)),
            Err(e) => {
                log::warn!("getrandom failed ({e}), using fixed taunt seed");
                Self::default()
            }
        }
    }

    #[cfg(not(feature = "rng"))]
    pub fn from_entropy() -> Self {
        Self::default()
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        (x >> 11) as f64 / (1u64 << 53) as f64
    }
}

impl Default for TauntRng {
    fn default() -> Self {
        Self::seeded(0x5EED_CAFE_F00D_BEEF)
    }
}

#[derive(Clone, Debug)]
pub struct Cast {
    actors: [ActorState; 4],
    pub finale: bool,
    rng: TauntRng,
}

impl Default for Cast {
    fn default() -> Self {
        Self::new(TauntRng::default())
    }
}

impl Cast {
    pub fn new(rng: TauntRng) -> Self {
        Self {
            actors: [
                ActorState::new(true),
                ActorState::new(false),
                ActorState::new(false),
                ActorState::new(false),
            ],
            finale: false,
            rng,
        }
    }

    /// Back to the opening line-up: lead only, no finale.
    pub fn reset(&mut self) {
        for actor in Actor::ALL {
            self.actors[actor.index()] = ActorState::new(actor == Actor::Sonic);
        }
        self.finale = false;
    }

    pub fn get(&self, actor: Actor) -> &ActorState {
        &self.actors[actor.index()]
    }

    pub fn is_active(&self, actor: Actor) -> bool {
        self.get(actor).active
    }

    pub fn show(&mut self, actor: Actor, entrance: f64) {
        let st = &mut self.actors[actor.index()];
        st.active = true;
        st.entrance_timer = entrance;
    }

    pub fn hide(&mut self, actor: Actor) {
        let st = &mut self.actors[actor.index()];
        st.active = false;
        st.entrance_timer = 0.0;
    }

    pub fn taunt(&mut self, actor: Actor, secs: f64) {
        self.actors[actor.index()].taunt_timer = secs;
    }

    pub fn update(&mut self, dt: f64) {
        for st in self.actors.iter_mut().filter(|st| st.active) {
            st.animate(dt);
        }
        if self.rng.next_f64() < TAUNT_CHANCE {
            self.taunt(Actor::Sonic, RANDOM_TAUNT_SECS);
        }
    }
}
