//! Genesis Rhythm core crate.
//!
//! A four-lane falling-note minigame for the browser. The game core (chart
//! generation, judging, miss sweep, scoring and the song director) is plain Rust
//! and runs natively under `cargo test`. The browser glue and [`render`] bind it
//! to a canvas, the DOM and Web Audio through `wasm-bindgen`.

use wasm_bindgen::prelude::*;

pub mod audio;
pub mod cast;
pub mod chart;
pub mod clock;
pub mod director;
pub mod feedback;
pub mod judge;
pub mod score;
pub mod session;
pub mod settings;

mod app;
pub mod render;

pub use app::{press_lane, set_bpm, set_difficulty, start_game, stop_game};
#[cfg(feature = "serde_json")]
pub use app::start_game_with_config;
pub use audio::{AudioSink, Cue, SilentSink, Waveform};
pub use chart::{Lane, Note};
pub use judge::{Judgment, Tier};
pub use session::{Session, SessionState};
pub use settings::{Difficulty, GameConfig, Settings};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    // A second init (e.g. module re-instantiated) just keeps the first logger.
    let _ = console_log::init_with_level(log::Level::Debug);
}
