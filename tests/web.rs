// Browser smoke tests, run with `wasm-pack test --headless --firefox`.
#![cfg(target_arch = "wasm32")]

use genesis_rhythm::{Difficulty, GameConfig, Lane, Session, SilentSink, Tier};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn session_judges_in_the_browser() {
    let mut s = Session::new(GameConfig {
        difficulty: Difficulty::Easy,
        ..GameConfig::default()
    });
    s.start(&SilentSink);
    let j = s.press_lane(Lane::Left, &mut SilentSink).unwrap();
    assert_eq!(j.tier, Tier::Sick);
}

#[wasm_bindgen_test]
fn exports_accept_input_before_start() {
    genesis_rhythm::set_bpm(140.0);
    assert!(genesis_rhythm::set_difficulty("hard").is_ok());
    assert!(genesis_rhythm::set_difficulty("impossible").is_err());
    assert!(!genesis_rhythm::press_lane("up"));
    assert!(!genesis_rhythm::press_lane("sideways"));
}
