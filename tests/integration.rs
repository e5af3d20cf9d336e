// Integration tests (native) for the `genesis-rhythm` crate.
// These tests avoid wasm-specific functionality and drive the game core through
// its public API so they can run under `cargo test` on the host.

use std::collections::HashSet;

use genesis_rhythm::cast::{Actor, TauntRng};
use genesis_rhythm::chart::{self, Lane, Note};
use genesis_rhythm::judge::{self, Tier, outer_window};
use genesis_rhythm::score::{MAX_HEALTH, Scoreboard};
use genesis_rhythm::{AudioSink, Cue, Difficulty, GameConfig, Session, SessionState, Settings};

/// Remembers every cue it is handed.
#[derive(Default)]
struct RecordingSink {
    cues: Vec<Cue>,
}

impl AudioSink for RecordingSink {
    fn is_available(&self) -> bool {
        true
    }

    fn play(&mut self, cue: &Cue) {
        self.cues.push(*cue);
    }
}

/// A browser without Web Audio.
struct NoAudio;

impl AudioSink for NoAudio {
    fn is_available(&self) -> bool {
        false
    }

    fn play(&mut self, _cue: &Cue) {
        panic!("cue sent to an unavailable sink");
    }
}

fn session(config: GameConfig) -> Session {
    Session::with_rng(config, TauntRng::seeded(42))
}

// Presses every pending note that lands exactly on the current time. At 120 BPM
// every chart time is a multiple of 0.25s, so a 0.25s step hits them dead on.
fn press_due(s: &mut Session, sink: &mut RecordingSink) {
    let now = s.time();
    let due: Vec<Lane> = s
        .notes()
        .iter()
        .filter(|n| n.is_pending() && n.time == now)
        .map(|n| n.lane)
        .collect();
    for lane in due {
        let j = s.press_lane(lane, sink).expect("session is running");
        assert_eq!(j.tier, Tier::Sick, "press at {now}s");
    }
}

// Plays perfectly until `until` seconds or the session leaves Running.
fn autoplay(s: &mut Session, sink: &mut RecordingSink, until: f64) {
    while s.is_running() && s.time() < until {
        press_due(s, sink);
        s.tick(0.25, sink);
    }
}

#[test]
fn default_chart_has_six_loops_of_notes() {
    let settings = Settings::default();
    let notes = chart::generate(0.0, 6, 120.0, &settings);
    assert_eq!(notes.len(), 120);
    assert!(notes.iter().all(|n| n.spawn_time < n.time && n.is_pending()));
    assert!(notes.windows(2).all(|w| w[0].time <= w[1].time));
    // second loop starts 16 beats (8s) later, same lanes
    assert_eq!(notes[20].time, 8.0);
    assert_eq!(notes[20].lane, notes[0].lane);
}

#[test]
fn on_time_press_is_sick() {
    let mut s = session(GameConfig::default());
    let mut sink = RecordingSink::default();
    s.start(&sink);
    let cues_before = sink.cues.len();

    let j = s.press_lane(Lane::Left, &mut sink).unwrap();
    assert_eq!(j.tier, Tier::Sick);
    assert_eq!(j.note, Some(0));
    assert!(s.notes()[0].judged && s.notes()[0].hit);
    assert_eq!(s.scoreboard().score, 400);
    assert_eq!(s.scoreboard().health, MAX_HEALTH);
    // confirmation blip at full pitch
    let blip = sink.cues[cues_before];
    assert_eq!(blip.frequency, 800.0);
    assert_eq!(blip.start, 0.0);
}

#[test]
fn press_on_empty_lane_is_a_miss() {
    let mut s = session(GameConfig::default());
    let mut sink = RecordingSink::default();
    s.start(&sink);

    // nearest Up note sits at 1.0s, far outside the window
    let j = s.press_lane(Lane::Up, &mut sink).unwrap();
    assert_eq!(j.tier, Tier::Miss);
    assert_eq!(j.note, None);
    assert!(s.notes().iter().all(|n| !n.judged));
    assert_eq!(s.scoreboard().score, 0);
    assert_eq!(s.scoreboard().combo, 0);
    assert_eq!(s.scoreboard().health, 93);
    assert_eq!(s.feedback().len(), 1);
    assert_eq!(sink.cues.last().map(|c| c.frequency), Some(160.0));
}

#[test]
fn sweep_resolves_each_note_once() {
    let w = Settings::default().hit_window;
    let mut notes = chart::generate(0.0, 1, 120.0, &Settings::default());
    let first = judge::sweep(&mut notes, 3.0, w);
    assert!(!first.is_empty());
    assert!(first.iter().all(|&i| notes[i].judged && !notes[i].hit));
    assert!(judge::sweep(&mut notes, 3.0, w).is_empty());

    let later = judge::sweep(&mut notes, 100.0, w);
    assert_eq!(first.len() + later.len(), notes.len());
    assert!(later.iter().all(|i| !first.contains(i)));
}

#[test]
fn five_misses_leave_sixty_five_health() {
    let mut sb = Scoreboard::new();
    for _ in 0..5 {
        sb.apply(Tier::Miss);
    }
    assert_eq!(sb.health, 65);
    assert_eq!(sb.combo, 0);
    assert_eq!(sb.count(Tier::Miss), 5);
    assert!(!sb.is_depleted());
}

#[test]
fn health_stays_within_bounds() {
    let mut sb = Scoreboard::new();
    for _ in 0..10 {
        sb.apply(Tier::Sick);
    }
    assert_eq!(sb.health, MAX_HEALTH);
    for _ in 0..50 {
        sb.apply(Tier::Miss);
    }
    assert_eq!(sb.health, 0);
    assert!(sb.is_depleted());
    assert_eq!(sb.max_combo, 10);
}

// Pressing at arbitrary times and sweeping as the clock moves, every note is
// resolved exactly once, either by a press or by the sweep.
#[test]
fn judge_and_sweep_partition_the_chart() {
    let w = Difficulty::Easy.settings().hit_window;
    let mut notes = chart::generate(0.0, 2, 150.0, &Difficulty::Easy.settings());
    let mut pressed = HashSet::new();
    let mut swept = HashSet::new();
    let mut seed: u32 = 12345;
    let mut now = 0.0;
    while now < 20.0 {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let lane = chart::LANES[(seed >> 16) as usize % 4];
        let j = judge::judge(&mut notes, lane, now, w);
        if let Some(idx) = j.note {
            assert!(pressed.insert(idx), "note {idx} pressed twice");
            assert_ne!(j.tier, Tier::Miss);
        }
        for idx in judge::sweep(&mut notes, now, w) {
            assert!(swept.insert(idx), "note {idx} swept twice");
        }
        now += 0.07;
    }
    assert!(pressed.is_disjoint(&swept));
    assert_eq!(pressed.len() + swept.len(), notes.len());
    assert!(notes.iter().all(|n| n.judged));
}

// A matched press always takes the closest pending note of its lane.
#[test]
fn press_matches_nearest_pending_note() {
    let settings = Difficulty::Easy.settings();
    let w = settings.hit_window;
    let base: Vec<Note> = chart::generate(0.0, 1, 120.0, &settings);
    let mut t = 0.0;
    while t < 8.0 {
        for lane in chart::LANES {
            let mut notes = base.clone();
            let j = judge::judge(&mut notes, lane, t, w);
            let Some(idx) = j.note else {
                continue;
            };
            assert!(j.distance <= outer_window(w));
            for (other, n) in base.iter().enumerate() {
                if n.lane == lane && other != idx {
                    assert!((n.time - t).abs() >= j.distance, "press at {t} skipped note {other}");
                }
            }
        }
        t += 0.125;
    }
}

#[test]
fn guests_appear_on_schedule() {
    let mut s = session(GameConfig::default());
    let mut sink = RecordingSink::default();
    s.start(&sink);
    assert!(s.cast().is_active(Actor::Sonic));

    autoplay(&mut s, &mut sink, 20.0);
    assert!(s.cast().finale);
    assert!(s.cast().is_active(Actor::Knuckles));
    assert!(s.cast().is_active(Actor::Amy));
    assert!(!s.cast().is_active(Actor::Tails));

    autoplay(&mut s, &mut sink, 24.5);
    assert!(s.cast().is_active(Actor::Tails));

    autoplay(&mut s, &mut sink, 29.0);
    assert!(!s.cast().is_active(Actor::Tails));
    assert!(s.cast().is_active(Actor::Knuckles));
}

#[test]
fn perfect_run_clears_the_song() {
    let mut s = session(GameConfig::default());
    let mut sink = RecordingSink::default();
    s.start(&sink);
    autoplay(&mut s, &mut sink, 60.0);

    assert_eq!(s.state(), SessionState::Cleared);
    assert_eq!(s.time(), 48.0);
    assert!(s.is_finished());
    assert!(s.director().is_finished());
    let sb = s.scoreboard();
    assert_eq!(sb.count(Tier::Sick), 120);
    assert_eq!(sb.max_combo, 120);
    assert_eq!(sb.score, 120 * 400);
    for guest in Actor::GUESTS {
        assert!(!s.cast().is_active(guest));
    }
    assert!(!s.cast().finale);
}

#[test]
fn idle_player_loses_on_health() {
    let mut s = session(GameConfig::default());
    let mut sink = RecordingSink::default();
    s.start(&sink);
    while s.is_running() && s.time() < 60.0 {
        s.tick(0.05, &mut sink);
    }
    assert_eq!(s.state(), SessionState::Lost);
    // 100 / 7 rounds up to 15 misses
    assert_eq!(s.scoreboard().count(Tier::Miss), 15);
    assert_eq!(s.scoreboard().health, 0);

    let t = s.time();
    assert!(s.tick(5.0, &mut sink).is_empty());
    assert_eq!(s.time(), t);
    assert_eq!(s.press_lane(Lane::Left, &mut sink), None);
}

#[test]
fn nothing_fires_after_stop() {
    let mut s = session(GameConfig::default());
    let mut sink = RecordingSink::default();
    s.start(&sink);
    autoplay(&mut s, &mut sink, 2.0);
    s.stop();
    assert_eq!(s.state(), SessionState::Stopped);

    let heard = sink.cues.len();
    let pending = s.director().pending_stage().len();
    for _ in 0..200 {
        s.tick(0.25, &mut sink);
    }
    assert_eq!(sink.cues.len(), heard);
    assert_eq!(s.director().pending_stage().len(), pending);
    assert!(!s.cast().is_active(Actor::Tails));
    assert!(!s.cast().finale);
}

#[test]
fn restart_after_stop_resets_the_run() {
    let mut s = session(GameConfig::default());
    let mut sink = RecordingSink::default();
    s.start(&sink);
    autoplay(&mut s, &mut sink, 20.0);
    s.stop();
    s.start(&sink);
    assert!(s.is_running());
    assert_eq!(s.time(), 0.0);
    assert_eq!(s.scoreboard().score, 0);
    assert!(!s.cast().finale);
    assert!(s.notes().iter().all(|n| n.is_pending()));
}

#[test]
fn missing_audio_schedules_nothing() {
    let mut s = session(GameConfig::default());
    s.start(&NoAudio);
    assert!(s.director().is_finished());

    let mut sink = NoAudio;
    let j = s.press_lane(Lane::Left, &mut sink).unwrap();
    assert_eq!(j.tier, Tier::Sick);
    for _ in 0..100 {
        s.tick(0.25, &mut sink);
    }
    // judging keeps working, the stage never changes
    assert!(s.scoreboard().count(Tier::Miss) > 0);
    assert!(!s.cast().finale);
    assert!(!s.cast().is_active(Actor::Tails));
}

#[test]
fn tempo_and_difficulty_shape_the_next_chart() {
    let mut s = session(GameConfig::default());
    s.set_bpm(f64::NAN);
    assert_eq!(s.config().bpm, 120.0);
    s.set_bpm(1_000.0);
    s.set_difficulty(Difficulty::Hard);
    let mut sink = RecordingSink::default();
    s.start(&sink);
    assert_eq!(s.config().bpm, 300.0);
    let n = &s.notes()[1];
    assert!((n.time - 0.2).abs() < 1e-9);
    assert!((n.time - n.spawn_time - 1.0).abs() < 1e-9);
    s.tick(0.1, &mut sink);
    assert!(s.active_notes().all(|v| (0.0..=1.0).contains(&v.progress)));
}
