//! One play-through: owns every piece of mutable game state and is the only
//! thing the front end talks to.

use crate::audio::{AudioSink, hit_cue, miss_cue};
use crate::cast::{Cast, TauntRng};
use crate::chart::{self, Lane, Note};
use crate::clock::GameClock;
use crate::director::{CUE_LOOKAHEAD, Director, StageAction};
use crate::feedback::{self, Feedback};
use crate::judge::{self, Judgment, Tier};
use crate::score::Scoreboard;
use crate::settings::{Difficulty, GameConfig, Settings, sanitize_bpm};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Created, never started.
    Idle,
    Running,
    /// Stopped by the player.
    Stopped,
    /// Health ran out. Terminal until the next start.
    Lost,
    /// Every note resolved and the soundtrack played out.
    Cleared,
}

/// Snapshot of a pending note for drawing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoteView {
    pub lane: Lane,
    /// 0 at spawn, 1 on the judgment line.
    pub progress: f64,
}

pub struct Session {
    config: GameConfig,
    settings: Settings,
    /// Tempo the current chart and schedule were built with.
    song_bpm: f64,
    clock: GameClock,
    notes: Vec<Note>,
    scoreboard: Scoreboard,
    effects: Vec<Feedback>,
    cast: Cast,
    director: Director,
    state: SessionState,
}

impl Session {
    pub fn new(config: GameConfig) -> Self {
        Self::with_rng(config, TauntRng::from_entropy())
    }

    pub fn with_rng(mut config: GameConfig, rng: TauntRng) -> Self {
        config.bpm = sanitize_bpm(config.bpm);
        Self {
            settings: config.difficulty.settings(),
            song_bpm: config.bpm,
            config,
            clock: GameClock::new(),
            notes: Vec::new(),
            scoreboard: Scoreboard::new(),
            effects: Vec::new(),
            cast: Cast::new(rng),
            director: Director::idle(),
            state: SessionState::Idle,
        }
    }

    /// Resets everything and starts the song from 0. Ignored while running.
    /// Settings are re-read from the current difficulty.
    pub fn start(&mut self, sink: &dyn AudioSink) {
        if self.state == SessionState::Running {
            return;
        }
        self.settings = self.config.difficulty.settings();
        self.song_bpm = self.config.bpm;
        self.clock.reset();
        self.scoreboard.reset();
        self.effects.clear();
        self.cast.reset();
        self.notes = chart::generate(0.0, self.config.loops, self.song_bpm, &self.settings);
        self.director = Director::for_session(self.song_bpm, self.config.total_beats, sink);
        self.clock.start();
        self.state = SessionState::Running;
        log::debug!(
            "session started: {} @ {} BPM, {} notes",
            self.config.difficulty,
            self.song_bpm,
            self.notes.len()
        );
    }

    /// Halts the clock. Pending director events are never applied afterwards.
    pub fn stop(&mut self) {
        if self.state == SessionState::Running {
            self.state = SessionState::Stopped;
            self.clock.pause();
            log::debug!("session stopped at {:.2}s", self.clock.now());
        }
    }

    /// Judges a lane press at the current time. `None` when not running.
    pub fn press_lane(&mut self, lane: Lane, sink: &mut dyn AudioSink) -> Option<Judgment> {
        if self.state != SessionState::Running {
            return None;
        }
        let now = self.clock.now();
        let judgment = judge::judge(&mut self.notes, lane, now, self.settings.hit_window);
        self.resolve(judgment.tier, lane);
        let cue = match judgment.note {
            Some(_) => hit_cue(judgment.tier, judgment.distance, now),
            None => miss_cue(now),
        };
        if sink.is_available() {
            sink.play(&cue);
        }
        self.check_health();
        Some(judgment)
    }

    /// Advances one frame: clock, director, sweep, effects, cast, in that order.
    /// Returns the notes swept as misses this frame.
    pub fn tick(&mut self, dt: f64, sink: &mut dyn AudioSink) -> Vec<usize> {
        if self.state != SessionState::Running {
            return Vec::new();
        }
        self.clock.advance(dt);
        let now = self.clock.now();

        for action in self.director.poll(now, CUE_LOOKAHEAD, sink) {
            self.apply_stage(action);
        }

        let missed = judge::sweep(&mut self.notes, now, self.settings.hit_window);
        for &idx in &missed {
            let lane = self.notes[idx].lane;
            self.resolve(Tier::Miss, lane);
        }
        if !missed.is_empty() && sink.is_available() {
            sink.play(&miss_cue(now));
        }

        feedback::update(&mut self.effects, dt);
        self.cast.update(dt);
        self.check_health();
        let done = self.is_finished() && self.director.is_finished();
        if self.state == SessionState::Running && done {
            self.state = SessionState::Cleared;
            self.clock.pause();
            log::info!(
                "song cleared, score {} (max combo {})",
                self.scoreboard.score,
                self.scoreboard.max_combo
            );
        }
        missed
    }

    fn resolve(&mut self, tier: Tier, lane: Lane) {
        self.scoreboard.apply(tier);
        self.effects.push(Feedback::new(tier, lane));
    }

    fn check_health(&mut self) {
        if self.state == SessionState::Running && self.scoreboard.is_depleted() {
            self.state = SessionState::Lost;
            self.clock.pause();
            log::info!(
                "health depleted at {:.2}s, final score {}",
                self.clock.now(),
                self.scoreboard.score
            );
        }
    }

    fn apply_stage(&mut self, action: StageAction) {
        // Deferred actions may still be queued after the session ended.
        if self.state != SessionState::Running {
            return;
        }
        match action {
            StageAction::Show { actor, entrance } => self.cast.show(actor, entrance),
            StageAction::Hide(actor) => self.cast.hide(actor),
            StageAction::Taunt { actor, secs } => self.cast.taunt(actor, secs),
            StageAction::Finale(on) => self.cast.finale = on,
        }
    }

    /// New tempo for the next start; notes already on the chart keep their times.
    pub fn set_bpm(&mut self, bpm: f64) {
        self.config.bpm = sanitize_bpm(bpm);
    }

    /// Swaps the difficulty preset. Judging windows change immediately, travel
    /// time applies from the next chart.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.config.difficulty = difficulty;
        self.settings = difficulty.settings();
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn time(&self) -> f64 {
        self.clock.now()
    }

    /// Tempo of the song being played, unaffected by [`Session::set_bpm`]
    /// until the next start.
    pub fn song_bpm(&self) -> f64 {
        self.song_bpm
    }

    pub fn current_beat(&self) -> f64 {
        self.clock.current_beat(self.song_bpm)
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Unjudged notes that have spawned, with their fall progress.
    pub fn active_notes(&self) -> impl Iterator<Item = NoteView> + '_ {
        let now = self.clock.now();
        self.notes
            .iter()
            .filter(move |n| n.is_pending() && n.spawn_time <= now)
            .map(move |n| NoteView {
                lane: n.lane,
                progress: n.progress(now),
            })
    }

    pub fn feedback(&self) -> &[Feedback] {
        &self.effects
    }

    pub fn cast(&self) -> &Cast {
        &self.cast
    }

    pub fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    pub fn director(&self) -> &Director {
        &self.director
    }

    /// Every note resolved. Trivially true for an empty chart.
    pub fn is_finished(&self) -> bool {
        self.notes.iter().all(|n| n.judged)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SilentSink;
    use crate::cast::Actor;

    fn running() -> Session {
        let mut s = Session::with_rng(GameConfig::default(), TauntRng::seeded(7));
        s.start(&SilentSink);
        s
    }

    #[test]
    fn test_press_before_start_is_ignored() {
        let mut s = Session::default();
        assert_eq!(s.press_lane(Lane::Up, &mut SilentSink), None);
        assert_eq!(s.state(), SessionState::Idle);
    }

    #[test]
    fn test_perfect_press_on_first_note() {
        let mut s = running();
        // first note: beat 0, lane left, judgment time 0.0
        let j = s.press_lane(Lane::Left, &mut SilentSink).unwrap();
        assert_eq!(j.tier, Tier::Sick);
        assert_eq!(j.note, Some(0));
        assert_eq!(s.scoreboard().score, 400);
        assert_eq!(s.scoreboard().combo, 1);
        assert_eq!(s.feedback().len(), 1);
    }

    #[test]
    fn test_stop_suppresses_ticks_and_stage_events() {
        let mut s = running();
        s.stop();
        s.tick(30.0, &mut SilentSink);
        assert_eq!(s.time(), 0.0);
        assert!(!s.cast().is_active(Actor::Tails));
        assert!(!s.director().is_finished());
    }

    #[test]
    fn test_set_difficulty_swaps_window_now() {
        let mut s = running();
        s.set_difficulty(Difficulty::Hard);
        assert_eq!(s.settings(), Difficulty::Hard.settings());
        // travel of generated notes is unchanged until restart
        let n = &s.notes()[0];
        assert!((n.time - n.spawn_time - 1.8).abs() < 1e-9);
    }

    #[test]
    fn test_tempo_change_waits_for_next_start() {
        let mut s = running();
        s.tick(2.0, &mut SilentSink);
        assert_eq!(s.current_beat(), 4.0);
        s.set_bpm(60.0);
        assert_eq!(s.current_beat(), 4.0);
        assert_eq!(s.song_bpm(), 120.0);
        assert_eq!(s.config().bpm, 60.0);

        s.stop();
        s.start(&SilentSink);
        assert_eq!(s.song_bpm(), 60.0);
        assert_eq!(s.notes()[1].time, 1.0);
    }

    #[test]
    fn test_empty_chart_clears_once_song_ends() {
        let config = GameConfig {
            loops: 0,
            total_beats: 32,
            ..GameConfig::default()
        };
        let mut s = Session::with_rng(config, TauntRng::seeded(7));
        s.start(&SilentSink);
        assert!(s.notes().is_empty());
        s.tick(1.0, &mut SilentSink);
        assert!(s.is_running());
        // the last stage events land on the song end at 16s
        for _ in 0..100 {
            s.tick(0.25, &mut SilentSink);
        }
        assert_eq!(s.state(), SessionState::Cleared);
        assert_eq!(s.time(), 16.0);
    }

    #[test]
    fn test_active_notes_progress() {
        let mut s = running();
        s.tick(0.05, &mut SilentSink);
        let views: Vec<NoteView> = s.active_notes().collect();
        assert!(!views.is_empty());
        assert!(views.iter().all(|v| (0.0..=1.0).contains(&v.progress)));
    }
}
