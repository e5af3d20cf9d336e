//! Song director: the whole soundtrack and every scripted entrance, laid out
//! once at session start as one-shot events on the logical clock.
//!
//! Nothing here runs on wall-clock timers. The session calls [`Director::poll`]
//! every frame with the current game time; due stage actions are handed back to
//! the session and due cues are pushed to the audio sink slightly ahead of time
//! so the backend can place them sample-accurately.

use std::collections::VecDeque;

use crate::audio::{AudioSink, Cue};
use crate::cast::Actor;
use crate::clock::{beat_length, time_of_beat};
use crate::settings::sanitize_bpm;

/// Root of the background line, Hz.
pub const BASE_FREQ: f64 = 220.0;
pub const BASS_FREQ: f64 = 110.0;
pub const DUET_BEATS: u32 = 8;
/// Tails lingers this long after the last duet beat.
pub const DUET_LINGER_SECS: f64 = 0.5;
pub const DUET_TAUNT_SECS: f64 = 1.2;
pub const ENTRANCE_SECS: f64 = 1.0;
/// Length of the closing section, counted back from the song end.
pub const FINALE_SECS: f64 = 30.0;
/// Root of the finale melody, an octave under the background line.
pub const FINALE_ROOT: f64 = 110.0;
/// Scale degrees (semitones over the root) the finale melody cycles through.
const FINALE_DEGREES: [f64; 6] = [0.0, 3.0, 7.0, 10.0, 7.0, 3.0];
/// How far ahead of the clock cues are released to the sink.
pub const CUE_LOOKAHEAD: f64 = 0.1;

/// Something that changes what is on stage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StageAction {
    Show { actor: Actor, entrance: f64 },
    Hide(Actor),
    Taunt { actor: Actor, secs: f64 },
    Finale(bool),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScheduledEvent<T> {
    /// Seconds since song start.
    pub at: f64,
    pub payload: T,
}

/// Time-ordered one-shot queue. Events with equal times keep insertion order.
#[derive(Clone, Debug)]
pub struct Timeline<T> {
    events: VecDeque<ScheduledEvent<T>>,
}

impl<T> Default for Timeline<T> {
    fn default() -> Self {
        Self {
            events: VecDeque::new(),
        }
    }
}

impl<T> Timeline<T> {
    fn from_unsorted(mut events: Vec<ScheduledEvent<T>>) -> Self {
        events.sort_by(|a, b| a.at.total_cmp(&b.at));
        Self {
            events: events.into(),
        }
    }

    /// Removes and returns every event with `at <= limit`, in order.
    pub fn drain_due(&mut self, limit: f64) -> Vec<ScheduledEvent<T>> {
        let mut due = Vec::new();
        while self.events.front().is_some_and(|e| e.at <= limit) {
            if let Some(e) = self.events.pop_front() {
                due.push(e);
            }
        }
        due
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScheduledEvent<T>> {
        self.events.iter()
    }
}

/// Where the scripted sections fall for a given song.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SongLayout {
    pub bpm: f64,
    pub total_beats: u32,
    pub song_len: f64,
    pub duet_start: f64,
    pub duet_end: f64,
    pub finale_start: f64,
}

impl SongLayout {
    pub fn new(bpm: f64, total_beats: u32) -> Self {
        let bpm = sanitize_bpm(bpm);
        let beat = beat_length(bpm);
        let song_len = total_beats as f64 * beat;
        let duet_start = time_of_beat((total_beats / 2) as f64, bpm);
        Self {
            bpm,
            total_beats,
            song_len,
            duet_start,
            duet_end: duet_start + DUET_BEATS as f64 * beat + DUET_LINGER_SECS,
            finale_start: (song_len - FINALE_SECS).max(0.0),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Director {
    cues: Timeline<Cue>,
    stage: Timeline<StageAction>,
}

impl Director {
    /// Director with nothing scheduled.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Lays out the song for a new session. Without a usable audio backend
    /// nothing is scheduled at all and the session runs on judging alone.
    pub fn for_session(bpm: f64, total_beats: u32, sink: &dyn AudioSink) -> Self {
        if !sink.is_available() {
            log::warn!("audio backend unavailable, director scheduling skipped");
            return Self::idle();
        }
        let director = Self::plan(&SongLayout::new(bpm, total_beats));
        log::debug!(
            "director scheduled {} cues and {} stage events",
            director.cues.len(),
            director.stage.len()
        );
        director
    }

    pub fn plan(layout: &SongLayout) -> Self {
        let mut cues = Vec::new();
        let mut stage = Vec::new();
        background_track(layout, &mut cues);
        duet(layout, &mut cues, &mut stage);
        finale(layout, &mut cues, &mut stage);
        Self {
            cues: Timeline::from_unsorted(cues),
            stage: Timeline::from_unsorted(stage),
        }
    }

    /// Releases cues starting within `lookahead` of `now` to `sink` and returns
    /// the stage actions that are due.
    pub fn poll(&mut self, now: f64, lookahead: f64, sink: &mut dyn AudioSink) -> Vec<StageAction> {
        for ev in self.cues.drain_due(now + lookahead) {
            sink.play(&ev.payload);
        }
        self.stage
            .drain_due(now)
            .into_iter()
            .map(|ev| ev.payload)
            .collect()
    }

    pub fn pending_cues(&self) -> &Timeline<Cue> {
        &self.cues
    }

    pub fn pending_stage(&self) -> &Timeline<StageAction> {
        &self.stage
    }

    pub fn is_finished(&self) -> bool {
        self.cues.is_empty() && self.stage.is_empty()
    }
}

fn semitones(freq: f64, steps: f64) -> f64 {
    freq * (steps / 12.0).exp2()
}

fn at<T>(at: f64, payload: T) -> ScheduledEvent<T> {
    ScheduledEvent { at, payload }
}

/// A square note every beat walking an 8-step scale, plus a bass hit every bar.
fn background_track(layout: &SongLayout, cues: &mut Vec<ScheduledEvent<Cue>>) {
    for i in 0..layout.total_beats {
        let t = time_of_beat(i as f64, layout.bpm);
        let freq = semitones(BASE_FREQ, (i % 8) as f64 - 3.0);
        cues.push(at(t, Cue::square(t, freq, 0.12, 0.08)));
        if i % 4 == 0 {
            cues.push(at(t, Cue::square(t, BASS_FREQ, 0.18, 0.09)));
        }
    }
}

fn duet(
    layout: &SongLayout,
    cues: &mut Vec<ScheduledEvent<Cue>>,
    stage: &mut Vec<ScheduledEvent<StageAction>>,
) {
    let beat = beat_length(layout.bpm);
    for i in 0..DUET_BEATS {
        let t = layout.duet_start + i as f64 * beat;
        let offset = if i % 2 == 0 { 4.0 } else { 7.0 };
        let freq = semitones(BASE_FREQ, (i % 8) as f64 - 3.0 + offset);
        cues.push(at(t, Cue::square(t, freq, 0.16, 0.07)));
        if i % 3 == 0 {
            let t2 = t + beat * 0.25;
            cues.push(at(t2, Cue::square(t2, semitones(freq, -5.0), 0.12, 0.05)));
        }
    }
    stage.push(at(
        layout.duet_start,
        StageAction::Show {
            actor: Actor::Tails,
            entrance: ENTRANCE_SECS,
        },
    ));
    stage.push(at(
        layout.duet_start,
        StageAction::Taunt {
            actor: Actor::Sonic,
            secs: DUET_TAUNT_SECS,
        },
    ));
    stage.push(at(layout.duet_end, StageAction::Hide(Actor::Tails)));
}

/// Knuckles and Amy join for the closing stretch over a two-voice line; at the
/// song end every guest leaves and the finale flag drops.
fn finale(
    layout: &SongLayout,
    cues: &mut Vec<ScheduledEvent<Cue>>,
    stage: &mut Vec<ScheduledEvent<StageAction>>,
) {
    if layout.total_beats == 0 {
        return;
    }
    let beat = beat_length(layout.bpm);
    let first = (layout.finale_start / beat).ceil() as u32;
    for (n, i) in (first..layout.total_beats).enumerate() {
        let t = time_of_beat(i as f64, layout.bpm);
        let melody = semitones(FINALE_ROOT, FINALE_DEGREES[n % FINALE_DEGREES.len()]);
        cues.push(at(t, Cue::triangle(t, melody, 0.2, 0.06)));
        cues.push(at(t, Cue::square(t, semitones(melody, 7.0), 0.15, 0.04)));
    }

    for actor in [Actor::Knuckles, Actor::Amy] {
        stage.push(at(
            layout.finale_start,
            StageAction::Show {
                actor,
                entrance: ENTRANCE_SECS,
            },
        ));
    }
    stage.push(at(layout.finale_start, StageAction::Finale(true)));
    for actor in Actor::GUESTS {
        stage.push(at(layout.song_len, StageAction::Hide(actor)));
    }
    stage.push(at(layout.song_len, StageAction::Finale(false)));
}
