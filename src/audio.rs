//! Abstract chiptune cues and the sinks that play them.
//!
//! The game only ever produces [`Cue`] values positioned on the logical clock.
//! An [`AudioSink`] turns them into sound: [`WebAudioSink`] in the browser,
//! [`SilentSink`] in tests and headless runs.

use wasm_bindgen::prelude::*;
use web_sys::{AudioContext, OscillatorType};

use crate::judge::Tier;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Square,
    Triangle,
    Sawtooth,
}

/// One oscillator note. `start` is in logical seconds since song start.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cue {
    pub waveform: Waveform,
    pub frequency: f64,
    pub start: f64,
    pub duration: f64,
    pub gain: f64,
}

impl Cue {
    pub fn new(waveform: Waveform, start: f64, frequency: f64, duration: f64, gain: f64) -> Self {
        Self {
            waveform,
            frequency,
            start,
            duration,
            gain,
        }
    }

    pub fn square(start: f64, frequency: f64, duration: f64, gain: f64) -> Self {
        Self::new(Waveform::Square, start, frequency, duration, gain)
    }

    pub fn triangle(start: f64, frequency: f64, duration: f64, gain: f64) -> Self {
        Self::new(Waveform::Triangle, start, frequency, duration, gain)
    }

    pub fn sawtooth(start: f64, frequency: f64, duration: f64, gain: f64) -> Self {
        Self::new(Waveform::Sawtooth, start, frequency, duration, gain)
    }
}

/// Confirmation blip for a matched press; pitch drops as accuracy worsens.
pub fn hit_cue(tier: Tier, distance: f64, now: f64) -> Cue {
    let freq = 800.0 - f64::min(600.0, distance * 4000.0);
    match tier {
        Tier::Bad => Cue::triangle(now, freq, 0.13, 0.10),
        Tier::Miss => miss_cue(now),
        _ => Cue::square(now, freq, 0.13, 0.15),
    }
}

pub fn miss_cue(now: f64) -> Cue {
    Cue::sawtooth(now, 160.0, 0.2, 0.12)
}

pub trait AudioSink {
    /// False when there is no backend; the director then schedules nothing.
    fn is_available(&self) -> bool;
    fn play(&mut self, cue: &Cue);
}

/// Accepts and drops every cue.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSink;

impl AudioSink for SilentSink {
    fn is_available(&self) -> bool {
        true
    }

    fn play(&mut self, _cue: &Cue) {}
}

/// Lead-in added to the audio clock when a session is anchored.
const START_LATENCY: f64 = 0.05;

/// Web Audio backend. Logical time `t` plays at `origin + t` on the context clock.
pub struct WebAudioSink {
    ctx: Option<AudioContext>,
    origin: f64,
}

impl WebAudioSink {
    pub fn new() -> Self {
        let ctx = match AudioContext::new() {
            Ok(ctx) => Some(ctx),
            Err(e) => {
                log::warn!("audio unavailable: {e:?}");
                None
            }
        };
        Self { ctx, origin: 0.0 }
    }

    /// Pins logical time 0 to "now" on the audio clock. Call at session start.
    pub fn anchor(&mut self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
            self.origin = ctx.current_time() + START_LATENCY;
        }
    }

    fn schedule(ctx: &AudioContext, origin: f64, cue: &Cue) -> Result<(), JsValue> {
        let osc = ctx.create_oscillator()?;
        osc.set_type(match cue.waveform {
            Waveform::Square => OscillatorType::Square,
            Waveform::Triangle => OscillatorType::Triangle,
            Waveform::Sawtooth => OscillatorType::Sawtooth,
        });
        osc.frequency().set_value(cue.frequency as f32);
        let gain = ctx.create_gain()?;
        gain.gain().set_value(0.0001);
        osc.connect_with_audio_node(&gain)?;
        gain.connect_with_audio_node(&ctx.destination())?;

        let t = (origin + cue.start).max(ctx.current_time());
        gain.gain()
            .set_target_at_time(cue.gain as f32, t + 0.001, 0.005)?;
        gain.gain()
            .exponential_ramp_to_value_at_time(0.0001, t + cue.duration)?;
        osc.start_with_when(t)?;
        osc.stop_with_when(t + cue.duration + 0.02)?;
        Ok(())
    }
}

impl Default for WebAudioSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSink for WebAudioSink {
    fn is_available(&self) -> bool {
        self.ctx.is_some()
    }

    fn play(&mut self, cue: &Cue) {
        if let Some(ctx) = &self.ctx {
            if let Err(e) = Self::schedule(ctx, self.origin, cue) {
                log::debug!("dropped cue at {:.3}s: {e:?}", cue.start);
            }
        }
    }
}
