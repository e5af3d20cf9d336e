//! Logical game time.
//!
//! The game never reads wall-clock time directly: the frame loop feeds frame
//! deltas into [`GameClock`], and everything else (note positions, judging,
//! sweeping, director events) reads the logical time back from it.

/// Converts `requestAnimationFrame` timestamps (ms) into frame deltas (seconds).
#[derive(Debug, Default)]
pub struct FrameTimer {
    last_ms: Option<f64>,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self { last_ms: None }
    }

    /// Starts measuring from `now_ms`; the next [`FrameTimer::delta`] is relative to it.
    pub fn reset(&mut self, now_ms: f64) {
        self.last_ms = Some(now_ms);
    }

    /// Seconds elapsed since the previous call. The first call yields 0 and
    /// a timestamp going backwards is treated as no time passing.
    pub fn delta(&mut self, now_ms: f64) -> f64 {
        let dt = match self.last_ms {
            Some(last) => ((now_ms - last) / 1000.0).max(0.0),
            None => 0.0,
        };
        self.last_ms = Some(now_ms);
        dt
    }
}

/// Pausable seconds counter driven by frame deltas.
#[derive(Debug, Default, Clone)]
pub struct GameClock {
    time: f64,
    running: bool,
}

impl GameClock {
    pub fn new() -> Self {
        Self {
            time: 0.0,
            running: false,
        }
    }

    /// Seconds since song start.
    pub fn now(&self) -> f64 {
        self.time
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn reset(&mut self) {
        self.time = 0.0;
        self.running = false;
    }

    /// Advances by `dt` seconds while running. Non-finite or negative deltas are ignored.
    pub fn advance(&mut self, dt: f64) {
        if self.running && dt.is_finite() && dt > 0.0 {
            self.time += dt;
        }
    }

    /// Fractional beat index at the current time for `bpm`.
    pub fn current_beat(&self, bpm: f64) -> f64 {
        beat_at(self.time, bpm)
    }
}

/// Length of one beat in seconds.
pub fn beat_length(bpm: f64) -> f64 {
    60.0 / bpm
}

pub fn beat_at(time: f64, bpm: f64) -> f64 {
    time / beat_length(bpm)
}

pub fn time_of_beat(beat: f64, bpm: f64) -> f64 {
    beat * beat_length(bpm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_only_advances_while_running() {
        let mut clock = GameClock::new();
        clock.advance(0.5);
        assert_eq!(clock.now(), 0.0);
        clock.start();
        clock.advance(0.5);
        clock.advance(0.25);
        assert!((clock.now() - 0.75).abs() < 1e-12);
        clock.pause();
        clock.advance(1.0);
        assert!((clock.now() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_clock_ignores_bad_deltas() {
        let mut clock = GameClock::new();
        clock.start();
        clock.advance(-1.0);
        clock.advance(f64::NAN);
        clock.advance(f64::INFINITY);
        assert_eq!(clock.now(), 0.0);
    }

    #[test]
    fn test_frame_timer_deltas() {
        let mut timer = FrameTimer::new();
        assert_eq!(timer.delta(1_000.0), 0.0);
        assert!((timer.delta(1_016.0) - 0.016).abs() < 1e-9);
        assert_eq!(timer.delta(900.0), 0.0);
        timer.reset(2_000.0);
        assert!((timer.delta(2_500.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_beat_conversions() {
        assert!((beat_length(120.0) - 0.5).abs() < 1e-12);
        assert!((beat_at(1.5, 120.0) - 3.0).abs() < 1e-12);
        assert!((time_of_beat(4.0, 60.0) - 4.0).abs() < 1e-12);
        let mut clock = GameClock::new();
        clock.start();
        clock.advance(2.0);
        assert!((clock.current_beat(120.0) - 4.0).abs() < 1e-12);
    }
}
