//! Free-running beat clock
//!
//! Times are host milliseconds. The clock never reads a clock itself.

use crate::consts::{BEAT_SUBDIVISION, DEFAULT_BPM, TIME_SIGNATURE};

#[derive(Debug, Clone, PartialEq)]
pub struct BeatClock {
    bpm: f64,
    next_beat_ms: f64,
    current_beat: u64,
    pub subdivision: u32,
    pub time_signature: u32,
}

impl BeatClock {
    pub fn new(bpm: f64, now_ms: f64) -> Self {
        let bpm = sanitize_bpm(bpm);
        Self {
            bpm,
            next_beat_ms: now_ms + 60_000.0 / bpm,
            current_beat: 0,
            subdivision: BEAT_SUBDIVISION,
            time_signature: TIME_SIGNATURE,
        }
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Beat period in milliseconds
    pub fn period_ms(&self) -> f64 {
        60_000.0 / self.bpm
    }

    pub fn current_beat(&self) -> u64 {
        self.current_beat
    }

    pub fn next_beat_ms(&self) -> f64 {
        self.next_beat_ms
    }

    /// Change tempo. The next beat is rescheduled one new period from now;
    /// the beat count is kept.
    pub fn set_bpm(&mut self, bpm: f64, now_ms: f64) {
        self.bpm = sanitize_bpm(bpm);
        self.next_beat_ms = now_ms + self.period_ms();
    }

    pub fn time_to_next_beat(&self, now_ms: f64) -> f64 {
        (self.next_beat_ms - now_ms).max(0.0)
    }

    /// Within `tolerance_ms` of the upcoming beat or of the last one
    pub fn is_on_beat(&self, tolerance_ms: f64, now_ms: f64) -> bool {
        let to_next = self.time_to_next_beat(now_ms);
        let since_last = self.period_ms() - to_next;
        to_next <= tolerance_ms || since_last <= tolerance_ms
    }

    /// Progress through the current beat in [0, 1]
    pub fn beat_phase(&self, now_ms: f64) -> f64 {
        (1.0 - self.time_to_next_beat(now_ms) / self.period_ms()).clamp(0.0, 1.0)
    }

    /// Beat within the bar (0-based)
    pub fn beat_in_bar(&self) -> u32 {
        (self.current_beat % self.time_signature.max(1) as u64) as u32
    }

    /// Advance at most one beat. Returns the new beat number when one fired.
    pub fn update(&mut self, now_ms: f64) -> Option<u64> {
        if now_ms < self.next_beat_ms {
            return None;
        }
        self.current_beat += 1;
        self.next_beat_ms = now_ms + self.period_ms();
        log::trace!("Beat {}", self.current_beat);
        Some(self.current_beat)
    }
}

impl Default for BeatClock {
    fn default() -> Self {
        Self::new(DEFAULT_BPM, 0.0)
    }
}

/// Non-finite or sub-1 tempos fall back to a usable value
fn sanitize_bpm(bpm: f64) -> f64 {
    if bpm.is_finite() { bpm.max(1.0) } else { DEFAULT_BPM }
}
