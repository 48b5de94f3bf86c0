//! Tap tempo.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use super::{MAX_BPM, MIN_BPM};

/// Taps kept for averaging.
pub const MAX_TAPS: usize = 8;
/// Taps older than this are forgotten.
pub const TAP_WINDOW: Duration = Duration::from_secs(3);

/// Derives a tempo from the spacing of recent taps.
#[derive(Debug, Clone, Default)]
pub struct TapTempo {
    taps: VecDeque<Instant>,
}

impl TapTempo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a tap at `now` and returns the tapped tempo, if there is one.
    ///
    /// Needs at least two taps inside the window. The tempo is rounded to a
    /// whole BPM and only returned inside the metronome's range.
    pub fn tap(&mut self, now: Instant) -> Option<f64> {
        self.taps.retain(|&tap| now.saturating_duration_since(tap) < TAP_WINDOW);
        self.taps.push_back(now);
        while self.taps.len() > MAX_TAPS {
            self.taps.pop_front();
        }

        let (first, last) = (self.taps.front()?, self.taps.back()?);
        let gaps = self.taps.len().checked_sub(1).filter(|&n| n > 0)?;
        let mean = last.saturating_duration_since(*first).as_secs_f64() / gaps as f64;
        if mean <= 0.0 {
            return None;
        }

        let bpm = (60.0 / mean).round();
        (MIN_BPM..=MAX_BPM).contains(&bpm).then_some(bpm)
    }

    pub fn taps(&self) -> usize {
        self.taps.len()
    }

    pub fn reset(&mut self) {
        self.taps.clear();
    }
}
