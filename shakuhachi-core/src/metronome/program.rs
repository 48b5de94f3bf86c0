//! Tempo programs: how the tempo evolves over a practice session.

use serde::{Deserialize, Serialize};

use super::{TimeSignature, clamp_bpm};

/// One exercise of a practice plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub bpm: f64,
    pub time_signature: TimeSignature,
    pub bars: u32,
}

/// How the tempo changes while the metronome runs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum TempoProgram {
    /// The configured tempo, forever.
    #[default]
    Constant,
    /// Linear speed-up over `duration_secs` of playing, then hold `end_bpm`.
    Accelerando { start_bpm: f64, end_bpm: f64, duration_secs: f64 },
    /// Linear slow-down over `duration_secs` of playing, then hold `end_bpm`.
    Ritardando { start_bpm: f64, end_bpm: f64, duration_secs: f64 },
    /// Raise the tempo by `step_bpm` every `bars_per_step` bars; stop once the
    /// next step would pass `end_bpm`.
    Steps { start_bpm: f64, end_bpm: f64, step_bpm: f64, bars_per_step: u32 },
    /// A list of exercises played in order; stop after the last.
    Plan { exercises: Vec<Exercise> },
}

/// How far a session has progressed, in musical time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProgramPosition {
    /// Sum of the beat lengths played so far (s).
    pub elapsed_secs: f64,
    /// Bars completed since the count-in ended.
    pub completed_bars: u32,
}

/// What to play next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tempo {
    Play { bpm: f64, time_signature: TimeSignature },
    Finished,
}

fn interpolate(start: f64, end: f64, elapsed: f64, duration: f64) -> f64 {
    let progress = if duration > 0.0 { (elapsed / duration).clamp(0.0, 1.0) } else { 1.0 };
    start + (end - start) * progress
}

impl TempoProgram {
    /// Tempo and signature at `position`.
    ///
    /// # Arguments
    /// * `base_bpm` - Tempo of a `Constant` program
    /// * `base_signature` - Signature of every program except `Plan`
    /// * `position` - Progress so far
    pub fn tempo_at(&self, base_bpm: f64, base_signature: TimeSignature, position: &ProgramPosition) -> Tempo {
        let play = |bpm: f64| Tempo::Play { bpm: clamp_bpm(bpm), time_signature: base_signature };

        match self {
            TempoProgram::Constant => play(base_bpm),
            TempoProgram::Accelerando { start_bpm, end_bpm, duration_secs }
            | TempoProgram::Ritardando { start_bpm, end_bpm, duration_secs } => {
                play(interpolate(*start_bpm, *end_bpm, position.elapsed_secs, *duration_secs))
            }
            TempoProgram::Steps { start_bpm, end_bpm, step_bpm, bars_per_step } => {
                let step = position.completed_bars / (*bars_per_step).max(1);
                let bpm = start_bpm + step as f64 * step_bpm.max(0.0);
                if step > 0 && bpm > *end_bpm {
                    Tempo::Finished
                } else {
                    play(bpm)
                }
            }
            TempoProgram::Plan { exercises } => {
                let mut bars_before = 0;
                for exercise in exercises {
                    bars_before += exercise.bars;
                    if position.completed_bars < bars_before {
                        return Tempo::Play {
                            bpm: clamp_bpm(exercise.bpm),
                            time_signature: exercise.time_signature,
                        };
                    }
                }
                Tempo::Finished
            }
        }
    }

    /// One program of each kind, with the parameters a new session starts from.
    pub fn defaults() -> [TempoProgram; 5] {
        [
            TempoProgram::Constant,
            TempoProgram::Accelerando { start_bpm: 80.0, end_bpm: 160.0, duration_secs: 60.0 },
            TempoProgram::Ritardando { start_bpm: 160.0, end_bpm: 80.0, duration_secs: 60.0 },
            TempoProgram::Steps { start_bpm: 80.0, end_bpm: 160.0, step_bpm: 10.0, bars_per_step: 8 },
            TempoProgram::Plan { exercises: Vec::new() },
        ]
    }

    /// The default program carrying `label`.
    pub fn from_label(label: &str) -> Option<TempoProgram> {
        Self::defaults().into_iter().find(|program| program.label() == label)
    }

    /// Short label for the front end.
    pub fn label(&self) -> &'static str {
        match self {
            TempoProgram::Constant => "Constant",
            TempoProgram::Accelerando { .. } => "Accelerando",
            TempoProgram::Ritardando { .. } => "Ritardando",
            TempoProgram::Steps { .. } => "Steps",
            TempoProgram::Plan { .. } => "Plan",
        }
    }
}
