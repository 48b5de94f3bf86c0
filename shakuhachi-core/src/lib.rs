// shakuhachi-core/src/lib.rs

//! The core logic for the shakuhachi workshop.
//! This crate places finger holes on end-blown flutes, checks them against
//! the player's reach, analyses the standing waves of the bore, and drives
//! the practice metronome. It is completely headless and contains no GUI code.

pub mod audio;
pub mod calculator;
pub mod correction;
pub mod environment;
pub mod error;
pub mod forward;
pub mod geometry;
pub mod inverse;
pub mod metronome;
pub mod resonance;
pub mod spans;
pub mod styles;
pub mod tuning;

use serde::Serialize;

use crate::environment::EnvironmentalConditions;
use crate::geometry::FluteGeometry;
use crate::spans::SpanReport;
use crate::tuning::PitchName;

pub use crate::calculator::{calculate, calculate_by_key, compare_styles};
pub use crate::error::{SolverError, SolverResult};

/// One finger hole of a calculated flute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HolePosition {
    /// 1 is the bottom-most front hole; numbers rise toward the blowing end.
    pub hole: usize,
    /// The top hole is played with the thumb, on the back of the flute.
    pub is_thumb: bool,
    /// Distance from the blowing end in whole mm.
    pub position: f64,
    /// Frequency shown for this hole in Hz (2 dp): the target of an
    /// algebraic style, the modelled pitch of a percentage style.
    pub frequency: f64,
    /// Name of `frequency` against the reference pitch.
    pub note: PitchName,
    /// The pitch the hole is meant to play (2 dp).
    pub intended_frequency: f64,
    /// What the forward solver says the hole plays (2 dp). `None` when the
    /// position lies outside the flute or is too far out to resonate.
    pub modelled_frequency: Option<f64>,
    /// Modelled against intended, in whole cents. `None` with no model.
    pub deviation_cents: Option<i32>,
    /// Where the hole should go if its span is out of reach.
    pub alternate_position: Option<f64>,
    /// The position lies outside the flute.
    pub error: bool,
}

/// The full result of one calculation, built in one pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationResult {
    pub style_key: String,
    pub style_name: String,
    pub geometry: FluteGeometry,
    pub environment: EnvironmentalConditions,
    /// Fundamental with every hole closed, Hz (2 dp).
    pub base_frequency: f64,
    pub base_note: PitchName,
    /// Traditional length class in shaku, e.g. "1.8".
    pub length_class: String,
    /// Length over bore (2 dp).
    pub aspect_ratio: f64,
    /// Speed of sound used by the forward solver, m/s.
    pub speed_of_sound: f64,
    /// Bottom hole first.
    pub holes: Vec<HolePosition>,
    pub spans: SpanReport,
}

impl CalculationResult {
    /// Holes whose position lies outside the flute.
    pub fn infeasible_holes(&self) -> impl Iterator<Item = &HolePosition> {
        self.holes.iter().filter(|hole| hole.error)
    }

    pub fn has_violations(&self) -> bool {
        !self.spans.violations.is_empty()
    }
}
