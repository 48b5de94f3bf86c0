//! # Inverse Solver Module
//!
//! Places finger holes for a set of target pitches or empirical proportions.
//!
//! ## Strategies
//! - **Algebraic chain**: walks up from the bottom hole, each step targeting
//!   the next interval above the fundamental and subtracting the tonehole
//!   correction of the step.
//! - **Empirical percentage**: each hole sits at a fixed fraction of the total
//!   length, optionally nudged by a few millimetres. Pitch is an output here.
//!
//! The two fundamental constants are calibration values fitted by flute
//! makers, not derived from first principles.

use serde::{Deserialize, Serialize};

use crate::correction::chain_hole_correction;
use crate::error::{SolverError, SolverResult};
use crate::geometry::FluteGeometry;

/// `F0 = FUNDAMENTAL_CONSTANT / length_mm`.
pub const FUNDAMENTAL_CONSTANT: f64 = 156_521.0;
/// `tube_length_mm = TUBE_LENGTH_CONSTANT / frequency`.
pub const TUBE_LENGTH_CONSTANT: f64 = 165_674.0;
/// Share of the bore diameter removed from the tube length at the mouth.
pub const MOUTH_BORE_FACTOR: f64 = 0.3;

/// A target pitch above the fundamental.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Interval {
    /// Equal-tempered semitones.
    Semitones(f64),
    /// A plain frequency ratio.
    Ratio(f64),
}

impl Interval {
    /// The interval as a frequency ratio.
    pub fn ratio(&self) -> f64 {
        match *self {
            Interval::Semitones(semitones) => 2.0_f64.powf(semitones / 12.0),
            Interval::Ratio(ratio) => ratio,
        }
    }
}

/// Fundamental (Hz) of a flute `length_mm` long.
pub fn base_frequency(length_mm: f64) -> f64 {
    FUNDAMENTAL_CONSTANT / length_mm
}

/// Sounding tube length (mm) for `frequency`.
pub fn tube_length(frequency: f64) -> f64 {
    TUBE_LENGTH_CONSTANT / frequency
}

/// Mouth end length: how much longer the sounding tube is than the flute.
pub fn mouth_end_length(geometry: &FluteGeometry) -> f64 {
    tube_length(base_frequency(geometry.length)) - MOUTH_BORE_FACTOR * geometry.bore_diameter
        - geometry.length
}

/// Whole millimetres; halves round up on the positive domain.
pub fn round_mm(value: f64) -> f64 {
    value.round()
}

/// One hole placed by the algebraic chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainHole {
    /// Position from the blowing end, whole mm. May be ≤ 0 on impossible
    /// geometries; callers flag it.
    pub position: f64,
    /// Frequency the hole was solved for (Hz).
    pub target_frequency: f64,
}

/// Places one hole per interval, bottom hole first.
///
/// # Arguments
/// * `geometry` - Flute dimensions (length, bore, wall and hole are used)
/// * `intervals` - Targets above the fundamental, strictly rising
///
/// # Errors
/// * `Degenerate` for non-positive dimensions
/// * `NonIncreasingIntervals` when an interval is not above unison or not
///   above its predecessor
pub fn solve_chain(geometry: &FluteGeometry, intervals: &[Interval]) -> SolverResult<Vec<ChainHole>> {
    SolverError::ensure_positive("length", geometry.length)?;
    SolverError::ensure_positive("bore_diameter", geometry.bore_diameter)?;
    SolverError::ensure_positive("hole_diameter", geometry.hole_diameter)?;
    SolverError::ensure_positive("wall_thickness", geometry.wall_thickness)?;

    let mut previous_ratio = 1.0;
    for (index, interval) in intervals.iter().enumerate() {
        let ratio = interval.ratio();
        if !ratio.is_finite() || ratio <= previous_ratio {
            return Err(SolverError::NonIncreasingIntervals { index });
        }
        previous_ratio = ratio;
    }

    let fundamental = base_frequency(geometry.length);
    let mouth = mouth_end_length(geometry);
    let mut carried = tube_length(fundamental);

    let mut holes = Vec::with_capacity(intervals.len());
    for (index, interval) in intervals.iter().enumerate() {
        let target_frequency = fundamental * interval.ratio();
        let new_length = tube_length(target_frequency);
        let correction = chain_hole_correction(
            carried,
            new_length,
            geometry.hole_diameter,
            geometry.bore_diameter,
            geometry.wall_thickness,
        )
        .map_err(|_| SolverError::NonIncreasingIntervals { index })?;

        holes.push(ChainHole {
            position: round_mm(new_length - mouth - correction),
            target_frequency,
        });
        carried = new_length + correction;
    }
    Ok(holes)
}

/// An empirical hole placement: a fraction of the length plus a fixed offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Fraction of the total length, measured from the blowing end.
    pub fraction: f64,
    /// Millimetres added after the fraction is applied.
    pub offset_mm: f64,
}

impl Placement {
    pub const fn at(fraction: f64) -> Self {
        Self { fraction, offset_mm: 0.0 }
    }

    pub const fn with_offset(fraction: f64, offset_mm: f64) -> Self {
        Self { fraction, offset_mm }
    }

    /// Hole position (whole mm) on a flute `length_mm` long.
    pub fn position(&self, length_mm: f64) -> f64 {
        round_mm(round_mm(length_mm * self.fraction) + self.offset_mm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn traditional_ratios() -> Vec<Interval> {
        [1.125, 1.25, 1.5, 1.6875, 1.898].into_iter().map(Interval::Ratio).collect()
    }

    fn diatonic_semitones() -> Vec<Interval> {
        [2.0, 3.0, 5.0, 7.0, 9.0, 10.0, 12.0].into_iter().map(Interval::Semitones).collect()
    }

    fn positions(holes: &[ChainHole]) -> Vec<f64> {
        holes.iter().map(|h| h.position).collect()
    }

    #[test]
    fn traditional_chain_on_650mm() {
        let geometry = FluteGeometry::new(650.0, 20.5, 3.375, 10.0, 60.0);
        let holes = solve_chain(&geometry, &traditional_ratios()).unwrap();
        assert_eq!(positions(&holes), vec![548.0, 485.0, 391.0, 343.0, 298.0]);
    }

    #[test]
    fn diatonic_chain_on_540mm() {
        let geometry = FluteGeometry::new(540.0, 19.0, 4.0, 10.0, 60.0);
        let holes = solve_chain(&geometry, &diatonic_semitones()).unwrap();
        assert_eq!(positions(&holes), vec![455.0, 427.0, 372.0, 326.0, 285.0, 268.0, 231.0]);
        let octave = holes[6].target_frequency / base_frequency(540.0);
        assert!((octave - 2.0).abs() < 1e-12);
    }

    #[test]
    fn positions_fall_as_intervals_rise() {
        for length in [300.0, 540.0, 800.0, 1300.0] {
            for bore in [10.0, 19.0, 40.0] {
                let geometry = FluteGeometry::new(length, bore, 4.0, 10.0, 60.0);
                let holes = solve_chain(&geometry, &diatonic_semitones()).unwrap();
                for pair in holes.windows(2) {
                    assert!(pair[1].position < pair[0].position, "{length}/{bore}: {pair:?}");
                }
            }
        }
    }

    #[test]
    fn rejects_non_rising_intervals() {
        let geometry = FluteGeometry::default();
        let flat = [Interval::Semitones(2.0), Interval::Semitones(2.0)];
        assert_eq!(solve_chain(&geometry, &flat), Err(SolverError::NonIncreasingIntervals { index: 1 }));

        let unison = [Interval::Ratio(1.0)];
        assert_eq!(solve_chain(&geometry, &unison), Err(SolverError::NonIncreasingIntervals { index: 0 }));

        let falling = [Interval::Ratio(1.5), Interval::Ratio(1.25)];
        assert_eq!(solve_chain(&geometry, &falling), Err(SolverError::NonIncreasingIntervals { index: 1 }));
    }

    #[test]
    fn rejects_degenerate_geometry() {
        let geometry = FluteGeometry { hole_diameter: 0.0, ..FluteGeometry::default() };
        assert!(matches!(
            solve_chain(&geometry, &diatonic_semitones()),
            Err(SolverError::Degenerate { field: "hole_diameter", .. })
        ));
    }

    #[test]
    fn placement_rounds_twice() {
        // 540 · 0.479 = 258.66 -> 259, minus 2.5 -> 256.5 -> 257.
        assert_eq!(Placement::with_offset(0.479, -2.5).position(540.0), 257.0);
        assert_eq!(Placement::at(0.785).position(540.0), 424.0);
    }
}
