//! # End and Tonehole Correction Module
//!
//! Two independent approximations of how far past its physical edge an open
//! end or open tonehole pushes the effective air column:
//!
//! - the **impedance** family, used by the forward solver to turn a hole
//!   position into a frequency;
//! - the **chain** correction `CF`, used by the algebraic solver while it walks
//!   from one hole to the next.
//!
//! They are not algebraically reconciled. Each calculator uses the family it
//! was calibrated with; do not substitute one for the other.
//!
//! All constants are empirically fitted calibration values, not derived.

use std::f64::consts::PI;

use crate::error::{SolverError, SolverResult};

/// Open-end correction per unit of bore diameter.
pub const END_CORRECTION_FACTOR: f64 = 0.61;
/// Open-hole end correction per unit of hole diameter.
pub const HOLE_END_CORRECTION_FACTOR: f64 = 0.6;
/// Open-hole end correction per unit of wall thickness.
pub const WALL_END_CORRECTION_FACTOR: f64 = 0.5;
/// Exponent scale of the impedance factor.
pub const IMPEDANCE_EXPONENT: f64 = 3.0;
/// Length stretch applied when a hole does not fully truncate the wave.
pub const IMPEDANCE_STRETCH: f64 = 0.3;
/// Share of the hole diameter added to the wall to get the effective chimney.
pub const CHIMNEY_HOLE_FACTOR: f64 = 0.75;

/// End correction of the open foot of the tube, same unit as `bore_diameter`.
pub fn end_correction(bore_diameter: f64) -> f64 {
    END_CORRECTION_FACTOR * bore_diameter
}

/// End correction contributed by an open tonehole, same unit as the inputs.
pub fn open_hole_end_correction(hole_diameter: f64, wall_thickness: f64) -> f64 {
    HOLE_END_CORRECTION_FACTOR * hole_diameter + wall_thickness * WALL_END_CORRECTION_FACTOR
}

/// Hole area over bore area.
pub fn area_ratio(hole_diameter: f64, bore_diameter: f64) -> f64 {
    let hole_area = PI * (hole_diameter / 2.0).powi(2);
    let bore_area = PI * (bore_diameter / 2.0).powi(2);
    hole_area / bore_area
}

/// How completely a hole truncates the standing wave, from 0 (closed) toward
/// 1 (as good as an open end).
pub fn impedance_factor(hole_diameter: f64, bore_diameter: f64) -> f64 {
    1.0 - (-IMPEDANCE_EXPONENT * area_ratio(hole_diameter, bore_diameter)).exp()
}

/// Stretches an acoustic length for a hole that only partly opens the bore.
pub fn impedance_corrected_length(acoustic_length: f64, impedance_factor: f64) -> f64 {
    acoustic_length * (1.0 + (1.0 - impedance_factor) * IMPEDANCE_STRETCH)
}

/// Effective chimney height `Te` of a tonehole.
pub fn effective_chimney(wall_thickness: f64, hole_diameter: f64) -> f64 {
    wall_thickness + CHIMNEY_HOLE_FACTOR * hole_diameter
}

/// Tonehole correction `CF` between two successive target lengths of the
/// algebraic chain (mm).
///
/// # Arguments
/// * `previous_length` - Carried acoustic length of the hole below
/// * `new_length` - Target acoustic length of this hole
/// * `hole_diameter`, `bore_diameter`, `wall_thickness` - Geometry in mm
///
/// # Errors
/// `NonIncreasingIntervals` when `new_length` is not shorter than
/// `previous_length`; the half-delta must be positive.
pub fn chain_hole_correction(
    previous_length: f64,
    new_length: f64,
    hole_diameter: f64,
    bore_diameter: f64,
    wall_thickness: f64,
) -> SolverResult<f64> {
    let half_delta = (previous_length - new_length) / 2.0;
    if !(half_delta > 0.0) {
        return Err(SolverError::NonIncreasingIntervals { index: 0 });
    }
    let te = effective_chimney(wall_thickness, hole_diameter);
    let diameter_ratio = (bore_diameter / hole_diameter).powi(2);
    Ok(half_delta * (((te / half_delta) * diameter_ratio * 2.0 + 1.0).sqrt() - 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_end_is_proportional_to_bore() {
        assert!((end_correction(20.0) - 12.2).abs() < 1e-12);
        assert!((end_correction(0.020) - 0.0122).abs() < 1e-12);
    }

    #[test]
    fn impedance_factor_grows_with_hole_size() {
        let small = impedance_factor(5.0, 19.0);
        let large = impedance_factor(15.0, 19.0);
        assert!(small > 0.0 && small < large && large < 1.0);
        // A hole as wide as the bore behaves almost like an open end.
        assert!(impedance_factor(19.0, 19.0) > 0.9);
    }

    #[test]
    fn corrected_length_stretches_for_small_holes() {
        let factor = impedance_factor(10.0, 19.0);
        let stretched = impedance_corrected_length(0.4, factor);
        assert!(stretched > 0.4);
        assert!((impedance_corrected_length(0.4, 1.0) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn chain_correction_matches_hand_computation() {
        // 650 mm flute, first traditional hole.
        let cf = chain_hole_correction(688.0, 611.6, 10.0, 20.5, 3.375).unwrap();
        assert!((cf - 32.2).abs() < 0.2, "got {cf}");
    }

    #[test]
    fn chain_correction_rejects_rising_length() {
        assert!(chain_hole_correction(400.0, 400.0, 10.0, 19.0, 4.0).is_err());
        assert!(chain_hole_correction(400.0, 420.0, 10.0, 19.0, 4.0).is_err());
    }
}
