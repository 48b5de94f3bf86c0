//! Forward solver: the frequency a flute sounds with the given hole open.

use crate::correction::{impedance_corrected_length, impedance_factor, open_hole_end_correction};
use crate::environment::{EnvironmentalConditions, SpeedModel};
use crate::error::{SolverError, SolverResult};
use crate::geometry::FluteGeometry;

/// Corrected lengths at or below this (m) cannot resonate.
pub const MIN_ACOUSTIC_LENGTH_M: f64 = 1e-6;

/// Sounding frequency (Hz) with the hole at `position_mm` open.
///
/// The tube is treated as open at the hole: the acoustic length is the
/// distance from the blowing edge plus the open-hole end correction, then
/// stretched by how incompletely the hole truncates the bore.
///
/// # Arguments
/// * `position_mm` - Hole centre, measured from the blowing end
/// * `geometry` - Flute dimensions (hole, bore and wall are used)
/// * `environment` - Room conditions for the speed of sound
///
/// # Errors
/// * `OutOfRange` / `Degenerate` for room conditions or diameters outside
///   their domain
/// * `AcousticLength` when the corrected length is not finite or too short
pub fn frequency_at(
    position_mm: f64,
    geometry: &FluteGeometry,
    environment: &EnvironmentalConditions,
) -> SolverResult<f64> {
    environment.validate()?;
    SolverError::ensure_positive("hole_diameter", geometry.hole_diameter)?;
    SolverError::ensure_positive("bore_diameter", geometry.bore_diameter)?;
    SolverError::ensure_positive("wall_thickness", geometry.wall_thickness)?;

    let speed = environment.speed_of_sound(SpeedModel::HumidAir);

    let position = position_mm / 1000.0;
    let hole = geometry.hole_diameter / 1000.0;
    let bore = geometry.bore_diameter / 1000.0;
    let wall = geometry.wall_thickness / 1000.0;

    let acoustic_length = position + open_hole_end_correction(hole, wall);
    let corrected = impedance_corrected_length(acoustic_length, impedance_factor(hole, bore));

    if !corrected.is_finite() || corrected <= MIN_ACOUSTIC_LENGTH_M {
        return Err(SolverError::AcousticLength { length_m: corrected });
    }
    Ok(speed / (2.0 * corrected))
}
