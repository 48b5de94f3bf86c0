//! # Resonance Analysis Module
//!
//! Standing-wave modes of the bore treated as a cylinder open at both ends,
//! and the small pitch shifts each open hole adds to a mode.
//!
//! ## Features
//! - Harmonic frequencies, wavelengths, pressure nodes and velocity antinodes
//! - A coupling-based quality factor per mode
//! - Per-hole micro-tuning suggestions against the nearest pressure node
//!
//! This analysis runs on the linear speed-of-sound model.

use serde::Serialize;

use crate::CalculationResult;
use crate::correction::{END_CORRECTION_FACTOR, area_ratio};
use crate::environment::{EnvironmentalConditions, SpeedModel};
use crate::error::{SolverError, SolverResult};
use crate::geometry::FluteGeometry;
use crate::tuning::cents;

/// Wall thickness contribution to the effective length, per mm of wall (m).
pub const WALL_LENGTH_FACTOR: f64 = 0.0003;
/// Quality factor of a bore with no holes.
pub const BASE_QUALITY: f64 = 50.0;
/// Weight of the summed hole coupling in the quality factor.
pub const COUPLING_WEIGHT: f64 = 0.01;
/// Distance (mm) at which a hole's influence on a node halves.
pub const NODE_INFLUENCE_MM: f64 = 10.0;
/// Scale of the frequency shift caused by one open hole.
pub const SHIFT_SCALE: f64 = 0.1;
/// Shifts at or below this many cents need no correction.
pub const CENTS_TOLERANCE: f64 = 5.0;
/// Suggested hole movement per cent of shift (mm).
pub const MM_PER_CENT: f64 = 0.1;

/// A hole as seen by the resonance analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HoleSpec {
    pub position_mm: f64,
    pub diameter_mm: f64,
}

impl HoleSpec {
    /// The holes of a calculated flute, bottom first.
    pub fn from_result(result: &CalculationResult) -> Vec<HoleSpec> {
        result
            .holes
            .iter()
            .map(|hole| HoleSpec { position_mm: hole.position, diameter_mm: result.geometry.hole_diameter })
            .collect()
    }
}

/// One harmonic of the bore.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResonanceMode {
    /// 1 for the fundamental.
    pub harmonic: u32,
    pub frequency: f64,
    /// Wavelength in metres.
    pub wavelength: f64,
    /// Pressure node positions from the blowing end (mm), both ends included.
    pub pressure_nodes: Vec<f64>,
    /// Velocity antinodes (mm), midway between pressure nodes.
    pub velocity_antinodes: Vec<f64>,
    pub quality_factor: f64,
}

/// Acoustic length of the bore in metres.
pub fn effective_length(geometry: &FluteGeometry) -> f64 {
    geometry.length / 1000.0
        + END_CORRECTION_FACTOR * geometry.bore_diameter / 1000.0
        + geometry.wall_thickness * WALL_LENGTH_FACTOR
}

/// Quality factor of the bore given the holes cut into it.
pub fn quality_factor(holes: &[HoleSpec]) -> f64 {
    let coupling: f64 = holes
        .iter()
        .filter(|hole| hole.position_mm > 0.0)
        .map(|hole| hole.diameter_mm.powi(2) / hole.position_mm.powi(2))
        .sum();
    BASE_QUALITY / (1.0 + coupling * COUPLING_WEIGHT)
}

/// The first `count` modes of the bore.
///
/// # Arguments
/// * `geometry` - Flute dimensions (length, bore and wall are used)
/// * `env` - Room conditions
/// * `holes` - Open holes, for the quality factor
/// * `count` - Number of harmonics, starting at the fundamental
pub fn resonance_modes(
    geometry: &FluteGeometry,
    env: &EnvironmentalConditions,
    holes: &[HoleSpec],
    count: u32,
) -> SolverResult<Vec<ResonanceMode>> {
    SolverError::ensure_positive("length", geometry.length)?;
    SolverError::ensure_positive("bore_diameter", geometry.bore_diameter)?;
    env.validate()?;

    let speed = env.speed_of_sound(SpeedModel::LinearApprox);
    let length = effective_length(geometry);
    let quality = quality_factor(holes);

    let modes = (1..=count)
        .map(|harmonic| {
            let n = harmonic as f64;
            let frequency = n * speed / (2.0 * length);
            let pressure_nodes = (0..=harmonic).map(|i| i as f64 * length / n * 1000.0).collect();
            let velocity_antinodes = (0..harmonic).map(|i| (i as f64 + 0.5) * length / n * 1000.0).collect();
            ResonanceMode {
                harmonic,
                frequency,
                wavelength: speed / frequency,
                pressure_nodes,
                velocity_antinodes,
                quality_factor: quality,
            }
        })
        .collect();
    Ok(modes)
}

/// What one open hole does to a mode, and how to correct it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MicrotuningAdvice {
    pub hole: usize,
    pub position_mm: f64,
    pub nearest_node_mm: f64,
    pub node_distance_mm: f64,
    pub area_ratio: f64,
    pub position_factor: f64,
    pub frequency_shift: f64,
    pub cents_shift: f64,
    /// Signed like `cents_shift`; zero when the shift is within tolerance.
    /// 0.1 mm resolution.
    pub suggested_movement_mm: f64,
}

/// Micro-tuning advice for every hole against one mode.
pub fn microtuning(mode: &ResonanceMode, holes: &[HoleSpec], geometry: &FluteGeometry) -> Vec<MicrotuningAdvice> {
    holes
        .iter()
        .enumerate()
        .map(|(index, hole)| {
            let nearest_node_mm = mode
                .pressure_nodes
                .iter()
                .copied()
                .min_by(|a, b| (a - hole.position_mm).abs().total_cmp(&(b - hole.position_mm).abs()))
                .unwrap_or(0.0);
            let node_distance_mm = (nearest_node_mm - hole.position_mm).abs();

            let ratio = area_ratio(hole.diameter_mm, geometry.bore_diameter);
            let position_factor = 1.0 / (1.0 + node_distance_mm / NODE_INFLUENCE_MM);
            let frequency_shift = mode.frequency * ratio * position_factor * SHIFT_SCALE;
            let cents_shift = cents(mode.frequency + frequency_shift, mode.frequency);

            let movement = if cents_shift.abs() > CENTS_TOLERANCE {
                cents_shift.abs() * MM_PER_CENT * cents_shift.signum()
            } else {
                0.0
            };

            MicrotuningAdvice {
                hole: index + 1,
                position_mm: hole.position_mm,
                nearest_node_mm,
                node_distance_mm,
                area_ratio: ratio,
                position_factor,
                frequency_shift,
                cents_shift,
                suggested_movement_mm: (movement * 10.0).round() / 10.0,
            }
        })
        .collect()
}
