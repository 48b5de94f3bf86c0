//! # Calculator Module
//!
//! Runs a `TuningStyle` end to end: validate, place the holes, model their
//! pitch, name it, check the spans, and assemble a `CalculationResult`.

use log::debug;
use serde::Serialize;

use crate::environment::{EnvironmentalConditions, SpeedModel};
use crate::error::{SolverError, SolverResult};
use crate::forward::frequency_at;
use crate::geometry::FluteGeometry;
use crate::inverse::{base_frequency, solve_chain};
use crate::spans::{SpanReport, check_spans};
use crate::styles::{Classification, Strategy, TuningStyle, find_style, percentage_styles};
use crate::tuning::{cents, classify_by_frequency, classify_by_length, note_name};
use crate::{CalculationResult, HolePosition};

/// Rounds to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Forward-modelled frequency, or `None` when the position cannot resonate.
fn modelled(position: f64, geometry: &FluteGeometry, env: &EnvironmentalConditions) -> SolverResult<Option<f64>> {
    match frequency_at(position, geometry, env) {
        Ok(frequency) => Ok(Some(frequency)),
        Err(SolverError::AcousticLength { length_m }) => {
            debug!("[CALC] hole at {position} mm does not resonate (L = {length_m} m)");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Builds the hole rows from `(position, intended frequency)` pairs, bottom
/// hole first. A hole outside the flute is flagged and left unmodelled; the
/// rest are still reported.
fn assemble_holes(
    placed: &[(f64, f64)],
    style: &TuningStyle,
    geometry: &FluteGeometry,
    env: &EnvironmentalConditions,
    spans: &SpanReport,
) -> SolverResult<Vec<HolePosition>> {
    let mut holes = Vec::with_capacity(placed.len());
    for (index, &(position, intended)) in placed.iter().enumerate() {
        let hole = index + 1;
        let error = position <= 0.0 || position > geometry.length;
        let modelled_frequency = if error { None } else { modelled(position, geometry, env)? };
        let frequency = match (&style.strategy, modelled_frequency) {
            (Strategy::Percentage { .. }, Some(modelled)) => modelled,
            _ => intended,
        };

        holes.push(HolePosition {
            hole,
            is_thumb: hole == style.layout.thumb(),
            position,
            frequency: round2(frequency),
            note: note_name(frequency, env.reference_pitch),
            intended_frequency: round2(intended),
            modelled_frequency: modelled_frequency.map(round2),
            deviation_cents: modelled_frequency.map(|m| cents(m, intended).round() as i32),
            alternate_position: spans.alternate_for(hole),
            error,
        });
    }
    Ok(holes)
}

/// Calculates hole positions for `style` on `geometry`.
///
/// # Arguments
/// * `geometry` - Flute dimensions, validated against the style's ranges
/// * `env` - Room conditions and reference pitch
/// * `style` - The placement recipe
///
/// # Returns
/// * `Ok(result)` - Holes bottom first, spans and alternates
/// * `Err(e)` - Invalid input; infeasible holes are flagged, not errors
pub fn calculate(
    geometry: &FluteGeometry,
    env: &EnvironmentalConditions,
    style: &TuningStyle,
) -> SolverResult<CalculationResult> {
    geometry.validate(&style.limits)?;
    env.validate()?;

    let fundamental = base_frequency(geometry.length);

    // (position, intended frequency), bottom hole first.
    let placed: Vec<(f64, f64)> = match &style.strategy {
        Strategy::Chain { intervals } => solve_chain(geometry, intervals)?
            .into_iter()
            .map(|hole| (hole.position, hole.target_frequency))
            .collect(),
        Strategy::Percentage { placements, intended } => placements
            .iter()
            .zip(intended)
            .map(|(placement, interval)| (placement.position(geometry.length), fundamental * interval.ratio()))
            .collect(),
    };

    let positions: Vec<f64> = placed.iter().map(|&(position, _)| position).collect();
    let spans = check_spans(&positions, &style.layout, geometry.ergonomic_limit);

    let holes = assemble_holes(&placed, style, geometry, env, &spans)?;

    let length_class = match style.classification {
        Classification::ByFrequency => classify_by_frequency(fundamental),
        Classification::ByLength => classify_by_length(geometry.length),
    };

    debug!(
        "[CALC] {} on {} mm: positions {:?}, {} violation(s)",
        style.key,
        geometry.length,
        positions,
        spans.violations.len()
    );

    Ok(CalculationResult {
        style_key: style.key.to_string(),
        style_name: style.name.to_string(),
        geometry: *geometry,
        environment: *env,
        base_frequency: round2(fundamental),
        base_note: note_name(fundamental, env.reference_pitch),
        length_class,
        aspect_ratio: round2(geometry.aspect_ratio()),
        speed_of_sound: env.speed_of_sound(SpeedModel::HumidAir),
        holes,
        spans,
    })
}

/// Looks the style up by key, then calculates.
pub fn calculate_by_key(
    geometry: &FluteGeometry,
    env: &EnvironmentalConditions,
    key: &str,
) -> SolverResult<CalculationResult> {
    calculate(geometry, env, find_style(key)?)
}

/// One row of the side-by-side style table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleComparison {
    pub style_key: String,
    pub style_name: String,
    /// Bottom hole first.
    pub holes: Vec<HolePosition>,
}

/// Runs every percentage style on the same flute.
pub fn compare_styles(
    geometry: &FluteGeometry,
    env: &EnvironmentalConditions,
) -> SolverResult<Vec<StyleComparison>> {
    percentage_styles()
        .map(|style| {
            let result = calculate(geometry, env, style)?;
            Ok(StyleComparison {
                style_key: result.style_key,
                style_name: result.style_name,
                holes: result.holes,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn positions(result: &CalculationResult) -> Vec<f64> {
        result.holes.iter().map(|h| h.position).collect()
    }

    #[test]
    fn traditional_result() {
        let geometry = FluteGeometry::new(650.0, 20.5, 3.375, 10.0, 60.0);
        let result = calculate_by_key(&geometry, &EnvironmentalConditions::default(), "traditional").unwrap();
        assert_eq!(positions(&result), vec![548.0, 485.0, 391.0, 343.0, 298.0]);
        assert_eq!(result.base_frequency, 240.8);
        assert_eq!(result.length_class, "2.3");
        assert_eq!(result.aspect_ratio, 31.71);
        assert!(result.holes[4].is_thumb);
        assert!(result.holes.iter().all(|h| !h.error));
        // Algebraic styles report their target pitch.
        assert_eq!(result.holes[0].frequency, round2(156_521.0 / 650.0 * 1.125));
    }

    #[test]
    fn diatonic_result() {
        let result = calculate_by_key(&FluteGeometry::default(), &EnvironmentalConditions::default(), "diatonic")
            .unwrap();
        assert_eq!(result.holes.len(), 7);
        assert_eq!(result.length_class, "1.8");
        assert_eq!(result.base_note.to_string(), "D");
        assert_eq!(result.holes[6].note.to_string(), "D");
        assert!(result.holes[6].is_thumb);
        assert!(!result.has_violations());
    }

    #[test]
    fn percentage_result_reports_modelled_pitch() {
        let result = calculate_by_key(&FluteGeometry::default(), &EnvironmentalConditions::default(), "nelson-zink")
            .unwrap();
        assert_eq!(positions(&result), vec![424.0, 372.0, 326.0, 264.0, 231.0]);
        for hole in &result.holes {
            assert_eq!(Some(hole.frequency), hole.modelled_frequency);
            assert!(hole.deviation_cents.is_some());
        }
    }

    #[test]
    fn diatonic_accepts_short_flutes_traditional_does_not() {
        let geometry = FluteGeometry { length: 250.0, ..FluteGeometry::default() };
        let env = EnvironmentalConditions::default();
        assert!(calculate_by_key(&geometry, &env, "diatonic").is_ok());
        assert!(matches!(
            calculate_by_key(&geometry, &env, "traditional"),
            Err(SolverError::OutOfRange { field: "length", .. })
        ));
    }

    #[test]
    fn unknown_style_is_fatal() {
        let err = calculate_by_key(&FluteGeometry::default(), &EnvironmentalConditions::default(), "unknown")
            .unwrap_err();
        assert_eq!(err, SolverError::UnknownStyle("unknown".into()));
    }

    #[test]
    fn invalid_environment_is_rejected() {
        let env = EnvironmentalConditions { humidity: 120.0, ..Default::default() };
        assert!(calculate_by_key(&FluteGeometry::default(), &env, "traditional").is_err());
    }

    #[test]
    fn holes_outside_the_flute_are_flagged_and_unmodelled() {
        let style = find_style("nelson-zink").unwrap();
        let geometry = FluteGeometry::default();
        let env = EnvironmentalConditions::default();
        let placed = [(424.0, 300.0), (-5.0, 320.0), (326.0, 360.0), (264.0, 400.0), (560.0, 480.0)];
        let positions: Vec<f64> = placed.iter().map(|&(p, _)| p).collect();
        let spans = check_spans(&positions, &style.layout, geometry.ergonomic_limit);

        let holes = assemble_holes(&placed, style, &geometry, &env, &spans).unwrap();
        assert_eq!(holes.len(), 5);

        let flagged: Vec<usize> = holes.iter().filter(|h| h.error).map(|h| h.hole).collect();
        assert_eq!(flagged, vec![2, 5]);
        for hole in holes.iter().filter(|h| h.error) {
            assert_eq!(hole.modelled_frequency, None);
            assert_eq!(hole.deviation_cents, None);
            assert_eq!(hole.frequency, hole.intended_frequency);
        }
        for hole in holes.iter().filter(|h| !h.error) {
            assert!(hole.modelled_frequency.is_some(), "hole {}", hole.hole);
            assert!(hole.deviation_cents.is_some(), "hole {}", hole.hole);
        }
    }

    #[test]
    fn comparison_covers_every_percentage_style() {
        let rows = compare_styles(&FluteGeometry::default(), &EnvironmentalConditions::default()).unwrap();
        assert_eq!(rows.len(), 8);
        assert!(rows.iter().all(|row| row.holes.len() == 5));
        // Same fractions, same flute, same answer.
        let okuda = rows.iter().find(|r| r.style_key == "atsuya-okuda").unwrap();
        let lacosse = rows.iter().find(|r| r.style_key == "ken-lacosse").unwrap();
        assert_eq!(okuda.holes, lacosse.holes);
    }
}
