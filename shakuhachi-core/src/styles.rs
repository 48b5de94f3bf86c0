//! # Tuning Style Registry
//!
//! Every calculator is a configuration over the shared solver functions:
//! which strategy places the holes, how many holes there are, which length
//! range is accepted and how the flute length is classified.
//!
//! The registry is built once on first use and never mutated.

use once_cell::sync::Lazy;

use crate::error::{SolverError, SolverResult};
use crate::geometry::{DIATONIC_LIMITS, GeometryLimits, STANDARD_LIMITS};
use crate::inverse::{Interval, Placement};
use crate::spans::{FIVE_HOLE, HoleLayout, SEVEN_HOLE};

/// Pitches a five-hole flute is meant to play above its fundamental,
/// bottom hole first.
pub const FIVE_HOLE_SEMITONES: [f64; 5] = [3.0, 5.0, 7.0, 10.0, 12.0];

/// Frequency ratios of the traditional algebraic layout.
pub const TRADITIONAL_RATIOS: [f64; 5] = [1.125, 1.25, 1.5, 1.6875, 1.898];

/// Semitone pattern of the seven-hole diatonic layout. The two single
/// semitone steps keep spans 1-2 and 5-6 short.
pub const DIATONIC_SEMITONES: [f64; 7] = [2.0, 3.0, 5.0, 7.0, 9.0, 10.0, 12.0];

/// How a style places its holes.
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    /// Algebraic chain over target intervals, bottom hole first.
    Chain { intervals: Vec<Interval> },
    /// Empirical fractions of the length, bottom hole first. `intended`
    /// holds the pitches the placements aim at, for deviation reporting.
    Percentage { placements: Vec<Placement>, intended: Vec<Interval> },
}

/// How the length class of a flute is named.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    ByFrequency,
    ByLength,
}

/// A named, read-only hole-placement recipe.
#[derive(Debug, Clone, PartialEq)]
pub struct TuningStyle {
    pub key: &'static str,
    pub name: &'static str,
    pub strategy: Strategy,
    pub layout: HoleLayout,
    pub limits: GeometryLimits,
    pub classification: Classification,
}

impl TuningStyle {
    pub fn is_percentage(&self) -> bool {
        matches!(self.strategy, Strategy::Percentage { .. })
    }
}

fn percentage_style(key: &'static str, name: &'static str, placements: [Placement; 5]) -> TuningStyle {
    TuningStyle {
        key,
        name,
        strategy: Strategy::Percentage {
            placements: placements.to_vec(),
            intended: FIVE_HOLE_SEMITONES.into_iter().map(Interval::Semitones).collect(),
        },
        layout: FIVE_HOLE,
        limits: STANDARD_LIMITS,
        classification: Classification::ByFrequency,
    }
}

/// Five empirical fractions, bottom hole first, with no offsets.
fn fractions(values: [f64; 5]) -> [Placement; 5] {
    values.map(Placement::at)
}

static STYLES: Lazy<Vec<TuningStyle>> = Lazy::new(|| {
    vec![
        TuningStyle {
            key: "traditional",
            name: "Traditional",
            strategy: Strategy::Chain {
                intervals: TRADITIONAL_RATIOS.into_iter().map(Interval::Ratio).collect(),
            },
            layout: FIVE_HOLE,
            limits: STANDARD_LIMITS,
            classification: Classification::ByFrequency,
        },
        TuningStyle {
            key: "diatonic",
            name: "Diatonic",
            strategy: Strategy::Chain {
                intervals: DIATONIC_SEMITONES.into_iter().map(Interval::Semitones).collect(),
            },
            layout: SEVEN_HOLE,
            limits: DIATONIC_LIMITS,
            classification: Classification::ByLength,
        },
        percentage_style(
            "nelson-zink",
            "Nelson Zink - Navaching.com",
            fractions([0.785, 0.688, 0.603, 0.488, 0.427]),
        ),
        percentage_style("john-neptune", "John Neptune", fractions([0.790, 0.690, 0.590, 0.485, 0.420])),
        percentage_style("ken-lacosse", "Ken LaCosse", fractions([0.778, 0.678, 0.578, 0.478, 0.412])),
        percentage_style("atsuya-okuda", "Atsuya Okuda", fractions([0.778, 0.678, 0.578, 0.478, 0.412])),
        percentage_style(
            "yamaguchi-shugetsu",
            "Yamaguchi - Shugetsu",
            fractions([0.778, 0.686, 0.589, 0.475, 0.408]),
        ),
        percentage_style("nishimura-koku", "Nishimura Koku", fractions([0.787, 0.683, 0.581, 0.467, 0.408])),
        percentage_style(
            "kodama-youtube1",
            "Kodama Hiroyuki - YouTube 1",
            [
                Placement::at(0.779),
                Placement::with_offset(0.679, -1.0),
                Placement::at(0.579),
                Placement::with_offset(0.479, -2.5),
                Placement::with_offset(0.404, -2.5),
            ],
        ),
        percentage_style(
            "kodama-hoian2",
            "Kodama Hiroyuki - Hoi An 2",
            [
                Placement::at(0.779),
                Placement::at(0.679),
                Placement::with_offset(0.579, 1.0),
                Placement::with_offset(0.479, -1.0),
                Placement::with_offset(0.394, -1.0),
            ],
        ),
    ]
});

/// All registered styles, in display order.
pub fn styles() -> &'static [TuningStyle] {
    &STYLES
}

/// Only the empirical percentage styles.
pub fn percentage_styles() -> impl Iterator<Item = &'static TuningStyle> {
    styles().iter().filter(|style| style.is_percentage())
}

/// Looks a style up by key. Unknown keys are an error, never a default.
pub fn find_style(key: &str) -> SolverResult<&'static TuningStyle> {
    styles()
        .iter()
        .find(|style| style.key == key)
        .ok_or_else(|| SolverError::UnknownStyle(key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_keys_are_unique() {
        let mut keys: Vec<_> = styles().iter().map(|s| s.key).collect();
        let total = keys.len();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), total);
        assert_eq!(total, 10);
    }

    #[test]
    fn every_style_matches_its_layout() {
        for style in styles() {
            let holes = match &style.strategy {
                Strategy::Chain { intervals } => intervals.len(),
                Strategy::Percentage { placements, intended } => {
                    assert_eq!(placements.len(), intended.len(), "{}", style.key);
                    placements.len()
                }
            };
            assert_eq!(holes, style.layout.holes, "{}", style.key);
        }
    }

    #[test]
    fn percentage_fractions_rise_toward_the_foot() {
        for style in percentage_styles() {
            let Strategy::Percentage { placements, .. } = &style.strategy else {
                unreachable!()
            };
            for pair in placements.windows(2) {
                assert!(pair[0].fraction > pair[1].fraction, "{}", style.key);
            }
        }
        assert_eq!(percentage_styles().count(), 8);
    }

    #[test]
    fn unknown_key_is_an_error() {
        assert_eq!(find_style("sankyoku"), Err(SolverError::UnknownStyle("sankyoku".into())));
        assert_eq!(find_style("diatonic").map(|s| s.layout.holes), Ok(7));
    }
}
