//! # Span and Ergonomics Module
//!
//! Measures the distance between adjacent holes and proposes alternate
//! positions where a span is wider than a hand can comfortably cover.
//!
//! ## Rules
//! - The thumb may reach two thirds of the limit; when it cannot, the thumb
//!   hole moves toward its neighbour.
//! - A checked front span may reach the full limit; when it cannot, the lower
//!   hole of the pair moves up.
//! - The span where the two hands meet is measured but never checked.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

/// Share of the ergonomic limit the thumb can cover.
pub const THUMB_REACH_FACTOR: f64 = 2.0 / 3.0;

/// Which rule applies to a pair of adjacent holes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpanCheck {
    /// Thumb hole to the top front hole.
    Thumb,
    /// Two fingers of the same hand.
    Reach,
    /// Where the hands change; measured only.
    Unchecked,
}

/// A pair of adjacent holes, by hole number (1 = bottom).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SpanKey {
    pub upper: usize,
    pub lower: usize,
}

impl fmt::Display for SpanKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.upper, self.lower)
    }
}

impl Serialize for SpanKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The rule for one adjacent pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanRule {
    pub key: SpanKey,
    pub check: SpanCheck,
}

const fn rule(upper: usize, lower: usize, check: SpanCheck) -> SpanRule {
    SpanRule { key: SpanKey { upper, lower }, check }
}

/// Hole count and span rules of one instrument family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoleLayout {
    /// Number of holes; the highest-numbered one is the thumb hole.
    pub holes: usize,
    pub rules: &'static [SpanRule],
}

impl HoleLayout {
    /// Hole number of the thumb hole.
    pub fn thumb(&self) -> usize {
        self.holes
    }
}

/// Four front holes and a thumb hole; the hands change between 3 and 2.
pub const FIVE_HOLE: HoleLayout = HoleLayout {
    holes: 5,
    rules: &[
        rule(5, 4, SpanCheck::Thumb),
        rule(4, 3, SpanCheck::Reach),
        rule(3, 2, SpanCheck::Unchecked),
        rule(2, 1, SpanCheck::Reach),
    ],
};

/// Six front holes and a thumb hole; the hands change between 4 and 3.
pub const SEVEN_HOLE: HoleLayout = HoleLayout {
    holes: 7,
    rules: &[
        rule(7, 6, SpanCheck::Thumb),
        rule(6, 5, SpanCheck::Reach),
        rule(5, 4, SpanCheck::Reach),
        rule(4, 3, SpanCheck::Unchecked),
        rule(3, 2, SpanCheck::Reach),
        rule(2, 1, SpanCheck::Reach),
    ],
};

/// A span wider than its rule allows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpanViolation {
    pub span: SpanKey,
    pub distance: f64,
    pub allowed: f64,
    /// The hole that should move.
    pub moved_hole: usize,
    pub alternate_position: f64,
}

/// Measured spans and proposed fixes for one set of positions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpanReport {
    /// Every adjacent distance (mm), keyed "upper-lower".
    pub spans: BTreeMap<SpanKey, f64>,
    /// Alternate position (mm) per hole number.
    pub alternates: BTreeMap<usize, f64>,
    pub violations: Vec<SpanViolation>,
}

impl SpanReport {
    pub fn alternate_for(&self, hole: usize) -> Option<f64> {
        self.alternates.get(&hole).copied()
    }
}

/// Measures adjacent spans and proposes alternates for the ones out of reach.
///
/// # Arguments
/// * `positions` - Hole positions in mm, bottom hole first (index = hole − 1)
/// * `layout` - Which spans are checked and which hole moves
/// * `limit` - Ergonomic reach limit in mm
pub fn check_spans(positions: &[f64], layout: &HoleLayout, limit: f64) -> SpanReport {
    let mut report = SpanReport::default();
    let thumb_reach = limit * THUMB_REACH_FACTOR;

    for rule in layout.rules {
        let (Some(&upper), Some(&lower)) =
            (positions.get(rule.key.upper - 1), positions.get(rule.key.lower - 1))
        else {
            continue;
        };
        let distance = (lower - upper).abs();
        report.spans.insert(rule.key, distance);

        let violation = match rule.check {
            SpanCheck::Thumb if distance > thumb_reach => Some(SpanViolation {
                span: rule.key,
                distance,
                allowed: thumb_reach,
                moved_hole: rule.key.upper,
                alternate_position: lower - thumb_reach.round(),
            }),
            SpanCheck::Reach if distance > limit => Some(SpanViolation {
                span: rule.key,
                distance,
                allowed: limit,
                moved_hole: rule.key.lower,
                alternate_position: (upper + limit).round(),
            }),
            _ => None,
        };

        if let Some(violation) = violation {
            log::debug!(
                "[CALC] span {} is {:.1} mm (allowed {:.1}); hole {} -> {} mm",
                violation.span,
                violation.distance,
                violation.allowed,
                violation.moved_hole,
                violation.alternate_position
            );
            report.alternates.insert(violation.moved_hole, violation.alternate_position);
            report.violations.push(violation);
        }
    }
    report
}
