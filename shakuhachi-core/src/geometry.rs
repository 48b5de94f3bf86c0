//! # Flute Geometry Module
//!
//! Physical dimensions of the instrument, all in millimetres, and the
//! per-calculator ranges they are validated against.

use serde::{Deserialize, Serialize};

use crate::error::{SolverError, SolverResult};

/// Accepted parameter ranges for one family of calculators (mm).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryLimits {
    pub length: (f64, f64),
    pub hole_diameter: (f64, f64),
    pub bore_diameter: (f64, f64),
    pub wall_thickness: (f64, f64),
    pub ergonomic_limit: (f64, f64),
}

/// Traditional and variation calculators.
pub const STANDARD_LIMITS: GeometryLimits = GeometryLimits {
    length: (300.0, 1300.0),
    hole_diameter: (5.0, 30.0),
    bore_diameter: (10.0, 100.0),
    wall_thickness: (1.0, 10.0),
    ergonomic_limit: (10.0, 180.0),
};

/// The diatonic calculator accepts much shorter tubes.
pub const DIATONIC_LIMITS: GeometryLimits = GeometryLimits {
    length: (30.0, 1000.0),
    ..STANDARD_LIMITS
};

impl GeometryLimits {
    /// Clamps every field of `geometry` into these ranges.
    ///
    /// The front end uses this so sliders and typed values can never leave
    /// the accepted domain; the core still validates on its own.
    pub fn clamp(&self, geometry: FluteGeometry) -> FluteGeometry {
        let clamp = |value: f64, (min, max): (f64, f64)| {
            if value.is_finite() { value.clamp(min, max) } else { min }
        };
        FluteGeometry {
            length: clamp(geometry.length, self.length),
            bore_diameter: clamp(geometry.bore_diameter, self.bore_diameter),
            wall_thickness: clamp(geometry.wall_thickness, self.wall_thickness),
            hole_diameter: clamp(geometry.hole_diameter, self.hole_diameter),
            ergonomic_limit: clamp(geometry.ergonomic_limit, self.ergonomic_limit),
        }
    }
}

/// Dimensions of a flute, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FluteGeometry {
    /// Total length from the blowing edge to the foot.
    pub length: f64,
    /// Inner bore diameter.
    pub bore_diameter: f64,
    /// Wall thickness, which is also the tonehole chimney height.
    pub wall_thickness: f64,
    /// Diameter shared by every finger hole.
    pub hole_diameter: f64,
    /// Largest comfortable stretch between two adjacent fingers.
    pub ergonomic_limit: f64,
}

impl Default for FluteGeometry {
    /// A 1.8 shaku flute, the most common size.
    fn default() -> Self {
        Self {
            length: 540.0,
            bore_diameter: 19.0,
            wall_thickness: 4.0,
            hole_diameter: 10.0,
            ergonomic_limit: 60.0,
        }
    }
}

impl FluteGeometry {
    /// Builds a geometry without validating it; see [`FluteGeometry::validate`].
    pub fn new(
        length: f64,
        bore_diameter: f64,
        wall_thickness: f64,
        hole_diameter: f64,
        ergonomic_limit: f64,
    ) -> Self {
        Self { length, bore_diameter, wall_thickness, hole_diameter, ergonomic_limit }
    }

    /// Checks that every dimension is finite, positive and inside `limits`.
    pub fn validate(&self, limits: &GeometryLimits) -> SolverResult<()> {
        let fields = [
            ("length", self.length, limits.length),
            ("bore_diameter", self.bore_diameter, limits.bore_diameter),
            ("wall_thickness", self.wall_thickness, limits.wall_thickness),
            ("hole_diameter", self.hole_diameter, limits.hole_diameter),
            ("ergonomic_limit", self.ergonomic_limit, limits.ergonomic_limit),
        ];
        for (field, value, (min, max)) in fields {
            SolverError::ensure_positive(field, value)?;
            SolverError::ensure_range(field, value, min, max)?;
        }
        Ok(())
    }

    /// Length over bore diameter.
    pub fn aspect_ratio(&self) -> f64 {
        self.length / self.bore_diameter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid_for_both_families() {
        let geometry = FluteGeometry::default();
        assert!(geometry.validate(&STANDARD_LIMITS).is_ok());
        assert!(geometry.validate(&DIATONIC_LIMITS).is_ok());
    }

    #[test]
    fn length_range_depends_on_family() {
        let short = FluteGeometry { length: 200.0, ..FluteGeometry::default() };
        assert!(short.validate(&DIATONIC_LIMITS).is_ok());
        assert_eq!(
            short.validate(&STANDARD_LIMITS),
            Err(SolverError::OutOfRange { field: "length", value: 200.0, min: 300.0, max: 1300.0 })
        );

        let long = FluteGeometry { length: 1200.0, ..FluteGeometry::default() };
        assert!(long.validate(&STANDARD_LIMITS).is_ok());
        assert!(long.validate(&DIATONIC_LIMITS).is_err());
    }

    #[test]
    fn degenerate_dimensions_are_rejected() {
        let zero_bore = FluteGeometry { bore_diameter: 0.0, ..FluteGeometry::default() };
        assert_eq!(
            zero_bore.validate(&STANDARD_LIMITS),
            Err(SolverError::Degenerate { field: "bore_diameter", value: 0.0 })
        );
        let nan_hole = FluteGeometry { hole_diameter: f64::NAN, ..FluteGeometry::default() };
        assert!(matches!(
            nan_hole.validate(&STANDARD_LIMITS),
            Err(SolverError::Degenerate { field: "hole_diameter", .. })
        ));
    }

    #[test]
    fn clamp_pulls_values_into_range() {
        let wild = FluteGeometry::new(5000.0, 1.0, f64::NAN, 12.0, 400.0);
        let clamped = STANDARD_LIMITS.clamp(wild);
        assert_eq!(clamped, FluteGeometry::new(1300.0, 10.0, 1.0, 12.0, 180.0));
        assert!(clamped.validate(&STANDARD_LIMITS).is_ok());
    }

    #[test]
    fn aspect_ratio() {
        let geometry = FluteGeometry::new(650.0, 20.5, 3.375, 10.0, 60.0);
        assert!((geometry.aspect_ratio() - 31.707).abs() < 1e-3);
    }
}
