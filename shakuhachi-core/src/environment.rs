//! # Environmental Acoustics Module
//!
//! Speed of sound in air as a function of temperature and relative humidity.
//!
//! ## Models
//! - **Humid air** (canonical): dry-air speed scaled by the molar mass of a
//!   humid-air mixture, with the Tetens saturation vapour pressure.
//! - **Linear approximation**: `343 + 0.6·(t − 20) + 1.5·RH/100`. Lower
//!   fidelity; only the resonance analysis asks for it, and it has to ask
//!   explicitly.

use serde::{Deserialize, Serialize};

use crate::error::{SolverError, SolverResult};

/// Speed of sound in dry air at 0 °C (m/s).
pub const DRY_AIR_SPEED_0C: f64 = 331.3;
/// 0 °C in kelvin.
pub const KELVIN_OFFSET: f64 = 273.15;
/// Standard sea-level atmospheric pressure (Pa).
pub const STANDARD_PRESSURE_PA: f64 = 101_325.0;
/// Molar mass of dry air (kg/mol).
pub const MOLAR_MASS_DRY_AIR: f64 = 0.028964;
/// Molar mass of water vapour (kg/mol).
pub const MOLAR_MASS_WATER: f64 = 0.018016;

/// Accepted temperature range (°C).
pub const TEMPERATURE_RANGE: (f64, f64) = (-10.0, 50.0);
/// Accepted relative humidity range (%).
pub const HUMIDITY_RANGE: (f64, f64) = (0.0, 100.0);
/// Accepted reference pitch range (Hz).
pub const REFERENCE_PITCH_RANGE: (f64, f64) = (400.0, 480.0);

/// Which speed-of-sound formula a caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpeedModel {
    /// Molar-mass humid-air model. Used by every calculator.
    #[default]
    HumidAir,
    /// Linear correction around 343 m/s at 20 °C. Several m/s off the humid
    /// model at room conditions.
    LinearApprox,
}

/// Room conditions for one calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalConditions {
    /// Air temperature in °C.
    pub temperature: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
    /// Frequency of the reference A in Hz.
    pub reference_pitch: f64,
}

impl Default for EnvironmentalConditions {
    fn default() -> Self {
        Self { temperature: 20.0, humidity: 50.0, reference_pitch: 440.0 }
    }
}

impl EnvironmentalConditions {
    /// Builds validated conditions.
    pub fn new(temperature: f64, humidity: f64, reference_pitch: f64) -> SolverResult<Self> {
        let conditions = Self { temperature, humidity, reference_pitch };
        conditions.validate()?;
        Ok(conditions)
    }

    /// Rejects values outside the documented domain.
    pub fn validate(&self) -> SolverResult<()> {
        SolverError::ensure_range("temperature", self.temperature, TEMPERATURE_RANGE.0, TEMPERATURE_RANGE.1)?;
        SolverError::ensure_range("humidity", self.humidity, HUMIDITY_RANGE.0, HUMIDITY_RANGE.1)?;
        SolverError::ensure_range(
            "reference_pitch",
            self.reference_pitch,
            REFERENCE_PITCH_RANGE.0,
            REFERENCE_PITCH_RANGE.1,
        )?;
        Ok(())
    }

    /// Speed of sound (m/s) under these conditions with the given model.
    pub fn speed_of_sound(&self, model: SpeedModel) -> f64 {
        match model {
            SpeedModel::HumidAir => speed_of_sound(self.temperature, self.humidity),
            SpeedModel::LinearApprox => speed_of_sound_linear(self.temperature, self.humidity),
        }
    }
}

/// Saturation vapour pressure of water (Pa), Tetens approximation.
pub fn saturation_vapor_pressure(temperature: f64) -> f64 {
    611.2 * (17.67 * temperature / (temperature + 243.5)).exp()
}

/// Speed of sound in humid air (m/s).
///
/// # Arguments
/// * `temperature` - Air temperature in °C (−10..50)
/// * `humidity` - Relative humidity in percent (0..100)
pub fn speed_of_sound(temperature: f64, humidity: f64) -> f64 {
    let kelvin = temperature + KELVIN_OFFSET;
    let dry = DRY_AIR_SPEED_0C * (kelvin / KELVIN_OFFSET).sqrt();

    let vapor_pressure = (humidity / 100.0) * saturation_vapor_pressure(temperature);
    let mole_fraction = vapor_pressure / STANDARD_PRESSURE_PA;

    // Water vapour is lighter than dry air, so humid air carries sound faster.
    let molar_mass = MOLAR_MASS_DRY_AIR * (1.0 - mole_fraction) + MOLAR_MASS_WATER * mole_fraction;

    dry * (MOLAR_MASS_DRY_AIR / molar_mass).sqrt()
}

/// Linear approximation of the speed of sound (m/s).
pub fn speed_of_sound_linear(temperature: f64, humidity: f64) -> f64 {
    343.0 + 0.6 * (temperature - 20.0) + (humidity / 100.0) * 1.5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn humid_model_at_room_conditions() {
        let c = speed_of_sound(20.0, 50.0);
        assert!((c - 343.97).abs() < 0.01, "got {c}");
        let dry_freezing = speed_of_sound(0.0, 0.0);
        assert!((dry_freezing - DRY_AIR_SPEED_0C).abs() < 1e-9);
    }

    #[test]
    fn increases_with_temperature() {
        for humidity in [0.0, 35.0, 100.0] {
            let mut previous = speed_of_sound(-10.0, humidity);
            for step in 1..=120 {
                let t = -10.0 + step as f64 * 0.5;
                let c = speed_of_sound(t, humidity);
                assert!(c > previous, "not increasing at {t} °C / {humidity} %");
                previous = c;
            }
        }
    }

    #[test]
    fn non_decreasing_with_humidity() {
        for temperature in [-10.0, 0.0, 20.0, 50.0] {
            let mut previous = speed_of_sound(temperature, 0.0);
            for rh in 1..=100 {
                let c = speed_of_sound(temperature, rh as f64);
                assert!(c >= previous, "decreasing at {temperature} °C / {rh} %");
                previous = c;
            }
        }
    }

    #[test]
    fn models_disagree_at_room_conditions() {
        let env = EnvironmentalConditions::default();
        let humid = env.speed_of_sound(SpeedModel::HumidAir);
        let linear = env.speed_of_sound(SpeedModel::LinearApprox);
        assert!((linear - 343.75).abs() < 1e-9);
        assert!(humid != linear);
    }

    #[test]
    fn validation_rejects_out_of_domain() {
        assert!(EnvironmentalConditions::new(20.0, 50.0, 440.0).is_ok());
        assert!(EnvironmentalConditions::new(-11.0, 50.0, 440.0).is_err());
        assert!(EnvironmentalConditions::new(20.0, 101.0, 440.0).is_err());
        assert!(EnvironmentalConditions::new(20.0, 50.0, 399.0).is_err());
        assert!(EnvironmentalConditions::new(f64::NAN, 50.0, 440.0).is_err());
    }
}
