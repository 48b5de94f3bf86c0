//! # Musical Tuning Module
//!
//! Pitch naming, cent deviations and shaku length classification.
//!
//! ## Features
//! - Frequency to note name against a tunable reference A
//! - Octave-qualified names (A4 for the reference)
//! - Cent deviation between two frequencies
//! - Traditional length classes by fundamental frequency or by millimetres

use std::fmt;

use serde::{Serialize, Serializer};

/// Sharp spelling, starting at the reference A.
pub const NOTE_NAMES: [&str; 12] = ["A", "A#", "B", "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#"];

/// Search window, in semitones either side of the reference.
pub const SEARCH_RANGE: i32 = 50;
/// Bisection steps before the search gives up.
pub const MAX_SEARCH_STEPS: u32 = 16;

/// Relative tolerance for treating a frequency as exactly on a semitone.
const EXACT_TOLERANCE: f64 = 1e-9;

/// One traditional shaku length (1 shaku ≈ 303 mm).
pub const SHAKU_MM: f64 = 303.0;

/// The pitch class of a frequency, as a semitone offset from the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PitchName {
    /// Semitones above (or below, if negative) the reference A.
    Known { semitones: i32 },
    /// The search did not settle.
    Unknown,
}

impl PitchName {
    /// Note name without octave, e.g. `"C#"`. `"?"` when unknown.
    pub fn name(&self) -> &'static str {
        match *self {
            PitchName::Known { semitones } => NOTE_NAMES[semitones.rem_euclid(12) as usize],
            PitchName::Unknown => "?",
        }
    }

    /// Note name with its octave number; the reference A is A4.
    pub fn with_octave(&self) -> String {
        match *self {
            PitchName::Known { semitones } => {
                let octave = 4 + (semitones + 9).div_euclid(12);
                format!("{}{}", self.name(), octave)
            }
            PitchName::Unknown => "?".to_string(),
        }
    }
}

impl fmt::Display for PitchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for PitchName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Names the equal-tempered semitone closest to `frequency`.
///
/// Bisects integer semitone offsets from the reference. An exact hit returns
/// that semitone; once the window closes to two neighbours the closer one wins,
/// ties going to the upper.
///
/// # Arguments
/// * `frequency` - Frequency to name, in Hz
/// * `reference` - Frequency of the reference A, in Hz
///
/// # Returns
/// * `PitchName::Unknown` for non-positive or non-finite input, or when the
///   search does not settle
pub fn note_name(frequency: f64, reference: f64) -> PitchName {
    if !(frequency.is_finite() && frequency > 0.0 && reference.is_finite() && reference > 0.0) {
        return PitchName::Unknown;
    }
    let pitch_of = |semitones: i32| reference * 2.0_f64.powf(semitones as f64 / 12.0);

    let mut low = -SEARCH_RANGE;
    let mut high = SEARCH_RANGE;
    for _ in 0..MAX_SEARCH_STEPS {
        let middle = low + (high - low + 1) / 2;
        let middle_freq = pitch_of(middle);

        if ((middle_freq - frequency) / frequency).abs() < EXACT_TOLERANCE {
            return PitchName::Known { semitones: middle };
        }
        if middle_freq < frequency {
            low = middle;
        } else {
            high = middle;
        }

        if low + 1 == high {
            let below = frequency - pitch_of(low);
            let above = pitch_of(high) - frequency;
            let semitones = if below < above { low } else { high };
            return PitchName::Known { semitones };
        }
    }
    PitchName::Unknown
}

/// Deviation of `freq` from `target_freq` in cents.
///
/// Positive values are sharp, negative values flat; 100 cents make a
/// semitone.
pub fn cents(freq: f64, target_freq: f64) -> f64 {
    1200.0 * (freq / target_freq).log2()
}

/// A named band of a length-classification table, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthBand {
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
}

const fn band(name: &'static str, min: f64, max: f64) -> LengthBand {
    LengthBand { name, min, max }
}

/// Shaku classes by fundamental frequency (Hz), searched in order.
pub const FREQUENCY_BANDS: [LengthBand; 15] = [
    band("1.1", 525.0, 600.0),
    band("1.3", 450.0, 525.0),
    band("1.4", 415.0, 450.0),
    band("1.6", 365.0, 415.0),
    band("1.8", 285.0, 365.0),
    band("2.0", 260.0, 285.0),
    band("2.1", 245.0, 260.0),
    band("2.3", 220.0, 245.0),
    band("2.4", 205.0, 220.0),
    band("2.6", 185.0, 205.0),
    band("2.8", 170.0, 185.0),
    band("3.0", 155.0, 170.0),
    band("3.3", 140.0, 155.0),
    band("3.6", 125.0, 140.0),
    band("4.0", 110.0, 125.0),
];

/// Shaku classes by flute length (mm).
pub const LENGTH_BANDS: [LengthBand; 30] = [
    band("1.1", 318.0, 348.0),
    band("1.2", 349.0, 379.0),
    band("1.3", 380.0, 409.0),
    band("1.4", 410.0, 439.0),
    band("1.5", 440.0, 469.0),
    band("1.6", 470.0, 500.0),
    band("1.7", 501.0, 530.0),
    band("1.8", 531.0, 561.0),
    band("1.9", 562.0, 591.0),
    band("2.0", 592.0, 621.0),
    band("2.1", 622.0, 652.0),
    band("2.2", 653.0, 682.0),
    band("2.3", 683.0, 712.0),
    band("2.4", 713.0, 743.0),
    band("2.5", 744.0, 773.0),
    band("2.6", 774.0, 804.0),
    band("2.7", 805.0, 834.0),
    band("2.8", 835.0, 865.0),
    band("2.9", 866.0, 895.0),
    band("3.0", 896.0, 926.0),
    band("3.1", 927.0, 956.0),
    band("3.2", 957.0, 987.0),
    band("3.3", 988.0, 1017.0),
    band("3.4", 1018.0, 1048.0),
    band("3.5", 1049.0, 1078.0),
    band("3.6", 1079.0, 1109.0),
    band("3.7", 1110.0, 1139.0),
    band("3.8", 1140.0, 1170.0),
    band("3.9", 1171.0, 1200.0),
    band("4.0", 1201.0, 1242.0),
];

fn find_band(table: &[LengthBand], value: f64) -> Option<&'static str> {
    table.iter().find(|b| value >= b.min && value <= b.max).map(|b| b.name)
}

/// Shaku class of a flute from its fundamental frequency.
pub fn classify_by_frequency(base_frequency: f64) -> String {
    if let Some(name) = find_band(&FREQUENCY_BANDS, base_frequency) {
        return name.to_string();
    }
    if base_frequency > 600.0 {
        "1.0 or shorter".to_string()
    } else if base_frequency < 110.0 {
        "4.5 or longer".to_string()
    } else {
        "Custom length".to_string()
    }
}

/// Shaku class of a flute from its length; outside the table the length is
/// converted to shaku directly.
pub fn classify_by_length(length_mm: f64) -> String {
    match find_band(&LENGTH_BANDS, length_mm) {
        Some(name) => name.to_string(),
        None => format!("{:.1}", length_mm / SHAKU_MM),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_names_itself() {
        assert_eq!(note_name(440.0, 440.0), PitchName::Known { semitones: 0 });
        assert_eq!(note_name(440.0, 440.0).to_string(), "A");
        assert_eq!(note_name(440.0, 440.0).with_octave(), "A4");
        assert_eq!(note_name(442.0, 442.0).to_string(), "A");
    }

    #[test]
    fn names_common_pitches() {
        assert_eq!(note_name(261.63, 440.0).with_octave(), "C4");
        assert_eq!(note_name(293.66, 440.0).with_octave(), "D4");
        assert_eq!(note_name(880.0, 440.0).with_octave(), "A5");
        assert_eq!(note_name(246.94, 440.0).with_octave(), "B3");
        // A quarter tone sharp of D still reads D.
        assert_eq!(note_name(297.0, 440.0).to_string(), "D");
    }

    #[test]
    fn naming_is_idempotent() {
        for semitones in -40..=40 {
            let freq = 440.0 * 2.0_f64.powf(semitones as f64 / 12.0);
            let named = note_name(freq, 440.0);
            assert_eq!(named, PitchName::Known { semitones }, "at {freq} Hz");
        }
    }

    #[test]
    fn invalid_frequencies_are_unknown() {
        assert_eq!(note_name(0.0, 440.0), PitchName::Unknown);
        assert_eq!(note_name(-10.0, 440.0), PitchName::Unknown);
        assert_eq!(note_name(f64::NAN, 440.0), PitchName::Unknown);
        assert_eq!(PitchName::Unknown.to_string(), "?");
    }

    #[test]
    fn cents_of_a_semitone() {
        assert!((cents(440.0 * 2.0_f64.powf(1.0 / 12.0), 440.0) - 100.0).abs() < 1e-9);
        assert!((cents(220.0, 440.0) + 1200.0).abs() < 1e-9);
    }

    #[test]
    fn frequency_classification() {
        assert_eq!(classify_by_frequency(289.85), "1.8");
        assert_eq!(classify_by_frequency(700.0), "1.0 or shorter");
        assert_eq!(classify_by_frequency(100.0), "4.5 or longer");
    }

    #[test]
    fn length_classification() {
        assert_eq!(classify_by_length(540.0), "1.8");
        assert_eq!(classify_by_length(606.0), "2.0");
        assert_eq!(classify_by_length(200.0), "0.7");
        assert_eq!(classify_by_length(1300.0), "4.3");
    }
}
