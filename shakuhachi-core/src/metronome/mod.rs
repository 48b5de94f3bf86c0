//! # Metronome Module
//!
//! A practice metronome: a beat state machine over a tempo program, with
//! synthesized percussion kits and tap tempo.
//!
//! ## Features
//! - Time signatures from 1/1 to 12/16, tempo clamped to 40–300 BPM
//! - Optional two-bar count-in, accented downbeat and eighth-note ticks
//! - Accelerando, ritardando, stepped and planned tempo programs
//! - Named presets
//!
//! The state machine only decides *what* to play and how long to wait; the
//! caller owns the clock and the audio device.

pub mod kits;
pub mod program;
pub mod tap;

use std::fmt;
use std::time::Duration;

use log::debug;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use self::kits::{Kit, Voice};
use self::program::{ProgramPosition, Tempo, TempoProgram};

pub const MIN_BPM: f64 = 40.0;
pub const MAX_BPM: f64 = 300.0;
pub const DEFAULT_BPM: f64 = 120.0;
pub const DEFAULT_VOLUME: f32 = 0.7;
/// Bars played before the program starts when count-in is on.
pub const COUNT_IN_BARS: u32 = 2;

const VALID_DENOMINATORS: [u8; 5] = [1, 2, 4, 8, 16];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetronomeError {
    #[error("invalid time signature {numerator}/{denominator}")]
    TimeSignature { numerator: u8, denominator: u8 },

    #[error("unknown preset: {0}")]
    UnknownPreset(String),
}

/// Clamps a tempo into the metronome's range. NaN becomes the default tempo.
pub fn clamp_bpm(bpm: f64) -> f64 {
    if bpm.is_nan() { DEFAULT_BPM } else { bpm.clamp(MIN_BPM, MAX_BPM) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SignatureFields")]
pub struct TimeSignature {
    numerator: u8,
    denominator: u8,
}

/// Unchecked wire form; loading goes through `TimeSignature::new`.
#[derive(Deserialize)]
struct SignatureFields {
    numerator: u8,
    denominator: u8,
}

impl TryFrom<SignatureFields> for TimeSignature {
    type Error = MetronomeError;

    fn try_from(fields: SignatureFields) -> Result<Self, Self::Error> {
        TimeSignature::new(fields.numerator, fields.denominator)
    }
}

impl TimeSignature {
    pub const COMMON: TimeSignature = TimeSignature { numerator: 4, denominator: 4 };

    pub fn new(numerator: u8, denominator: u8) -> Result<Self, MetronomeError> {
        if (1..=12).contains(&numerator) && VALID_DENOMINATORS.contains(&denominator) {
            Ok(TimeSignature { numerator, denominator })
        } else {
            Err(MetronomeError::TimeSignature { numerator, denominator })
        }
    }

    /// Beats per bar.
    pub fn numerator(&self) -> u8 {
        self.numerator
    }

    pub fn denominator(&self) -> u8 {
        self.denominator
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::COMMON
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Everything the user can set on the metronome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetronomeSettings {
    pub bpm: f64,
    pub time_signature: TimeSignature,
    pub accent_first_beat: bool,
    pub count_in: bool,
    /// Adds an eighth-note tick between beats.
    pub subdivisions: bool,
    pub kit: Kit,
    /// Output gain, 0.0–1.0.
    pub volume: f32,
    pub program: TempoProgram,
}

impl Default for MetronomeSettings {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            time_signature: TimeSignature::COMMON,
            accent_first_beat: true,
            count_in: false,
            subdivisions: false,
            kit: Kit::Basic,
            volume: DEFAULT_VOLUME,
            program: TempoProgram::Constant,
        }
    }
}

/// A named starting point for the settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preset {
    pub key: &'static str,
    pub name: &'static str,
    pub bpm: f64,
    pub time_signature: TimeSignature,
    pub kit: Kit,
    pub accent_first_beat: bool,
}

static PRESETS: Lazy<Vec<Preset>> = Lazy::new(|| {
    let preset = |key, name, bpm, numerator, kit| Preset {
        key,
        name,
        bpm,
        time_signature: TimeSignature { numerator, denominator: 4 },
        kit,
        accent_first_beat: true,
    };
    vec![
        preset("basic-4-4", "Basic 4/4", 120.0, 4, Kit::Basic),
        preset("waltz", "Waltz", 90.0, 3, Kit::Basic),
        preset("fast-practice", "Fast Practice", 160.0, 4, Kit::Electro),
        preset("slow-practice", "Slow Practice", 60.0, 4, Kit::Digital),
    ]
});

pub fn presets() -> &'static [Preset] {
    &PRESETS
}

pub fn find_preset(key: &str) -> Result<&'static Preset, MetronomeError> {
    PRESETS
        .iter()
        .find(|preset| preset.key == key)
        .ok_or_else(|| MetronomeError::UnknownPreset(key.to_string()))
}

impl MetronomeSettings {
    /// Overwrites tempo, signature, kit and accent from a preset. The tempo
    /// program is reset to constant.
    pub fn apply_preset(&mut self, key: &str) -> Result<(), MetronomeError> {
        let preset = find_preset(key)?;
        self.bpm = preset.bpm;
        self.time_signature = preset.time_signature;
        self.kit = preset.kit;
        self.accent_first_beat = preset.accent_first_beat;
        self.program = TempoProgram::Constant;
        Ok(())
    }
}

/// One sound to play.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Beat {
    /// 1-based; count-in bars and program bars are numbered separately.
    pub bar: u32,
    /// 1-based position in the bar.
    pub beat: u8,
    pub accent: bool,
    pub count_in: bool,
    /// The eighth-note tick between two beats.
    pub subdivision: bool,
    pub bpm: f64,
    pub time_signature: TimeSignature,
    /// Wait before the next event.
    pub interval: Duration,
    pub voice: Voice,
}

/// The beat state machine.
#[derive(Debug, Clone)]
pub struct Metronome {
    settings: MetronomeSettings,
    position: ProgramPosition,
    /// 0-based index of the next beat within its bar.
    next_beat_in_bar: u8,
    count_in_remaining: u32,
    count_in_bar: u32,
    pending_subdivision: Option<Beat>,
    finished: bool,
}

impl Metronome {
    pub fn new(settings: MetronomeSettings) -> Self {
        let mut metronome = Metronome {
            settings,
            position: ProgramPosition::default(),
            next_beat_in_bar: 0,
            count_in_remaining: 0,
            count_in_bar: 0,
            pending_subdivision: None,
            finished: false,
        };
        metronome.reset();
        metronome
    }

    pub fn settings(&self) -> &MetronomeSettings {
        &self.settings
    }

    pub fn position(&self) -> ProgramPosition {
        self.position
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Back to the first beat (and the count-in, if enabled).
    pub fn reset(&mut self) {
        self.position = ProgramPosition::default();
        self.next_beat_in_bar = 0;
        self.pending_subdivision = None;
        self.finished = false;
        self.count_in_bar = 0;
        self.count_in_remaining = if self.settings.count_in {
            match self.tempo() {
                Tempo::Play { time_signature, .. } => COUNT_IN_BARS * time_signature.numerator() as u32,
                Tempo::Finished => 0,
            }
        } else {
            0
        };
    }

    fn tempo(&self) -> Tempo {
        self.settings
            .program
            .tempo_at(self.settings.bpm, self.settings.time_signature, &self.position)
    }

    fn voice_for(&self, beat: u8, accent: bool) -> Voice {
        let voices = self.settings.kit.voices();
        if accent {
            voices.accent
        } else if beat == 1 {
            voices.downbeat
        } else {
            voices.beat
        }
    }

    /// The next sound, or `None` once the tempo program has finished.
    pub fn next_beat(&mut self) -> Option<Beat> {
        if self.finished {
            return None;
        }
        if let Some(tick) = self.pending_subdivision.take() {
            return Some(tick);
        }

        let (bpm, time_signature) = match self.tempo() {
            Tempo::Play { bpm, time_signature } => (bpm, time_signature),
            Tempo::Finished => {
                debug!("[METRO] program finished after {} bars", self.position.completed_bars);
                self.finished = true;
                return None;
            }
        };
        let beat_length = Duration::from_secs_f64(60.0 / bpm);
        let beats_per_bar = time_signature.numerator();

        if self.count_in_remaining > 0 {
            let total = COUNT_IN_BARS * beats_per_bar as u32;
            let index = total - self.count_in_remaining;
            self.count_in_remaining -= 1;
            self.count_in_bar = index / beats_per_bar as u32 + 1;
            let beat = (index % beats_per_bar as u32) as u8 + 1;
            let accent = beat == 1 && self.settings.accent_first_beat;
            return Some(Beat {
                bar: self.count_in_bar,
                beat,
                accent,
                count_in: true,
                subdivision: false,
                bpm,
                time_signature,
                interval: beat_length,
                voice: self.voice_for(beat, accent),
            });
        }

        // A signature change mid-bar starts a fresh bar.
        if self.next_beat_in_bar >= beats_per_bar {
            self.next_beat_in_bar = 0;
        }
        let beat = self.next_beat_in_bar + 1;
        let accent = beat == 1 && self.settings.accent_first_beat;
        let bar = self.position.completed_bars + 1;

        self.position.elapsed_secs += beat_length.as_secs_f64();
        self.next_beat_in_bar += 1;
        if self.next_beat_in_bar >= beats_per_bar {
            self.next_beat_in_bar = 0;
            self.position.completed_bars += 1;
        }

        let interval = if self.settings.subdivisions {
            let half = beat_length / 2;
            self.pending_subdivision = Some(Beat {
                bar,
                beat,
                accent: false,
                count_in: false,
                subdivision: true,
                bpm,
                time_signature,
                interval: beat_length - half,
                voice: self.settings.kit.voices().subdivision,
            });
            half
        } else {
            beat_length
        };

        Some(Beat {
            bar,
            beat,
            accent,
            count_in: false,
            subdivision: false,
            bpm,
            time_signature,
            interval,
            voice: self.voice_for(beat, accent),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metronome::program::Exercise;
    use pretty_assertions::assert_eq;

    fn take(metronome: &mut Metronome, n: usize) -> Vec<Beat> {
        (0..n).map_while(|_| metronome.next_beat()).collect()
    }

    #[test]
    fn time_signature_validation() {
        assert!(TimeSignature::new(7, 8).is_ok());
        assert_eq!(
            TimeSignature::new(13, 4),
            Err(MetronomeError::TimeSignature { numerator: 13, denominator: 4 })
        );
        assert!(TimeSignature::new(4, 3).is_err());
        assert!(TimeSignature::new(0, 4).is_err());
        assert_eq!(TimeSignature::COMMON.to_string(), "4/4");
    }

    #[test]
    fn saved_signatures_are_validated_on_load() {
        let waltz: TimeSignature = serde_json::from_str(r#"{"numerator":3,"denominator":4}"#).unwrap();
        assert_eq!(waltz, TimeSignature::new(3, 4).unwrap());
        assert!(serde_json::from_str::<TimeSignature>(r#"{"numerator":0,"denominator":4}"#).is_err());

        let settings = MetronomeSettings::default();
        let json = serde_json::to_string(&settings).unwrap();
        assert_eq!(serde_json::from_str::<MetronomeSettings>(&json).unwrap(), settings);
    }

    #[test]
    fn bpm_is_clamped() {
        assert_eq!(clamp_bpm(20.0), 40.0);
        assert_eq!(clamp_bpm(400.0), 300.0);
        assert_eq!(clamp_bpm(f64::NAN), DEFAULT_BPM);
        assert_eq!(clamp_bpm(96.0), 96.0);
    }

    #[test]
    fn accents_the_first_beat_of_each_bar() {
        let mut metronome = Metronome::new(MetronomeSettings::default());
        let beats = take(&mut metronome, 8);
        let pattern: Vec<(u32, u8, bool)> = beats.iter().map(|b| (b.bar, b.beat, b.accent)).collect();
        assert_eq!(
            pattern,
            vec![
                (1, 1, true),
                (1, 2, false),
                (1, 3, false),
                (1, 4, false),
                (2, 1, true),
                (2, 2, false),
                (2, 3, false),
                (2, 4, false),
            ]
        );
        assert_eq!(beats[0].interval, Duration::from_millis(500));
        assert_eq!(beats[0].voice, Voice::AccentKick);
        assert_eq!(beats[1].voice, Voice::HiHat);
    }

    #[test]
    fn unaccented_downbeat_uses_the_downbeat_voice() {
        let settings = MetronomeSettings { accent_first_beat: false, ..Default::default() };
        let beat = Metronome::new(settings).next_beat().unwrap();
        assert!(!beat.accent);
        assert_eq!(beat.voice, Voice::Kick);
    }

    #[test]
    fn count_in_plays_two_bars_first() {
        let settings = MetronomeSettings {
            count_in: true,
            time_signature: TimeSignature::new(3, 4).unwrap(),
            ..Default::default()
        };
        let mut metronome = Metronome::new(settings);
        let beats = take(&mut metronome, 7);
        assert!(beats[..6].iter().all(|b| b.count_in));
        assert_eq!(beats[3].bar, 2);
        assert_eq!(beats[3].beat, 1);
        assert!(!beats[6].count_in);
        assert_eq!((beats[6].bar, beats[6].beat), (1, 1));
        // Count-in time is not program time.
        assert_eq!(metronome.position().elapsed_secs, 0.5);
    }

    #[test]
    fn subdivisions_split_each_beat() {
        let settings = MetronomeSettings { subdivisions: true, bpm: 60.0, ..Default::default() };
        let mut metronome = Metronome::new(settings);
        let beats = take(&mut metronome, 4);
        assert!(!beats[0].subdivision);
        assert!(beats[1].subdivision);
        assert!(!beats[1].accent);
        assert_eq!(beats[1].voice, Voice::ClosedHat);
        assert_eq!(beats[0].interval + beats[1].interval, Duration::from_secs(1));
        assert_eq!((beats[2].bar, beats[2].beat), (1, 2));
    }

    #[test]
    fn finishes_with_the_program() {
        let settings = MetronomeSettings {
            program: TempoProgram::Plan {
                exercises: vec![Exercise { bpm: 100.0, time_signature: TimeSignature::new(2, 4).unwrap(), bars: 2 }],
            },
            ..Default::default()
        };
        let mut metronome = Metronome::new(settings);
        let beats = take(&mut metronome, 10);
        assert_eq!(beats.len(), 4);
        assert!(beats.iter().all(|b| b.bpm == 100.0));
        assert!(metronome.is_finished());
        assert_eq!(metronome.next_beat(), None);

        metronome.reset();
        assert!(metronome.next_beat().is_some());
    }

    #[test]
    fn empty_plan_finishes_immediately() {
        let settings = MetronomeSettings { program: TempoProgram::Plan { exercises: vec![] }, count_in: true, ..Default::default() };
        let mut metronome = Metronome::new(settings);
        assert_eq!(metronome.next_beat(), None);
    }

    #[test]
    fn accelerando_speeds_up_beat_by_beat() {
        let settings = MetronomeSettings {
            program: TempoProgram::Accelerando { start_bpm: 80.0, end_bpm: 160.0, duration_secs: 60.0 },
            ..Default::default()
        };
        let mut metronome = Metronome::new(settings);
        let beats = take(&mut metronome, 50);
        assert_eq!(beats[0].bpm, 80.0);
        assert!(beats.windows(2).all(|w| w[1].bpm >= w[0].bpm));
        assert!(beats[49].bpm > 80.0);
    }

    #[test]
    fn presets_apply() {
        let mut settings = MetronomeSettings::default();
        settings.apply_preset("waltz").unwrap();
        assert_eq!(settings.bpm, 90.0);
        assert_eq!(settings.time_signature.to_string(), "3/4");
        settings.apply_preset("fast-practice").unwrap();
        assert_eq!(settings.kit, Kit::Electro);
        assert_eq!(presets().len(), 4);
        assert_eq!(settings.apply_preset("polka"), Err(MetronomeError::UnknownPreset("polka".into())));
    }
}
