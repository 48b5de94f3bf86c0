//! # Percussion Kit Module
//!
//! Synthesized metronome voices. Every voice is a short mono buffer built
//! from decaying sines and noise; the noise comes from a seeded PCG32 so a
//! kit renders identically every time.
//!
//! ## Kits
//! - **Basic**: acoustic kick and hi-hat
//! - **Electro**: clipped kick and pulse hat
//! - **RX5**: analog drum machine with a cowbell accent
//! - **Tabla**: dha and tin strokes, dhin for preview
//! - **Digital**: plain sine clicks

use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// Seed used when rendering kits for playback.
pub const DEFAULT_SEED: u32 = 0x5EED_F1E7;

/// Creates a PCG32 generator from a 32-bit seed, mirrored into both halves
/// of the 64-bit state.
pub fn create_rng(seed: u32) -> Pcg32 {
    let seed64 = (seed as u64) | ((seed as u64) << 32);
    Pcg32::seed_from_u64(seed64)
}

/// One synthesized sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Voice {
    Kick,
    Snare,
    HiHat,
    ClosedHat,
    AccentKick,
    ElectroKick,
    ElectroSnare,
    ElectroHat,
    ElectroAccent,
    AnalogKick,
    AnalogSnare,
    AnalogHat,
    Ride,
    Cowbell,
    Dha,
    Dhin,
    Tin,
    Click,
    AccentClick,
    Tick,
    Tock,
}

impl Voice {
    /// Length of the voice in seconds.
    pub fn duration(&self) -> f64 {
        match self {
            Voice::Kick => 0.5,
            Voice::Snare => 0.3,
            Voice::HiHat => 0.15,
            Voice::ClosedHat => 0.08,
            Voice::AccentKick => 0.6,
            Voice::ElectroKick => 0.4,
            Voice::ElectroSnare => 0.25,
            Voice::ElectroHat => 0.12,
            Voice::ElectroAccent => 0.5,
            Voice::AnalogKick => 0.8,
            Voice::AnalogSnare => 0.4,
            Voice::AnalogHat => 0.2,
            Voice::Ride => 1.0,
            Voice::Cowbell => 0.5,
            Voice::Dha => 0.6,
            Voice::Dhin => 0.8,
            Voice::Tin => 0.3,
            Voice::Click => 0.1,
            Voice::AccentClick => 0.15,
            Voice::Tick => 0.05,
            Voice::Tock => 0.08,
        }
    }

    /// Value of the voice `t` seconds after it is struck.
    fn sample(&self, t: f64, rng: &mut Pcg32) -> f64 {
        let sine = |freq: f64| (2.0 * PI * freq * t).sin();
        let decay = |rate: f64| (-t * rate).exp();
        let mut noise = || rng.r#gen::<f64>() - 0.5;

        match self {
            Voice::Kick => {
                let kick = sine(60.0 * decay(30.0)) * decay(5.0);
                (kick + noise() * 0.3 * decay(10.0)) * 0.8
            }
            Voice::Snare => {
                let tone = sine(200.0) * 0.3;
                let crack = sine(3000.0) * decay(20.0) * 0.2;
                (tone + noise() * 0.8 + crack) * decay(8.0) * 0.6
            }
            Voice::HiHat => {
                let metallic: f64 = (0..8).map(|k| sine(8000.0 + 1000.0 * k as f64) * noise()).sum();
                metallic * decay(15.0) * 0.3
            }
            Voice::ClosedHat => {
                let envelope = decay(25.0);
                (noise() * envelope + sine(12_000.0) * envelope * 0.3) * 0.4
            }
            Voice::AccentKick => {
                let pitch = 80.0 * decay(25.0);
                let envelope = decay(4.0);
                let kick = sine(pitch) * envelope;
                let harmonics = sine(pitch * 2.0) * envelope * 0.3;
                let click = sine(2000.0) * decay(20.0) * 0.2;
                (kick + harmonics + click) * 0.9
            }
            Voice::ElectroKick => {
                let driven = sine(50.0 * decay(20.0)) * 3.0;
                driven.signum() * driven.abs().min(1.0) * decay(6.0) * 0.7
            }
            Voice::ElectroSnare => {
                let tone = sine(220.0) * 0.4;
                let punch = sine(150.0) * decay(30.0) * 0.5;
                (tone + noise() * 0.6 + punch) * decay(10.0) * 0.8
            }
            Voice::ElectroHat => {
                let envelope = decay(20.0);
                let digital = sine(10_000.0) * noise();
                let pulse = sine(8000.0).signum() * envelope;
                (digital + pulse) * envelope * 0.4
            }
            Voice::ElectroAccent => {
                let envelope = decay(5.0);
                let bass = sine(60.0) * envelope;
                let mid = sine(440.0) * envelope * 0.5;
                let high = sine(2000.0) * decay(15.0) * 0.3;
                (bass + mid + high) * 0.8
            }
            Voice::AnalogKick => {
                let pitch = 70.0 * decay(15.0);
                let body = sine(pitch) + sine(pitch * 1.5) * 0.3;
                let punch = sine(pitch * 3.0) * decay(20.0) * 0.2;
                (body + punch) * decay(3.0) * 0.9
            }
            Voice::AnalogSnare => {
                let tones = sine(220.0) * 0.4 + sine(330.0) * 0.3;
                let snap = sine(8000.0) * decay(25.0) * 0.3;
                (tones + noise() * 0.7 + snap) * decay(6.0) * 0.7
            }
            Voice::AnalogHat => {
                let metallic: f64 = [8000.0, 10_000.0, 12_000.0, 15_000.0]
                    .into_iter()
                    .map(|freq| sine(freq) * noise())
                    .sum();
                metallic * decay(12.0) * 0.35
            }
            Voice::Ride => {
                let envelope = decay(2.0);
                let shimmer = sine(5000.0) * noise() * 0.4;
                let bell = sine(1200.0) * envelope * 0.2;
                (sine(3000.0) * 0.3 + shimmer + bell) * envelope * 0.5
            }
            Voice::Cowbell => (sine(800.0) + sine(1200.0) * 0.7 + sine(2000.0) * 0.3) * decay(4.0) * 0.6,
            Voice::Dha => {
                // The drum head slackens as the stroke dies away.
                let pitch = 120.0 * (1.0 - t * 0.3);
                let membrane = sine(pitch) + sine(pitch * 2.1) * 0.4;
                let slap = sine(400.0) * decay(20.0) * 0.3;
                (membrane + slap) * decay(4.0) * 0.7
            }
            Voice::Dhin => {
                let pitch = 90.0 * (1.0 - t * 0.4);
                let body = sine(pitch) + sine(pitch * 1.8) * 0.5;
                let attack = sine(300.0) * decay(15.0) * 0.4;
                (body + attack) * decay(3.0) * 0.8
            }
            Voice::Tin => {
                let finger = noise() * 0.2 * decay(30.0);
                (sine(800.0) + sine(1600.0) * 0.6 + finger) * decay(8.0) * 0.5
            }
            Voice::Click | Voice::Tock => sine(800.0) * decay(10.0) * 0.3,
            Voice::AccentClick => sine(1200.0) * decay(10.0) * 0.3,
            Voice::Tick => sine(1000.0) * decay(10.0) * 0.3,
        }
    }
}

/// Renders `voice` as a mono buffer.
pub fn synthesize(voice: Voice, sample_rate: u32, rng: &mut Pcg32) -> Vec<f32> {
    let rate = sample_rate as f64;
    let len = (voice.duration() * rate) as usize;
    (0..len).map(|i| voice.sample(i as f64 / rate, rng) as f32).collect()
}

/// A percussion kit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Kit {
    #[default]
    Basic,
    Electro,
    Rx5,
    Tabla,
    Digital,
}

/// Which voice a kit plays in each slot of the bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KitVoices {
    pub downbeat: Voice,
    pub beat: Voice,
    pub accent: Voice,
    pub subdivision: Voice,
}

impl Kit {
    pub const ALL: [Kit; 5] = [Kit::Basic, Kit::Electro, Kit::Rx5, Kit::Tabla, Kit::Digital];

    pub fn key(&self) -> &'static str {
        match self {
            Kit::Basic => "basic",
            Kit::Electro => "electro",
            Kit::Rx5 => "rx5",
            Kit::Tabla => "tabla",
            Kit::Digital => "digital",
        }
    }

    pub fn from_key(key: &str) -> Option<Kit> {
        Kit::ALL.into_iter().find(|kit| kit.key() == key)
    }

    pub fn voices(&self) -> KitVoices {
        match self {
            Kit::Basic => KitVoices {
                downbeat: Voice::Kick,
                beat: Voice::HiHat,
                accent: Voice::AccentKick,
                subdivision: Voice::ClosedHat,
            },
            Kit::Electro => KitVoices {
                downbeat: Voice::ElectroKick,
                beat: Voice::ElectroHat,
                accent: Voice::ElectroAccent,
                subdivision: Voice::ElectroHat,
            },
            Kit::Rx5 => KitVoices {
                downbeat: Voice::AnalogKick,
                beat: Voice::AnalogHat,
                accent: Voice::Cowbell,
                subdivision: Voice::AnalogHat,
            },
            Kit::Tabla => KitVoices {
                downbeat: Voice::Dha,
                beat: Voice::Tin,
                accent: Voice::Dha,
                subdivision: Voice::Tin,
            },
            Kit::Digital => KitVoices {
                downbeat: Voice::Click,
                beat: Voice::Tick,
                accent: Voice::AccentClick,
                subdivision: Voice::Tock,
            },
        }
    }

    /// Every voice the kit carries, including the ones only offered for
    /// preview.
    pub fn palette(&self) -> &'static [Voice] {
        match self {
            Kit::Basic => &[Voice::Kick, Voice::Snare, Voice::HiHat, Voice::ClosedHat, Voice::AccentKick],
            Kit::Electro => &[Voice::ElectroKick, Voice::ElectroSnare, Voice::ElectroHat, Voice::ElectroAccent],
            Kit::Rx5 => &[Voice::AnalogKick, Voice::AnalogSnare, Voice::AnalogHat, Voice::Ride, Voice::Cowbell],
            Kit::Tabla => &[Voice::Dha, Voice::Dhin, Voice::Tin],
            Kit::Digital => &[Voice::Click, Voice::AccentClick, Voice::Tick, Voice::Tock],
        }
    }
}

impl std::fmt::Display for Kit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Kit::Basic => "Basic Drum Kit",
            Kit::Electro => "Electro Kit",
            Kit::Rx5 => "Yamaha RX5",
            Kit::Tabla => "Tabla",
            Kit::Digital => "Digital",
        };
        f.write_str(name)
    }
}

/// Pre-rendered buffers of one kit, ready to be mixed.
pub type KitBuffers = HashMap<Voice, Arc<Vec<f32>>>;

/// Renders every voice of `kit` at `sample_rate`.
pub fn render_kit(kit: Kit, sample_rate: u32, seed: u32) -> KitBuffers {
    let mut rng = create_rng(seed);
    kit.palette()
        .iter()
        .map(|&voice| (voice, Arc::new(synthesize(voice, sample_rate, &mut rng))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffers_have_the_voice_length() {
        let mut rng = create_rng(1);
        assert_eq!(synthesize(Voice::Kick, 44_100, &mut rng).len(), 22_050);
        assert_eq!(synthesize(Voice::Tick, 48_000, &mut rng).len(), 2_400);
    }

    #[test]
    fn same_seed_same_sound() {
        let a = synthesize(Voice::Snare, 44_100, &mut create_rng(7));
        let b = synthesize(Voice::Snare, 44_100, &mut create_rng(7));
        let c = synthesize(Voice::Snare, 44_100, &mut create_rng(8));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn voices_decay_and_stay_bounded() {
        for kit in Kit::ALL {
            for (voice, buffer) in render_kit(kit, 44_100, DEFAULT_SEED) {
                assert!(buffer.iter().all(|s| s.is_finite() && s.abs() <= 2.5), "{voice:?}");
                let n = buffer.len();
                let head: f32 = buffer[..n / 10].iter().map(|s| s.abs()).sum();
                let tail: f32 = buffer[n - n / 10..].iter().map(|s| s.abs()).sum();
                assert!(tail < head, "{voice:?} does not decay");
            }
        }
    }

    #[test]
    fn kit_keys_round_trip() {
        for kit in Kit::ALL {
            assert_eq!(Kit::from_key(kit.key()), Some(kit));
        }
        assert_eq!(Kit::from_key("cowbell"), None);
    }

    #[test]
    fn tabla_accents_with_dha() {
        let voices = Kit::Tabla.voices();
        assert_eq!(voices.accent, Voice::Dha);
        assert_eq!(Kit::Tabla.palette(), &[Voice::Dha, Voice::Dhin, Voice::Tin]);
    }

    #[test]
    fn bar_voices_come_from_the_palette() {
        for kit in Kit::ALL {
            let v = kit.voices();
            for voice in [v.downbeat, v.beat, v.accent, v.subdivision] {
                assert!(kit.palette().contains(&voice), "{kit:?} lacks {voice:?}");
            }
        }
    }
}
