//! # Audio Output Module
//!
//! Plays metronome voices through the default output device using CPAL.
//! Triggers arrive over a channel; the stream callback mixes every voice that
//! is still sounding into the device buffer.
//!
//! ## Features
//! - Automatic output device and configuration selection
//! - Overlapping voices mixed with per-trigger gain
//! - Hard clipping to [-1, 1]

use std::sync::Arc;

use anyhow::{Result, anyhow};
use cpal::SupportedStreamConfigRange;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Receiver;
use log::{error, info};

/// Preferred output sample rate.
pub const TARGET_SAMPLE_RATE: u32 = 44_100;

/// A request to start playing a rendered voice.
#[derive(Debug, Clone)]
pub struct Trigger {
    pub samples: Arc<Vec<f32>>,
    pub gain: f32,
}

/// A voice being played back.
#[derive(Debug, Clone)]
pub struct ActiveVoice {
    samples: Arc<Vec<f32>>,
    gain: f32,
    cursor: usize,
}

impl From<Trigger> for ActiveVoice {
    fn from(trigger: Trigger) -> Self {
        ActiveVoice { samples: trigger.samples, gain: trigger.gain, cursor: 0 }
    }
}

/// Mixes `voices` into an interleaved `output` buffer, advancing each voice
/// and dropping the ones that have ended. Every channel gets the same signal.
pub fn mix_into(output: &mut [f32], channels: usize, voices: &mut Vec<ActiveVoice>) {
    let channels = channels.max(1);
    for frame in output.chunks_mut(channels) {
        let mut sum = 0.0f32;
        for voice in voices.iter_mut() {
            if let Some(sample) = voice.samples.get(voice.cursor) {
                sum += sample * voice.gain;
                voice.cursor += 1;
            }
        }
        frame.fill(sum.clamp(-1.0, 1.0));
    }
    voices.retain(|voice| voice.cursor < voice.samples.len());
}

/// Starts the metronome output stream on the default output device.
///
/// # Arguments
/// * `triggers` - Voices to start, received from the metronome scheduler
///
/// # Returns
/// * `Ok((stream, sample_rate))` - The running stream (keep it alive) and the
///   rate voices must be rendered at
/// * `Err(e)` - No device or no usable f32 configuration
pub fn start_metronome_output(triggers: Receiver<Trigger>) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow!("No output device available"))?;

    info!("[AUDIO] using output device: {}", device.name()?);

    let configs = device.supported_output_configs()?.collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, TARGET_SAMPLE_RATE)
        .ok_or_else(|| anyhow!("No suitable f32 output format found"))?;

    let rate = TARGET_SAMPLE_RATE.clamp(supported_config.min_sample_rate().0, supported_config.max_sample_rate().0);
    let config = supported_config.with_sample_rate(cpal::SampleRate(rate));
    let channels = config.channels() as usize;
    let config: cpal::StreamConfig = config.into();

    info!("[AUDIO] output at {rate} Hz, {channels} channel(s)");

    let mut voices: Vec<ActiveVoice> = Vec::new();
    let stream = device.build_output_stream(
        &config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            voices.extend(triggers.try_iter().map(ActiveVoice::from));
            mix_into(data, channels, &mut voices);
        },
        |err| error!("[AUDIO] output stream error: {err}"),
        None,
    )?;

    stream.play()?;

    Ok((stream, rate))
}

/// Picks the f32 configuration closest to `target_rate`, preferring mono or
/// stereo layouts.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let min_diff = (c.min_sample_rate().0 as i64 - target_rate as i64).abs();
            let max_diff = (c.max_sample_rate().0 as i64 - target_rate as i64).abs();
            let in_range = c.min_sample_rate().0 <= target_rate && target_rate <= c.max_sample_rate().0;
            let rate_cost = if in_range { 0 } else { min_diff.min(max_diff) };
            (c.channels() > 2, rate_cost)
        })
}
