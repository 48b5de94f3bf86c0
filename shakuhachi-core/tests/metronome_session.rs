//! A full practice session driven through the public metronome API.

use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use shakuhachi_core::metronome::kits::{DEFAULT_SEED, Kit, render_kit};
use shakuhachi_core::metronome::program::TempoProgram;
use shakuhachi_core::metronome::tap::TapTempo;
use shakuhachi_core::metronome::{Beat, Metronome, MetronomeSettings, clamp_bpm};

#[test]
fn stepped_session_runs_to_completion() {
    let settings = MetronomeSettings {
        count_in: true,
        program: TempoProgram::Steps { start_bpm: 80.0, end_bpm: 100.0, step_bpm: 10.0, bars_per_step: 8 },
        ..Default::default()
    };
    let mut metronome = Metronome::new(settings);
    let beats: Vec<_> = std::iter::from_fn(|| metronome.next_beat()).take(1000).collect();

    let (count_in, program): (Vec<&Beat>, Vec<&Beat>) = beats.iter().partition(|b| b.count_in);
    assert_eq!(count_in.len(), 8);
    // Three steps of eight 4/4 bars.
    assert_eq!(program.len(), 96);

    let mut tempi: Vec<f64> = program.iter().map(|b| b.bpm).collect();
    tempi.dedup();
    assert_eq!(tempi, vec![80.0, 90.0, 100.0]);
    assert!(metronome.is_finished());
}

#[test]
fn every_played_voice_has_a_buffer() {
    for kit in Kit::ALL {
        let buffers = render_kit(kit, 22_050, DEFAULT_SEED);
        let settings = MetronomeSettings { kit, subdivisions: true, ..Default::default() };
        let mut metronome = Metronome::new(settings);
        for _ in 0..16 {
            let beat = metronome.next_beat().unwrap();
            let buffer = buffers.get(&beat.voice).unwrap_or_else(|| panic!("{kit}: no {:?}", beat.voice));
            assert!(!buffer.is_empty());
        }
    }
}

#[test]
fn tapped_tempo_drives_the_metronome() {
    let start = Instant::now();
    let mut tapper = TapTempo::new();
    let tapped = (0..4).filter_map(|i| tapper.tap(start + Duration::from_millis(600 * i))).last().unwrap();
    assert_eq!(tapped, 100.0);

    let settings = MetronomeSettings { bpm: clamp_bpm(tapped), ..Default::default() };
    let beat = Metronome::new(settings).next_beat().unwrap();
    assert!((beat.interval.as_secs_f64() - 0.6).abs() < 1e-6);
}
