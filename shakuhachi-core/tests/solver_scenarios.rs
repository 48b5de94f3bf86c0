//! End-to-end scenarios for the hole-placement solver.

use pretty_assertions::assert_eq;
use shakuhachi_core::environment::{EnvironmentalConditions, SpeedModel, speed_of_sound};
use shakuhachi_core::forward::frequency_at;
use shakuhachi_core::geometry::FluteGeometry;
use shakuhachi_core::inverse::{Interval, base_frequency, solve_chain};
use shakuhachi_core::spans::{FIVE_HOLE, SpanKey, check_spans};
use shakuhachi_core::styles::percentage_styles;
use shakuhachi_core::tuning::{PitchName, cents, note_name};
use shakuhachi_core::{calculate_by_key, compare_styles};

fn positions(geometry: &FluteGeometry, key: &str) -> Vec<f64> {
    calculate_by_key(geometry, &EnvironmentalConditions::default(), key)
        .unwrap()
        .holes
        .iter()
        .map(|hole| hole.position)
        .collect()
}

#[test]
fn traditional_650mm_flute() {
    let geometry = FluteGeometry::new(650.0, 20.5, 3.375, 10.0, 60.0);
    let placed = positions(&geometry, "traditional");
    assert_eq!(placed, vec![548.0, 485.0, 391.0, 343.0, 298.0]);
    assert!(placed.iter().all(|&p| p > 0.0 && p < 650.0));
    assert!(placed.windows(2).all(|w| w[1] < w[0]));
}

#[test]
fn diatonic_540mm_flute_keeps_semitone_spans_short() {
    let placed = positions(&FluteGeometry::default(), "diatonic");
    assert_eq!(placed, vec![455.0, 427.0, 372.0, 326.0, 285.0, 268.0, 231.0]);

    let span = |lower: usize, upper: usize| placed[lower - 1] - placed[upper - 1];
    for short in [span(1, 2), span(5, 6)] {
        for long in [span(2, 3), span(3, 4), span(4, 5)] {
            assert!(short < long, "{short} should be shorter than {long}");
        }
    }
}

#[test]
fn chain_positions_fall_as_intervals_rise() {
    for length in [350.0, 540.0, 800.0, 1200.0] {
        let geometry = FluteGeometry { length, ..FluteGeometry::default() };
        for step in [1.0, 2.0, 3.0] {
            let intervals: Vec<Interval> = (1..=5).map(|i| Interval::Semitones(i as f64 * step)).collect();
            let holes = solve_chain(&geometry, &intervals).unwrap();
            assert!(holes.windows(2).all(|w| w[1].position < w[0].position), "{length} mm, step {step}");
        }
    }
}

#[test]
fn percentage_styles_play_sharp_of_their_intended_pitch() {
    let env = EnvironmentalConditions::default();
    for geometry in [FluteGeometry::default(), FluteGeometry::new(650.0, 20.5, 3.375, 10.0, 60.0)] {
        let fundamental = base_frequency(geometry.length);
        for style in percentage_styles() {
            let result = calculate_by_key(&geometry, &env, style.key).unwrap();
            for (hole, semitones) in result.holes.iter().zip([3.0, 5.0, 7.0, 10.0, 12.0]) {
                let intended = fundamental * Interval::Semitones(semitones).ratio();
                let played = frequency_at(hole.position, &geometry, &env).unwrap();
                let deviation = cents(played, intended);
                assert!(
                    (0.0..=350.0).contains(&deviation),
                    "{} hole {} is {deviation:.1} cents off",
                    style.key,
                    hole.hole
                );
                if hole.hole == 1 {
                    assert!(deviation < 100.0, "{} hole 1 is {deviation:.1} cents off", style.key);
                }
            }
        }
    }
}

#[test]
fn calculated_notes_name_themselves() {
    let result = calculate_by_key(&FluteGeometry::default(), &EnvironmentalConditions::default(), "diatonic").unwrap();
    for hole in &result.holes {
        let PitchName::Known { semitones } = hole.note else {
            panic!("hole {} has no name", hole.hole);
        };
        let exact = 440.0 * 2.0_f64.powf(semitones as f64 / 12.0);
        assert_eq!(note_name(exact, 440.0), hole.note);
    }
    assert_eq!(note_name(440.0, 440.0).to_string(), "A");
}

#[test]
fn one_wide_span_gives_one_alternate() {
    let comfortable = [430.0, 380.0, 330.0, 270.0, 240.0];
    assert!(check_spans(&comfortable, &FIVE_HOLE, 60.0).alternates.is_empty());

    // Span 4-3 is one millimetre past the limit.
    let report = check_spans(&[430.0, 380.0, 330.0, 269.0, 240.0], &FIVE_HOLE, 60.0);
    assert_eq!(report.alternates.len(), 1);
    assert_eq!(report.alternate_for(3), Some(329.0));
    assert_eq!(report.spans[&SpanKey { upper: 4, lower: 3 }], 61.0);
}

#[test]
fn speed_of_sound_tracks_the_room() {
    let cold = speed_of_sound(0.0, 50.0);
    let warm = speed_of_sound(30.0, 50.0);
    assert!(warm > cold);
    assert!(speed_of_sound(20.0, 100.0) >= speed_of_sound(20.0, 0.0));

    let env = EnvironmentalConditions::default();
    assert!(env.speed_of_sound(SpeedModel::HumidAir) > 340.0);
}

#[test]
fn comparison_table_serialises_for_export() {
    let rows = compare_styles(&FluteGeometry::default(), &EnvironmentalConditions::default()).unwrap();
    let json = serde_json::to_value(&rows).unwrap();
    assert_eq!(json.as_array().map(Vec::len), Some(8));
    assert_eq!(json[0]["style_key"], "nelson-zink");
    assert!(json[0]["holes"][0]["note"].is_string());
}
