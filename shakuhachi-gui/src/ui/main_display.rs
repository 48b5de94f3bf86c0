//! # Main Display Module
//!
//! Layout of the workshop window: tab bar, the calculator and metronome
//! pages, and the file sidebar.

use iced::widget::{
    Space, button, checkbox, column, container, horizontal_space, pick_list, row, scrollable, slider, text,
};
use iced::{Alignment, Color, Element, Length};
use shakuhachi_core::CalculationResult;
use shakuhachi_core::environment::{HUMIDITY_RANGE, REFERENCE_PITCH_RANGE, TEMPERATURE_RANGE};
use shakuhachi_core::geometry::GeometryLimits;
use shakuhachi_core::metronome::kits::Kit;
use shakuhachi_core::metronome::program::TempoProgram;
use shakuhachi_core::metronome::{MAX_BPM, MIN_BPM, presets};
use shakuhachi_core::styles::{find_style, percentage_styles};

use super::{beat_indicator::BeatIndicator, flute_diagram::FluteDiagram};
use crate::{AppDisplayData, Choice, GeometryField, Message, ProgramField, Tab};

const ACTIVE_COLOR: Color = Color::from_rgb(0.2, 0.45, 0.8);
const WARNING_COLOR: Color = Color::from_rgb(1.0, 0.76, 0.0);
const ERROR_COLOR: Color = Color::from_rgb(1.0, 0.3, 0.3);

const BEAT_UNITS: [u8; 5] = [1, 2, 4, 8, 16];
const PROGRAM_LABELS: [&str; 5] = ["Constant", "Accelerando", "Ritardando", "Steps", "Plan"];

/// One button of the file sidebar.
#[derive(Debug, Clone)]
struct ButtonConfig {
    label: &'static str,
    message: Message,
}

const FILE_BUTTONS: &[ButtonConfig] = &[
    ButtonConfig { label: "Save Settings", message: Message::SaveSettings },
    ButtonConfig { label: "Load Settings", message: Message::LoadSettings },
    ButtonConfig { label: "Export Result", message: Message::ExportResult },
];

/// Creates the complete main application view.
pub fn create_main_view(data: &AppDisplayData) -> Element<'_, Message> {
    let page = match data.tab {
        Tab::Metronome => create_metronome_page(data),
        _ => create_calculator_page(data),
    };

    let main_content = row![
        column![
            text("Shakuhachi Workshop").size(28),
            create_tab_bar(data.tab),
            Space::with_height(10),
            scrollable(page).height(Length::Fill),
        ]
        .width(Length::Fill)
        .spacing(10),
        Space::with_width(10),
        create_sidebar(data),
    ]
    .align_y(Alignment::Start)
    .padding(20);

    container(main_content).width(Length::Fill).height(Length::Fill).into()
}

fn filled(color: Color) -> impl Fn(&iced::Theme, button::Status) -> button::Style {
    move |_theme, _status| button::Style {
        background: Some(iced::Background::Color(color)),
        text_color: Color::WHITE,
        ..button::Style::default()
    }
}

fn create_tab_bar(active: Tab) -> Element<'static, Message> {
    Tab::ALL
        .into_iter()
        .fold(row![].spacing(6), |bar, tab| {
            let mut tab_button = button(text(tab.label()).size(16)).padding([6, 14]).on_press(Message::TabSelected(tab));
            if tab == active {
                tab_button = tab_button.style(filled(ACTIVE_COLOR));
            }
            bar.push(tab_button)
        })
        .into()
}

fn create_sidebar(data: &AppDisplayData) -> Element<'_, Message> {
    let buttons = FILE_BUTTONS.iter().fold(column![].spacing(8), |col, config| {
        col.push(
            button(text(config.label).size(14).width(Length::Fill))
                .padding([6, 10])
                .on_press(config.message.clone()),
        )
    });

    let mut sections = column![text("File").size(18), Space::with_height(10), buttons].spacing(5);
    if let Some(status) = &data.status {
        sections = sections.push(Space::with_height(10)).push(text(status).size(13));
    }

    container(sections.padding(15)).width(Length::Fixed(220.0)).height(Length::Fill).into()
}

/// A label, a slider and the value with its unit.
fn labeled_slider<'a, T>(
    label: &'a str,
    range: std::ops::RangeInclusive<T>,
    value: T,
    step: T,
    shown: String,
    on_change: impl Fn(T) -> Message + 'a,
) -> Element<'a, Message>
where
    T: Copy + From<u8> + PartialOrd + num_traits::FromPrimitive + 'a,
    f64: From<T>,
{
    row![
        text(label).size(14).width(Length::Fixed(150.0)),
        slider(range, value, on_change).step(step).width(Length::Fill),
        text(shown).size(14).width(Length::Fixed(80.0)),
    ]
    .spacing(10)
    .align_y(Alignment::Center)
    .into()
}

fn geometry_slider(
    label: &'static str,
    field: GeometryField,
    value: f64,
    (min, max): (f64, f64),
    step: f64,
) -> Element<'static, Message> {
    labeled_slider(label, min..=max, value, step, format!("{value:.1} mm"), move |v| {
        Message::GeometryChanged(field, v)
    })
}

fn cell<'a>(content: impl ToString, width: f32) -> Element<'a, Message> {
    text(content.to_string()).size(14).width(Length::Fixed(width)).into()
}

fn panel<'a>(title: &'a str, content: impl Into<Element<'a, Message>>) -> Element<'a, Message> {
    container(column![text(title).size(18), Space::with_height(8), content.into()].spacing(5).padding(15))
        .width(Length::Fill)
        .into()
}

fn create_calculator_page(data: &AppDisplayData) -> Element<'_, Message> {
    let geometry = data.geometry();
    let limits: Option<GeometryLimits> = data.style_key().and_then(|key| find_style(key).ok()).map(|s| s.limits);

    let mut inputs = column![].spacing(8);
    if data.tab == Tab::Variation {
        let choices: Vec<Choice> = percentage_styles().map(|s| Choice { key: s.key, name: s.name }).collect();
        let selected = choices.iter().copied().find(|c| c.key == data.settings.variation_style);
        inputs = inputs.push(
            row![text("Style").size(14).width(Length::Fixed(150.0)), pick_list(choices, selected, Message::StyleSelected)]
                .spacing(10)
                .align_y(Alignment::Center),
        );
    }
    if let Some(limits) = limits {
        inputs = inputs
            .push(geometry_slider("Length", GeometryField::Length, geometry.length, limits.length, 1.0))
            .push(geometry_slider("Bore diameter", GeometryField::BoreDiameter, geometry.bore_diameter, limits.bore_diameter, 0.5))
            .push(geometry_slider("Wall thickness", GeometryField::WallThickness, geometry.wall_thickness, limits.wall_thickness, 0.125))
            .push(geometry_slider("Hole diameter", GeometryField::HoleDiameter, geometry.hole_diameter, limits.hole_diameter, 0.5))
            .push(geometry_slider("Finger reach", GeometryField::ErgonomicLimit, geometry.ergonomic_limit, limits.ergonomic_limit, 1.0));
    }
    if data.tab == Tab::Variation {
        let env = &data.settings.environment;
        inputs = inputs
            .push(labeled_slider("Temperature", TEMPERATURE_RANGE.0..=TEMPERATURE_RANGE.1, env.temperature, 0.5, format!("{:.1} °C", env.temperature), Message::TemperatureChanged))
            .push(labeled_slider("Humidity", HUMIDITY_RANGE.0..=HUMIDITY_RANGE.1, env.humidity, 1.0, format!("{:.0} %", env.humidity), Message::HumidityChanged))
            .push(labeled_slider("Reference A", REFERENCE_PITCH_RANGE.0..=REFERENCE_PITCH_RANGE.1, env.reference_pitch, 0.5, format!("{:.1} Hz", env.reference_pitch), Message::ReferencePitchChanged));
    }

    let mut page = column![panel("Parameters", inputs)].spacing(10);

    match &data.calculation {
        Ok(result) => {
            page = page
                .push(panel("Flute", FluteDiagram::new(result).view()))
                .push(panel("Holes", create_results(result)))
                .push(panel("Spans", create_spans(result)));
            if data.tab == Tab::Variation {
                page = page.push(panel("Style Comparison", create_comparison(data)));
            }
            page = page.push(panel("Resonance", create_resonance(data)));
        }
        Err(e) if !e.is_empty() => {
            page = page.push(text(format!("Cannot calculate: {e}")).size(16).color(ERROR_COLOR));
        }
        Err(_) => {}
    }
    page.into()
}

fn create_results(result: &CalculationResult) -> Element<'_, Message> {
    let summary = column![
        text(format!(
            "Fundamental {:.2} Hz ({})    Length class {} shaku    Aspect ratio {:.2}    Speed of sound {:.1} m/s",
            result.base_frequency, result.base_note, result.length_class, result.aspect_ratio, result.speed_of_sound
        ))
        .size(14),
    ];

    let header = row![
        cell("Hole", 60.0),
        cell("Position", 90.0),
        cell("Frequency", 100.0),
        cell("Note", 60.0),
        cell("Target", 100.0),
        cell("Cents", 70.0),
        cell("Alternate", 90.0),
    ]
    .spacing(6);

    let rows = result.holes.iter().rev().fold(column![header].spacing(4), |table, hole| {
        let label = if hole.is_thumb { format!("{} (thumb)", hole.hole) } else { hole.hole.to_string() };
        let mut line = row![
            cell(label, 60.0),
            cell(format!("{:.0} mm", hole.position), 90.0),
            cell(format!("{:.2} Hz", hole.frequency), 100.0),
            cell(hole.note, 60.0),
            cell(format!("{:.2} Hz", hole.intended_frequency), 100.0),
            cell(hole.deviation_cents.map_or("-".to_string(), |c| format!("{c:+}")), 70.0),
            cell(hole.alternate_position.map_or("-".to_string(), |p| format!("{p:.0} mm")), 90.0),
        ]
        .spacing(6);
        if hole.error {
            line = line.push(text("outside the flute").size(14).color(ERROR_COLOR));
        }
        table.push(line)
    });

    column![summary, Space::with_height(8), rows].into()
}

fn create_spans(result: &CalculationResult) -> Element<'_, Message> {
    let spans = result.spans.spans.iter().rev().fold(column![].spacing(4), |col, (key, distance)| {
        col.push(text(format!("{key}: {distance:.0} mm")).size(14))
    });
    let violations = result.spans.violations.iter().fold(column![].spacing(4), |col, violation| {
        col.push(
            text(format!(
                "Span {} is {:.0} mm (reach {:.0} mm): move hole {} to {:.0} mm",
                violation.span, violation.distance, violation.allowed, violation.moved_hole, violation.alternate_position
            ))
            .size(14)
            .color(WARNING_COLOR),
        )
    });
    row![spans.width(Length::Fixed(160.0)), violations].spacing(20).into()
}

fn create_comparison(data: &AppDisplayData) -> Element<'_, Message> {
    let hole_count = data.comparison.first().map_or(0, |row| row.holes.len());
    let header = (1..=hole_count)
        .rev()
        .fold(row![cell("Style", 220.0)].spacing(6), |header, hole| header.push(cell(format!("Hole {hole}"), 110.0)));

    data.comparison
        .iter()
        .fold(column![header].spacing(4), |table, style| {
            let line = style.holes.iter().rev().fold(row![cell(&style.style_name, 220.0)].spacing(6), |line, hole| {
                line.push(cell(format!("{:.0} mm {}", hole.position, hole.note), 110.0))
            });
            table.push(line)
        })
        .into()
}

fn create_resonance(data: &AppDisplayData) -> Element<'_, Message> {
    let modes = data.resonance.iter().fold(column![].spacing(4), |col, mode| {
        col.push(
            text(format!(
                "n = {}: {:.1} Hz, wavelength {:.3} m, Q {:.1}",
                mode.harmonic, mode.frequency, mode.wavelength, mode.quality_factor
            ))
            .size(14),
        )
    });

    let harmonic_count = data.resonance.len().max(1) as u32;
    let picker = labeled_slider(
        "Tune against harmonic",
        1..=harmonic_count,
        data.harmonic.min(harmonic_count),
        1,
        format!("n = {}", data.harmonic),
        Message::HarmonicSelected,
    );

    let advice = data.advice.iter().fold(column![].spacing(4), |col, hole| {
        let suggestion = if hole.suggested_movement_mm == 0.0 {
            "in tolerance".to_string()
        } else {
            format!("move {:+.1} mm", hole.suggested_movement_mm)
        };
        col.push(
            text(format!(
                "Hole {}: node at {:.0} mm ({:.0} mm away), shift {:+.1} cents, {}",
                hole.hole, hole.nearest_node_mm, hole.node_distance_mm, hole.cents_shift, suggestion
            ))
            .size(14),
        )
    });

    column![modes, Space::with_height(8), picker, advice].spacing(6).into()
}

fn create_metronome_page(data: &AppDisplayData) -> Element<'_, Message> {
    let settings = &data.settings.metronome;
    let signature = settings.time_signature;

    let shown_bpm = data.last_beat.map_or(settings.bpm, |beat| beat.bpm);
    let (toggle_label, toggle_color) = if data.metronome_running {
        ("Stop", Color::from_rgb(0.8, 0.2, 0.2))
    } else {
        ("Start", Color::from_rgb(0.2, 0.7, 0.3))
    };
    let status = match data.last_beat {
        Some(beat) if beat.count_in => format!("Count-in bar {}", beat.bar),
        Some(beat) => format!("Bar {}  Beat {}", beat.bar, beat.beat),
        None => String::new(),
    };

    let transport = row![
        text(format!("{shown_bpm:.0} BPM")).size(40),
        horizontal_space(),
        text(status).size(16),
        button(text(toggle_label).size(18)).padding([10, 24]).style(filled(toggle_color)).on_press(Message::ToggleMetronome),
        button(text("Tap").size(18)).padding([10, 24]).on_press(Message::Tap),
    ]
    .spacing(12)
    .align_y(Alignment::Center);

    let preset_choices: Vec<Choice> = presets().iter().map(|p| Choice { key: p.key, name: p.name }).collect();
    let basics = column![
        labeled_slider("Tempo", MIN_BPM..=MAX_BPM, settings.bpm, 1.0, format!("{:.0} BPM", settings.bpm), Message::BpmChanged),
        labeled_slider("Beats per bar", 1..=12, signature.numerator(), 1, signature.to_string(), Message::BeatsPerBarChanged),
        row![
            text("Beat unit").size(14).width(Length::Fixed(150.0)),
            pick_list(&BEAT_UNITS[..], Some(signature.denominator()), Message::BeatUnitSelected),
            text("Kit").size(14),
            pick_list(&Kit::ALL[..], Some(settings.kit), Message::KitSelected),
            text("Preset").size(14),
            pick_list(preset_choices, None::<Choice>, Message::PresetSelected).placeholder("Choose..."),
        ]
        .spacing(10)
        .align_y(Alignment::Center),
        labeled_slider("Volume", 0.0..=1.0, settings.volume, 0.05, format!("{:.0} %", settings.volume * 100.0), Message::VolumeChanged),
        row![
            checkbox("Accent first beat", settings.accent_first_beat).on_toggle(Message::AccentToggled),
            checkbox("Count-in", settings.count_in).on_toggle(Message::CountInToggled),
            checkbox("Eighth notes", settings.subdivisions).on_toggle(Message::SubdivisionsToggled),
        ]
        .spacing(20),
    ]
    .spacing(8);

    column![
        panel("Metronome", column![transport, BeatIndicator::new(signature.numerator(), data.last_beat).view()].spacing(10)),
        panel("Settings", basics),
        panel("Tempo Program", create_program_controls(data)),
    ]
    .spacing(10)
    .into()
}

fn create_program_controls(data: &AppDisplayData) -> Element<'_, Message> {
    let program = &data.settings.metronome.program;
    let picker = row![
        text("Program").size(14).width(Length::Fixed(150.0)),
        pick_list(&PROGRAM_LABELS[..], Some(program.label()), Message::ProgramSelected),
    ]
    .spacing(10)
    .align_y(Alignment::Center);

    let bpm_slider = |label: &'static str, field: ProgramField, value: f64| {
        labeled_slider(label, MIN_BPM..=MAX_BPM, value, 1.0, format!("{value:.0} BPM"), move |v| {
            Message::ProgramChanged(field, v)
        })
    };

    let controls: Element<'_, Message> = match program {
        TempoProgram::Constant => text("Plays the tempo above until stopped.").size(14).into(),
        TempoProgram::Accelerando { start_bpm, end_bpm, duration_secs }
        | TempoProgram::Ritardando { start_bpm, end_bpm, duration_secs } => column![
            bpm_slider("Start tempo", ProgramField::StartBpm, *start_bpm),
            bpm_slider("End tempo", ProgramField::EndBpm, *end_bpm),
            labeled_slider("Duration", 5.0..=600.0, *duration_secs, 5.0, format!("{duration_secs:.0} s"), |v| {
                Message::ProgramChanged(ProgramField::DurationSecs, v)
            }),
        ]
        .spacing(8)
        .into(),
        TempoProgram::Steps { start_bpm, end_bpm, step_bpm, bars_per_step } => column![
            bpm_slider("Start tempo", ProgramField::StartBpm, *start_bpm),
            bpm_slider("End tempo", ProgramField::EndBpm, *end_bpm),
            labeled_slider("Step", 1.0..=50.0, *step_bpm, 1.0, format!("+{step_bpm:.0} BPM"), |v| {
                Message::ProgramChanged(ProgramField::StepBpm, v)
            }),
            labeled_slider("Bars per step", 1.0..=32.0, *bars_per_step as f64, 1.0, format!("{bars_per_step} bars"), |v| {
                Message::ProgramChanged(ProgramField::BarsPerStep, v)
            }),
        ]
        .spacing(8)
        .into(),
        TempoProgram::Plan { exercises } => {
            let list = exercises.iter().enumerate().fold(column![].spacing(4), |col, (index, exercise)| {
                col.push(
                    row![
                        cell(format!("{}.", index + 1), 30.0),
                        cell(format!("{:.0} BPM", exercise.bpm), 90.0),
                        cell(exercise.time_signature, 50.0),
                        cell(format!("{} bars", exercise.bars), 80.0),
                        button(text("Remove").size(12)).padding([2, 8]).on_press(Message::RemoveExercise(index)),
                    ]
                    .spacing(6)
                    .align_y(Alignment::Center),
                )
            });
            let draft = data.draft_exercise;
            column![
                list,
                labeled_slider("Exercise tempo", MIN_BPM..=MAX_BPM, draft.bpm, 1.0, format!("{:.0} BPM", draft.bpm), Message::ExerciseBpmChanged),
                labeled_slider("Exercise bars", 1..=64, draft.bars, 1, format!("{} bars", draft.bars), Message::ExerciseBarsChanged),
                labeled_slider(
                    "Exercise beats",
                    1..=12,
                    draft.time_signature.numerator(),
                    1,
                    draft.time_signature.to_string(),
                    Message::ExerciseBeatsChanged,
                ),
                button(text("Add Exercise").size(14)).padding([6, 10]).on_press(Message::AddExercise),
            ]
            .spacing(8)
            .into()
        }
    };

    column![picker, controls].spacing(10).into()
}
