//! # Shakuhachi Workshop - Flute Design GUI
//!
//! Desktop front end for the shakuhachi hole-placement solver and the practice
//! metronome.
//!
//! ## Architecture
//! - **Main Thread**: Iced GUI application with dark theme; calculations run
//!   synchronously on every parameter change
//! - **Metronome Thread**: Dedicated thread that schedules beats and owns the
//!   audio output stream
//! - **Communication**: Crossbeam channels for beats and shutdown
//! - **Updates**: 60 FPS polling via subscription, for the beat display

mod settings;
mod ui;

use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};
use cpal::traits::StreamTrait;
use iced::{Element, Subscription, Theme};
use log::{error, info, warn};
use serde::Serialize;
use shakuhachi_core::audio::{self, Trigger};
use shakuhachi_core::calculator::StyleComparison;
use shakuhachi_core::metronome::kits::{DEFAULT_SEED, Kit, render_kit};
use shakuhachi_core::metronome::program::{Exercise, TempoProgram};
use shakuhachi_core::metronome::tap::TapTempo;
use shakuhachi_core::metronome::{Beat, Metronome, MetronomeSettings, TimeSignature, clamp_bpm};
use shakuhachi_core::resonance::{HoleSpec, MicrotuningAdvice, ResonanceMode, microtuning, resonance_modes};
use shakuhachi_core::styles::find_style;
use shakuhachi_core::{CalculationResult, calculate_by_key, compare_styles};

use settings::{AppSettings, EXPORT_PATH, SETTINGS_PATH};
use ui::main_display::create_main_view;

/// Harmonics listed in the resonance panel.
const RESONANCE_HARMONICS: u32 = 6;

pub fn main() -> iced::Result {
    env_logger::init();
    info!("[MAIN] Starting Shakuhachi Workshop...");
    let result = iced::application("Shakuhachi Workshop", WorkshopApp::update, WorkshopApp::view)
        .subscription(WorkshopApp::subscription)
        .theme(WorkshopApp::theme)
        .run();
    info!("[MAIN] Application finished with result: {:?}", result);
    result
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Traditional,
    Diatonic,
    Variation,
    Metronome,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Traditional, Tab::Diatonic, Tab::Variation, Tab::Metronome];

    pub fn label(&self) -> &'static str {
        match self {
            Tab::Traditional => "Traditional",
            Tab::Diatonic => "Diatonic",
            Tab::Variation => "Variation",
            Tab::Metronome => "Metronome",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryField {
    Length,
    BoreDiameter,
    WallThickness,
    HoleDiameter,
    ErgonomicLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramField {
    StartBpm,
    EndBpm,
    DurationSecs,
    StepBpm,
    BarsPerStep,
}

/// An entry of a pick list: shows `name`, carries `key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub key: &'static str,
    pub name: &'static str,
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    TabSelected(Tab),

    // Calculator inputs
    GeometryChanged(GeometryField, f64),
    StyleSelected(Choice),
    TemperatureChanged(f64),
    HumidityChanged(f64),
    ReferencePitchChanged(f64),
    HarmonicSelected(u32),

    // Metronome controls
    ToggleMetronome,
    BpmChanged(f64),
    BeatsPerBarChanged(u8),
    BeatUnitSelected(u8),
    AccentToggled(bool),
    CountInToggled(bool),
    SubdivisionsToggled(bool),
    KitSelected(Kit),
    VolumeChanged(f32),
    PresetSelected(Choice),
    ProgramSelected(&'static str),
    ProgramChanged(ProgramField, f64),
    ExerciseBpmChanged(f64),
    ExerciseBarsChanged(u32),
    ExerciseBeatsChanged(u8),
    AddExercise,
    RemoveExercise(usize),
    Tap,

    // Persistence
    SaveSettings,
    LoadSettings,
    ExportResult,

    Tick,
}

/// The Variation tab exports its comparison table with the result.
#[derive(Serialize)]
struct VariationExport<'a> {
    result: &'a CalculationResult,
    comparison: &'a [StyleComparison],
}

/// What the metronome thread reports back.
#[derive(Debug, Clone, Copy)]
enum MetronomeEvent {
    Beat(Beat),
    Finished,
}

/// Everything the views need.
#[derive(Debug, Clone)]
pub struct AppDisplayData {
    pub tab: Tab,
    pub settings: AppSettings,

    pub calculation: Result<CalculationResult, String>,
    pub comparison: Vec<StyleComparison>,
    pub resonance: Vec<ResonanceMode>,
    pub advice: Vec<MicrotuningAdvice>,
    pub harmonic: u32,

    pub metronome_running: bool,
    pub last_beat: Option<Beat>,
    pub draft_exercise: Exercise,
    pub status: Option<String>,
}

impl AppDisplayData {
    /// Style key of the calculator tab being shown, if any.
    pub fn style_key(&self) -> Option<&str> {
        match self.tab {
            Tab::Traditional => Some("traditional"),
            Tab::Diatonic => Some("diatonic"),
            Tab::Variation => Some(&self.settings.variation_style),
            Tab::Metronome => None,
        }
    }

    pub fn geometry(&self) -> &shakuhachi_core::geometry::FluteGeometry {
        match self.tab {
            Tab::Diatonic => &self.settings.diatonic,
            Tab::Variation => &self.settings.variation,
            Tab::Traditional | Tab::Metronome => &self.settings.traditional,
        }
    }

    fn geometry_mut(&mut self) -> &mut shakuhachi_core::geometry::FluteGeometry {
        match self.tab {
            Tab::Diatonic => &mut self.settings.diatonic,
            Tab::Variation => &mut self.settings.variation,
            Tab::Traditional | Tab::Metronome => &mut self.settings.traditional,
        }
    }
}

#[derive(Debug)]
struct MetronomeWorker {
    shutdown_tx: Sender<()>,
    thread_handle: Option<JoinHandle<()>>,
}

impl Drop for MetronomeWorker {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.try_send(());
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                error!("[METRO] metronome thread panicked");
            }
        }
    }
}

#[derive(Debug)]
struct WorkshopApp {
    metronome_worker: Option<MetronomeWorker>,
    event_sender: Sender<MetronomeEvent>,
    event_receiver: Receiver<MetronomeEvent>,
    tap_tempo: TapTempo,
    display_data: AppDisplayData,
}

impl Default for WorkshopApp {
    fn default() -> Self {
        let (event_sender, event_receiver) = crossbeam_channel::unbounded();
        let mut app = Self {
            metronome_worker: None,
            event_sender,
            event_receiver,
            tap_tempo: TapTempo::new(),
            display_data: AppDisplayData {
                tab: Tab::Traditional,
                settings: AppSettings::default(),
                calculation: Err(String::new()),
                comparison: Vec::new(),
                resonance: Vec::new(),
                advice: Vec::new(),
                harmonic: 1,
                metronome_running: false,
                last_beat: None,
                draft_exercise: Exercise { bpm: 120.0, time_signature: TimeSignature::COMMON, bars: 8 },
                status: None,
            },
        };
        app.recalculate();
        app
    }
}

impl WorkshopApp {
    /// Re-runs the solver for the visible calculator tab.
    fn recalculate(&mut self) {
        let data = &mut self.display_data;
        let Some(key) = data.style_key().map(str::to_string) else {
            return;
        };
        let geometry = *data.geometry();
        let env = data.settings.environment;

        data.calculation = calculate_by_key(&geometry, &env, &key).map_err(|e| {
            warn!("[CALC] {key}: {e}");
            e.to_string()
        });

        data.comparison = if data.tab == Tab::Variation {
            compare_styles(&geometry, &env).unwrap_or_else(|e| {
                warn!("[CALC] comparison: {e}");
                Vec::new()
            })
        } else {
            Vec::new()
        };

        let holes = data.calculation.as_ref().map(HoleSpec::from_result).unwrap_or_default();
        data.resonance = resonance_modes(&geometry, &env, &holes, RESONANCE_HARMONICS).unwrap_or_default();
        data.advice = data
            .resonance
            .get(data.harmonic as usize - 1)
            .map(|mode| microtuning(mode, &holes, &geometry))
            .unwrap_or_default();
    }

    /// Starts the metronome thread with the current settings.
    fn start_metronome(&mut self) {
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
        let events = self.event_sender.clone();
        let settings = self.display_data.settings.metronome.clone();

        info!("[METRO] starting at {} BPM ({})", settings.bpm, settings.program.label());
        let thread_handle = thread::spawn(move || run_metronome(settings, events, shutdown_rx));

        self.metronome_worker = Some(MetronomeWorker { shutdown_tx, thread_handle: Some(thread_handle) });
        self.display_data.metronome_running = true;
    }

    fn stop_metronome(&mut self) {
        if self.metronome_worker.take().is_some() {
            info!("[METRO] stopped");
        }
        // Beats still queued belong to the stopped thread.
        self.event_receiver.try_iter().for_each(drop);
        self.display_data.metronome_running = false;
        self.display_data.last_beat = None;
    }

    /// Applies a metronome setting change; a running metronome restarts with it.
    fn metronome_changed(&mut self) {
        if self.metronome_worker.is_some() {
            self.stop_metronome();
            self.start_metronome();
        }
    }

    fn update(&mut self, message: Message) {
        match message {
            Message::TabSelected(tab) => {
                self.display_data.tab = tab;
                self.recalculate();
            }
            Message::GeometryChanged(field, value) => {
                let geometry = self.display_data.geometry_mut();
                match field {
                    GeometryField::Length => geometry.length = value,
                    GeometryField::BoreDiameter => geometry.bore_diameter = value,
                    GeometryField::WallThickness => geometry.wall_thickness = value,
                    GeometryField::HoleDiameter => geometry.hole_diameter = value,
                    GeometryField::ErgonomicLimit => geometry.ergonomic_limit = value,
                }
                let limits = self.display_data.style_key().and_then(|key| find_style(key).ok()).map(|s| s.limits);
                if let Some(limits) = limits {
                    let geometry = self.display_data.geometry_mut();
                    *geometry = limits.clamp(*geometry);
                }
                self.recalculate();
            }
            Message::StyleSelected(choice) => {
                self.display_data.settings.variation_style = choice.key.to_string();
                self.recalculate();
            }
            Message::TemperatureChanged(value) => {
                self.display_data.settings.environment.temperature = value;
                self.recalculate();
            }
            Message::HumidityChanged(value) => {
                self.display_data.settings.environment.humidity = value;
                self.recalculate();
            }
            Message::ReferencePitchChanged(value) => {
                self.display_data.settings.environment.reference_pitch = value;
                self.recalculate();
            }
            Message::HarmonicSelected(harmonic) => {
                self.display_data.harmonic = harmonic.clamp(1, RESONANCE_HARMONICS);
                self.recalculate();
            }

            Message::ToggleMetronome => {
                if self.metronome_worker.is_some() {
                    self.stop_metronome();
                } else {
                    self.tap_tempo.reset();
                    self.start_metronome();
                }
            }
            Message::BpmChanged(bpm) => {
                self.display_data.settings.metronome.bpm = clamp_bpm(bpm);
                self.metronome_changed();
            }
            Message::BeatsPerBarChanged(beats) => {
                let unit = self.display_data.settings.metronome.time_signature.denominator();
                self.set_time_signature(beats, unit);
            }
            Message::BeatUnitSelected(unit) => {
                let beats = self.display_data.settings.metronome.time_signature.numerator();
                self.set_time_signature(beats, unit);
            }
            Message::AccentToggled(on) => {
                self.display_data.settings.metronome.accent_first_beat = on;
                self.metronome_changed();
            }
            Message::CountInToggled(on) => {
                self.display_data.settings.metronome.count_in = on;
                self.metronome_changed();
            }
            Message::SubdivisionsToggled(on) => {
                self.display_data.settings.metronome.subdivisions = on;
                self.metronome_changed();
            }
            Message::KitSelected(kit) => {
                self.display_data.settings.metronome.kit = kit;
                self.metronome_changed();
            }
            Message::VolumeChanged(volume) => {
                self.display_data.settings.metronome.volume = volume.clamp(0.0, 1.0);
                self.metronome_changed();
            }
            Message::PresetSelected(choice) => {
                match self.display_data.settings.metronome.apply_preset(choice.key) {
                    Ok(()) => self.metronome_changed(),
                    Err(e) => warn!("[METRO] {e}"),
                }
            }
            Message::ProgramSelected(label) => {
                if let Some(program) = TempoProgram::from_label(label) {
                    self.display_data.settings.metronome.program = program;
                    self.metronome_changed();
                }
            }
            Message::ProgramChanged(field, value) => {
                update_program(&mut self.display_data.settings.metronome.program, field, value);
                self.metronome_changed();
            }
            Message::ExerciseBpmChanged(bpm) => self.display_data.draft_exercise.bpm = clamp_bpm(bpm),
            Message::ExerciseBarsChanged(bars) => self.display_data.draft_exercise.bars = bars.max(1),
            Message::ExerciseBeatsChanged(beats) => {
                let unit = self.display_data.draft_exercise.time_signature.denominator();
                match TimeSignature::new(beats, unit) {
                    Ok(signature) => self.display_data.draft_exercise.time_signature = signature,
                    Err(e) => warn!("[METRO] {e}"),
                }
            }
            Message::AddExercise => {
                let draft = self.display_data.draft_exercise;
                if let TempoProgram::Plan { exercises } = &mut self.display_data.settings.metronome.program {
                    exercises.push(draft);
                    self.metronome_changed();
                }
            }
            Message::RemoveExercise(index) => {
                if let TempoProgram::Plan { exercises } = &mut self.display_data.settings.metronome.program {
                    if index < exercises.len() {
                        exercises.remove(index);
                        self.metronome_changed();
                    }
                }
            }
            Message::Tap => {
                if let Some(bpm) = self.tap_tempo.tap(Instant::now()) {
                    info!("[METRO] tapped {bpm} BPM");
                    self.display_data.settings.metronome.bpm = bpm;
                    self.metronome_changed();
                }
            }

            Message::SaveSettings => {
                self.display_data.status = Some(match settings::save_settings(&self.display_data.settings, SETTINGS_PATH) {
                    Ok(()) => {
                        info!("[MAIN] settings saved to {SETTINGS_PATH}");
                        format!("Saved {SETTINGS_PATH}")
                    }
                    Err(e) => {
                        error!("[MAIN] error saving settings: {e:#}");
                        format!("Save failed: {e}")
                    }
                });
            }
            Message::LoadSettings => match settings::load_settings(SETTINGS_PATH) {
                Ok(loaded) => {
                    info!("[MAIN] settings loaded from {SETTINGS_PATH}");
                    self.display_data.settings = loaded;
                    self.display_data.status = Some(format!("Loaded {SETTINGS_PATH}"));
                    self.recalculate();
                    self.metronome_changed();
                }
                Err(e) => {
                    error!("[MAIN] error loading settings: {e:#}");
                    self.display_data.status = Some(format!("Load failed: {e}"));
                }
            },
            Message::ExportResult => {
                let data = &self.display_data;
                let exported = match (&data.calculation, data.tab) {
                    (Ok(result), Tab::Variation) => settings::export_json(
                        &VariationExport { result, comparison: &data.comparison },
                        EXPORT_PATH,
                    ),
                    (Ok(result), _) => settings::export_json(result, EXPORT_PATH),
                    (Err(e), _) => Err(anyhow::anyhow!("nothing to export: {e}")),
                };
                self.display_data.status = Some(match exported {
                    Ok(()) => {
                        info!("[MAIN] result exported to {EXPORT_PATH}");
                        format!("Exported {EXPORT_PATH}")
                    }
                    Err(e) => {
                        error!("[MAIN] export failed: {e:#}");
                        format!("Export failed: {e}")
                    }
                });
            }

            Message::Tick => {
                let events: Vec<MetronomeEvent> = self.event_receiver.try_iter().collect();
                for event in events {
                    match event {
                        MetronomeEvent::Beat(beat) => self.display_data.last_beat = Some(beat),
                        MetronomeEvent::Finished => {
                            info!("[METRO] program complete");
                            self.stop_metronome();
                        }
                    }
                }
            }
        }
    }

    fn set_time_signature(&mut self, beats: u8, unit: u8) {
        match TimeSignature::new(beats, unit) {
            Ok(signature) => {
                self.display_data.settings.metronome.time_signature = signature;
                self.metronome_changed();
            }
            Err(e) => warn!("[METRO] {e}"),
        }
    }

    fn view(&self) -> Element<'_, Message> {
        create_main_view(&self.display_data)
    }

    fn subscription(&self) -> Subscription<Message> {
        iced::time::every(std::time::Duration::from_millis(16)).map(|_| Message::Tick)
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn update_program(program: &mut TempoProgram, field: ProgramField, value: f64) {
    match program {
        TempoProgram::Accelerando { start_bpm, end_bpm, duration_secs }
        | TempoProgram::Ritardando { start_bpm, end_bpm, duration_secs } => match field {
            ProgramField::StartBpm => *start_bpm = clamp_bpm(value),
            ProgramField::EndBpm => *end_bpm = clamp_bpm(value),
            ProgramField::DurationSecs => *duration_secs = value.max(1.0),
            _ => {}
        },
        TempoProgram::Steps { start_bpm, end_bpm, step_bpm, bars_per_step } => match field {
            ProgramField::StartBpm => *start_bpm = clamp_bpm(value),
            ProgramField::EndBpm => *end_bpm = clamp_bpm(value),
            ProgramField::StepBpm => *step_bpm = value.max(1.0),
            ProgramField::BarsPerStep => *bars_per_step = value.round().max(1.0) as u32,
            ProgramField::DurationSecs => {}
        },
        TempoProgram::Constant | TempoProgram::Plan { .. } => {}
    }
}

/// Body of the metronome thread: schedules beats against a running deadline,
/// triggers their voices and reports them to the GUI until stopped or the
/// program ends.
fn run_metronome(settings: MetronomeSettings, events: Sender<MetronomeEvent>, shutdown_rx: Receiver<()>) {
    let (trigger_tx, trigger_rx) = crossbeam_channel::unbounded::<Trigger>();

    let output = match audio::start_metronome_output(trigger_rx) {
        Ok(output) => Some(output),
        Err(e) => {
            warn!("[METRO] no audio output, running silently: {e}");
            None
        }
    };
    let buffers = output
        .as_ref()
        .map(|(_, sample_rate)| render_kit(settings.kit, *sample_rate, DEFAULT_SEED))
        .unwrap_or_default();
    let gain = settings.volume;

    let mut metronome = Metronome::new(settings);
    let mut deadline = Instant::now();
    loop {
        let Some(beat) = metronome.next_beat() else {
            let _ = events.send(MetronomeEvent::Finished);
            break;
        };
        if let Some(samples) = buffers.get(&beat.voice) {
            let _ = trigger_tx.send(Trigger { samples: Arc::clone(samples), gain });
        }
        if events.send(MetronomeEvent::Beat(beat)).is_err() {
            break;
        }

        deadline += beat.interval;
        crossbeam_channel::select! {
            recv(shutdown_rx) -> _ => break,
            default(deadline.saturating_duration_since(Instant::now())) => {}
        }
    }

    if let Some((stream, _)) = output {
        if let Err(e) = stream.pause() {
            error!("[AUDIO] error pausing stream: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_fields_only_touch_their_own_program() {
        let mut steps = TempoProgram::Steps { start_bpm: 80.0, end_bpm: 160.0, step_bpm: 10.0, bars_per_step: 8 };
        update_program(&mut steps, ProgramField::BarsPerStep, 3.6);
        update_program(&mut steps, ProgramField::DurationSecs, 99.0);
        assert_eq!(steps, TempoProgram::Steps { start_bpm: 80.0, end_bpm: 160.0, step_bpm: 10.0, bars_per_step: 4 });

        let mut accelerando = TempoProgram::Accelerando { start_bpm: 80.0, end_bpm: 160.0, duration_secs: 60.0 };
        update_program(&mut accelerando, ProgramField::EndBpm, 500.0);
        update_program(&mut accelerando, ProgramField::StepBpm, 5.0);
        assert_eq!(
            accelerando,
            TempoProgram::Accelerando { start_bpm: 80.0, end_bpm: 300.0, duration_secs: 60.0 }
        );
    }

    #[test]
    fn each_calculator_tab_has_a_style() {
        let mut data = WorkshopApp::default().display_data;
        for tab in Tab::ALL {
            data.tab = tab;
            match data.style_key() {
                Some(key) => assert!(find_style(key).is_ok(), "{key}"),
                None => assert_eq!(tab, Tab::Metronome),
            }
        }
    }

    #[test]
    fn default_flute_calculates_on_start() {
        let app = WorkshopApp::default();
        let result = app.display_data.calculation.as_ref().unwrap();
        assert_eq!(result.style_key, "traditional");
        assert_eq!(app.display_data.resonance.len(), RESONANCE_HARMONICS as usize);
        assert_eq!(app.display_data.advice.len(), 5);
    }
}
