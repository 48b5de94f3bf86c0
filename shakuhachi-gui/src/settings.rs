//! Persisted application settings and result export.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shakuhachi_core::environment::EnvironmentalConditions;
use shakuhachi_core::geometry::FluteGeometry;
use shakuhachi_core::metronome::MetronomeSettings;

pub const SETTINGS_PATH: &str = "shakuhachi_settings.json";
pub const EXPORT_PATH: &str = "shakuhachi_result.json";

/// The 2.3 shaku flute the Traditional tab opens with.
pub const TRADITIONAL_DEFAULT: FluteGeometry = FluteGeometry {
    length: 650.0,
    bore_diameter: 20.5,
    wall_thickness: 3.375,
    hole_diameter: 10.0,
    ergonomic_limit: 60.0,
};

/// The last parameters of every tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub traditional: FluteGeometry,
    pub diatonic: FluteGeometry,
    pub variation: FluteGeometry,
    /// Key of the percentage style picked on the Variation tab.
    pub variation_style: String,
    pub environment: EnvironmentalConditions,
    pub metronome: MetronomeSettings,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            traditional: TRADITIONAL_DEFAULT,
            diatonic: FluteGeometry::default(),
            variation: FluteGeometry::default(),
            variation_style: "nelson-zink".to_string(),
            environment: EnvironmentalConditions::default(),
            metronome: MetronomeSettings::default(),
        }
    }
}

/// Writes `value` as pretty JSON to `path`.
fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json_string = serde_json::to_string_pretty(value)?;
    let mut file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    file.write_all(json_string.as_bytes())?;
    Ok(())
}

pub fn save_settings(settings: &AppSettings, path: impl AsRef<Path>) -> Result<()> {
    write_json(settings, path.as_ref())
}

pub fn load_settings(path: impl AsRef<Path>) -> Result<AppSettings> {
    let path = path.as_ref();
    let mut file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut data = String::new();
    file.read_to_string(&mut data)?;
    let settings = serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok(settings)
}

/// Exports any serialisable result (a calculation, a comparison table).
pub fn export_json<T: Serialize>(value: &T, path: impl AsRef<Path>) -> Result<()> {
    write_json(value, path.as_ref())
}
