// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::analyzer::{DEFAULT_HOP_MS, DEFAULT_WINDOW_MS};
use crate::compositor::events::TRAILING_DURATION_MS;
use crate::theory::A4_HZ;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    pub window_ms: u32,
    pub hop_ms: u32,
    pub reference_hz: f32, // A4
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_ms: DEFAULT_WINDOW_MS,
            hop_ms: DEFAULT_HOP_MS,
            reference_hz: A4_HZ,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct CompositionConfig {
    pub trailing_duration_ms: i64,
    /// Distance of the normalized peak below full scale.
    pub headroom_db: f32,
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            trailing_duration_ms: TRAILING_DURATION_MS,
            headroom_db: 0.1,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ScaleConfig {
    pub segment_secs: f32,
    pub energy_window_ms: u32,
    pub note_secs: f32,
    pub fade_secs: f32,
    pub gap_secs: f32,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            segment_secs: 1.0,
            energy_window_ms: 100,
            note_secs: 10.0,
            fade_secs: 0.3,
            gap_secs: 0.5,
        }
    }
}

/// Everything the CLI can tune, loaded from one JSON file. Missing sections
/// and fields fall back to their defaults.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub analysis: AnalysisConfig,
    pub composition: CompositionConfig,
    pub scale: ScaleConfig,
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("opening config {}", path.display()))?;
        let settings = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing config {}", path.display()))?;
        log::info!("⚙️ [Config] loaded {}", path.display());
        Ok(settings)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path.as_ref())?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }
}
