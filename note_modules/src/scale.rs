// src/scale.rs

use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::analyzer::dominant_frequency;
use crate::buffer::{self, AudioBuffer};
use crate::config::ScaleConfig;
use crate::error::CoreResult;
use crate::io::{save_json, write_wav};
use crate::shift::PitchShift;
use crate::theory::{A4_HZ, Note, SCALE_DEGREES, ScaleDegree, frequency_to_note, nearest_degree, ratio_to_cents};

pub const COMPLETE_SCALE_FILE: &str = "complete_scale.wav";
pub const SCALE_INFO_FILE: &str = "scale_info.json";

/// One line of `scale_info.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleFrame {
    pub time_secs: f64,
    pub frequency_hz: f32,
    pub amplitude: f32,
    pub note: String,
    pub solfege: String,
    /// Sustained syllable of the scale step, e.g. `ソー`.
    pub degree: String,
}

#[derive(Debug, Clone)]
pub struct ScaleNote {
    pub degree: &'static ScaleDegree,
    /// Equal-tempered note closest to the rendered pitch; names the file.
    pub nearest: Note,
    pub frame: ScaleFrame,
    pub buffer: AudioBuffer,
}

impl ScaleNote {
    pub fn file_name(&self) -> String {
        format!("{}.wav", self.nearest)
    }
}

#[derive(Debug, Clone)]
pub struct ScaleOutput {
    pub base_frequency: f32,
    pub detected: &'static ScaleDegree,
    pub notes: Vec<ScaleNote>,
    pub complete: AudioBuffer,
}

impl ScaleOutput {
    pub fn frames(&self) -> Vec<ScaleFrame> {
        self.notes.iter().map(|n| n.frame.clone()).collect()
    }

    /// Writes every degree, the concatenated scale and the info document into
    /// `dir`, creating it when needed. Returns the written paths.
    pub fn persist(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let mut written = Vec::with_capacity(self.notes.len() + 2);
        for note in &self.notes {
            let path = dir.join(note.file_name());
            write_wav(&path, &note.buffer)?;
            written.push(path);
        }

        let complete = dir.join(COMPLETE_SCALE_FILE);
        write_wav(&complete, &self.complete)?;
        written.push(complete);

        let info = dir.join(SCALE_INFO_FILE);
        save_json(&info, &self.frames())?;
        written.push(info);

        Ok(written)
    }
}

/// Start of the loudest `window`-sample stretch; the first maximum wins.
pub fn loudest_window_start(samples: &[f32], window: usize) -> usize {
    if window == 0 || samples.len() <= window {
        return 0;
    }
    let mut energy: f64 = samples[..window].iter().map(|&s| (s as f64) * (s as f64)).sum();
    let (mut best, mut best_energy) = (0usize, energy);
    // starts run over 0..len - window
    for start in 1..samples.len() - window {
        let out = samples[start - 1] as f64;
        let inn = samples[start + window - 1] as f64;
        energy += inn * inn - out * out;
        if energy > best_energy {
            best = start;
            best_energy = energy;
        }
    }
    best
}

/// Turns a single recording into an eight-degree just-intonation scale.
pub struct ScaleGenerator {
    config: ScaleConfig,
}

impl ScaleGenerator {
    pub fn new(config: ScaleConfig) -> Self {
        Self { config }
    }

    pub fn generate(&self, source: &AudioBuffer) -> CoreResult<ScaleOutput> {
        let base_frequency = dominant_frequency(source)?;
        let detected = nearest_degree(base_frequency);
        log::info!(
            "🔍 [Scale] detected {:.1} Hz ({} / {})",
            base_frequency,
            detected.sustained,
            detected.letter
        );

        let mut mono = source.clone().into_mono();
        let rate = mono.sample_rate;
        buffer::normalize_peak(&mut mono.samples, 1.0);

        let segment = self.best_segment(&mono);
        let note_frames = buffer::secs_to_frames(self.config.note_secs, rate);
        let fade_frames = buffer::secs_to_frames(self.config.fade_secs, rate);
        let gap_frames = buffer::secs_to_frames(self.config.gap_secs, rate);
        let step_secs = (self.config.note_secs + self.config.gap_secs) as f64;

        let mut notes = Vec::with_capacity(SCALE_DEGREES.len());
        let mut complete = Vec::with_capacity((note_frames + gap_frames) * SCALE_DEGREES.len());

        for (i, degree) in SCALE_DEGREES.iter().enumerate() {
            let shift_ratio = degree.ratio / detected.ratio;
            let frequency = base_frequency * shift_ratio;

            let shifted = PitchShift::Spectral.apply_cents(&segment, ratio_to_cents(shift_ratio) as f64)?;
            let mut samples = buffer::tile_to_length(&shifted.samples, note_frames);
            buffer::apply_edge_fades(&mut samples, fade_frames);

            complete.extend_from_slice(&samples);
            complete.resize(complete.len() + gap_frames, 0.0);

            let (nearest, _) = frequency_to_note(frequency, A4_HZ)?;
            log::info!("🎵 [Scale] {}: {:.1} Hz -> {}", degree.sustained, frequency, nearest);

            notes.push(ScaleNote {
                degree,
                nearest,
                frame: ScaleFrame {
                    time_secs: i as f64 * step_secs,
                    frequency_hz: frequency,
                    amplitude: 1.0,
                    note: nearest.international(),
                    solfege: nearest.solfege(),
                    degree: degree.sustained.to_string(),
                },
                buffer: AudioBuffer::mono(samples, rate),
            });
        }

        Ok(ScaleOutput {
            base_frequency,
            detected,
            notes,
            complete: AudioBuffer::mono(complete, rate),
        })
    }

    /// `segment_secs` starting at the loudest `energy_window_ms`, pulled back
    /// so it stays inside the buffer.
    fn best_segment(&self, mono: &AudioBuffer) -> AudioBuffer {
        let rate = mono.sample_rate;
        let window = buffer::ms_to_frames(self.config.energy_window_ms as i64, rate);
        let len = buffer::secs_to_frames(self.config.segment_secs, rate).min(mono.samples.len());

        let anchor = loudest_window_start(&mono.samples, window);
        let start = anchor.min(mono.samples.len() - len);
        log::debug!("✂️ [Scale] segment {start}..{} of {}", start + len, mono.samples.len());
        AudioBuffer::mono(mono.samples[start..start + len].to_vec(), rate)
    }
}

impl Default for ScaleGenerator {
    fn default() -> Self {
        Self::new(ScaleConfig::default())
    }
}
