// src/analyzer.rs

use rustfft::{Fft, FftPlanner, num_complex::Complex};
use serde::Serialize;
use std::sync::Arc;

use crate::buffer::AudioBuffer;
use crate::error::{CoreError, CoreResult};
use crate::theory::{self, A4_HZ, Note};

pub const DEFAULT_WINDOW_MS: u32 = 50;
pub const DEFAULT_HOP_MS: u32 = 25;

/// One analysis window: where it starts and what dominated it.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyFrame {
    pub time_secs: f64,
    /// `None` for a silent window.
    pub frequency: Option<f32>,
    pub amplitude: f32,
    pub note: Option<Note>,
}

/// Report row for a [`FrequencyFrame`]; silent frames leave the pitch columns empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRow {
    pub time: String,
    pub frequency_hz: Option<f32>,
    pub amplitude: f32,
    pub note: Option<String>,
    pub solfege: Option<String>,
}

impl FrequencyFrame {
    pub fn is_silent(&self) -> bool {
        self.frequency.is_none()
    }

    pub fn to_row(&self) -> AnalysisRow {
        AnalysisRow {
            time: format_timestamp(self.time_secs),
            frequency_hz: self.frequency.map(round_tenth),
            amplitude: round_tenth(self.amplitude),
            note: self.note.map(|n| n.international()),
            solfege: self.note.map(|n| n.solfege()),
        }
    }
}

fn round_tenth(v: f32) -> f32 {
    (v * 10.0).round() / 10.0
}

/// `hh:mm:ss:fff`, truncated to whole milliseconds.
pub fn format_timestamp(secs: f64) -> String {
    let total_ms = (secs.max(0.0) * 1000.0) as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let seconds = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02}:{millis:03}")
}

/// Bins numpy's `fftfreq` treats as strictly positive: 1 ..= ceil(n/2) - 1.
fn positive_bins(n: usize) -> std::ops::Range<usize> {
    1..n.div_ceil(2)
}

/// Index and magnitude of the loudest bin in `range`; the lowest index wins ties.
fn loudest_bin(spectrum: &[Complex<f32>], range: std::ops::Range<usize>) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for k in range {
        let mag = spectrum[k].norm();
        match best {
            Some((_, m)) if mag <= m => {}
            _ => best = Some((k, mag)),
        }
    }
    best
}

fn bin_frequency(bin: usize, n: usize, sample_rate: u32) -> f32 {
    (bin as f64 * sample_rate as f64 / n as f64) as f32
}

/// Frequency carrying the most energy across the whole buffer.
pub fn dominant_frequency(buffer: &AudioBuffer) -> CoreResult<f32> {
    buffer.ensure_rate()?;
    let mono = buffer.clone().into_mono();
    if mono.is_empty() {
        return Err(CoreError::EmptyBuffer);
    }
    let peak = mono.peak();
    if !(peak > 0.0) || !peak.is_finite() {
        return Err(CoreError::SilentInput);
    }

    let n = mono.samples.len();
    let mut spectrum: Vec<Complex<f32>> = mono
        .samples
        .iter()
        .map(|&s| Complex { re: s / peak, im: 0.0 })
        .collect();

    let mut planner = FftPlanner::<f32>::new();
    planner.plan_fft_forward(n).process(&mut spectrum);

    // a single sample has no positive bins; treat it like silence
    let (bin, _) = loudest_bin(&spectrum, positive_bins(n)).ok_or(CoreError::SilentInput)?;
    let freq = bin_frequency(bin, n, mono.sample_rate);
    log::debug!("🔍 [Analyzer] dominant bin {bin}/{n} -> {freq:.1} Hz");
    Ok(freq)
}

/// Slides a `window_ms` window in `hop_ms` steps over the buffer.
pub fn analyze_windowed(
    buffer: &AudioBuffer,
    window_ms: u32,
    hop_ms: u32,
) -> CoreResult<FrameIter> {
    buffer.ensure_rate()?;
    let mono = buffer.clone().into_mono();
    let rate = mono.sample_rate;
    let window = ((window_ms as u64 * rate as u64) / 1000).max(1) as usize;
    let hop = ((hop_ms as u64 * rate as u64) / 1000).max(1) as usize;
    let total = mono.samples.len().saturating_sub(window) / hop;

    let fft = FftPlanner::<f32>::new().plan_fft_forward(window);
    log::info!("📊 [Analyzer] {total} frames ({window} samples, hop {hop}) at {rate} Hz");

    Ok(FrameIter {
        samples: mono.samples,
        sample_rate: rate,
        window,
        hop,
        next: 0,
        total,
        fft,
        scratch: vec![Complex { re: 0.0, im: 0.0 }; window],
        reference: A4_HZ,
    })
}

/// Lazily computed analysis frames. Single pass; consumed as it runs.
pub struct FrameIter {
    samples: Vec<f32>,
    sample_rate: u32,
    window: usize,
    hop: usize,
    next: usize,
    total: usize,
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    reference: f32,
}

impl FrameIter {
    /// Labels notes against a different A4.
    pub fn with_reference(mut self, reference: f32) -> Self {
        self.reference = reference;
        self
    }
}

impl Iterator for FrameIter {
    type Item = FrequencyFrame;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total {
            return None;
        }
        let start = self.next * self.hop;
        let time_secs = start as f64 / self.sample_rate as f64;
        self.next += 1;

        for (slot, &s) in self.scratch.iter_mut().zip(&self.samples[start..start + self.window]) {
            *slot = Complex { re: s, im: 0.0 };
        }
        self.fft.process(&mut self.scratch);

        let loudest = loudest_bin(&self.scratch, positive_bins(self.window));
        let frame = match loudest {
            Some((bin, amplitude)) if amplitude > 0.0 => {
                let freq = bin_frequency(bin, self.window, self.sample_rate);
                FrequencyFrame {
                    time_secs,
                    frequency: Some(freq),
                    amplitude,
                    note: theory::frequency_to_note(freq, self.reference).ok().map(|(n, _)| n),
                }
            }
            other => FrequencyFrame {
                time_secs,
                frequency: None,
                amplitude: other.map(|(_, a)| a).unwrap_or(0.0),
                note: None,
            },
        };
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.total - self.next;
        (left, Some(left))
    }
}

impl ExactSizeIterator for FrameIter {}
