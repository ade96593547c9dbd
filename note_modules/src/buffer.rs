// src/buffer.rs

use crate::error::{CoreError, CoreResult};

/// Owned block of interleaved samples.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self { samples, sample_rate, channels: channels.max(1) }
    }

    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::new(samples, sample_rate, 1)
    }

    pub fn silence(frames: usize, sample_rate: u32) -> Self {
        Self::mono(vec![0.0; frames], sample_rate)
    }

    /// Pure sine tone, handy for probing the pipeline.
    pub fn tone(freq: f32, sample_rate: u32, secs: f32, amplitude: f32) -> Self {
        let frames = (secs * sample_rate as f32).round() as usize;
        let step = 2.0 * std::f32::consts::PI * freq / sample_rate as f32;
        let samples = (0..frames).map(|i| amplitude * (step * i as f32).sin()).collect();
        Self::mono(samples, sample_rate)
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_ms(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 * 1000.0 / self.sample_rate as f64
    }

    pub fn ensure_rate(&self) -> CoreResult<()> {
        if self.sample_rate == 0 {
            Err(CoreError::UnsupportedSampleRate { rate: self.sample_rate })
        } else {
            Ok(())
        }
    }

    /// Keeps only the first channel.
    pub fn into_mono(self) -> Self {
        if self.channels <= 1 {
            return self;
        }
        let channels = self.channels as usize;
        let samples = self.samples.chunks_exact(channels).map(|frame| frame[0]).collect();
        Self::mono(samples, self.sample_rate)
    }

    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()))
    }
}

pub fn ms_to_frames(ms: i64, sample_rate: u32) -> usize {
    if ms <= 0 {
        return 0;
    }
    ((ms as u64 * sample_rate as u64) / 1000) as usize
}

pub fn secs_to_frames(secs: f32, sample_rate: u32) -> usize {
    (secs.max(0.0) as f64 * sample_rate as f64) as usize
}

/// Repeats `source` end to end and cuts the last repetition to exactly `len`.
pub fn tile_to_length(source: &[f32], len: usize) -> Vec<f32> {
    if source.is_empty() {
        return vec![0.0; len];
    }
    source.iter().copied().cycle().take(len).collect()
}

/// Tiles when too short, truncates when too long.
pub fn fit_to_length(mut source: Vec<f32>, len: usize) -> Vec<f32> {
    if source.len() >= len {
        source.truncate(len);
        source
    } else {
        tile_to_length(&source, len)
    }
}

/// Adds `src` into `dst` starting at `offset`, growing `dst` with silence as needed.
pub fn overlay(dst: &mut Vec<f32>, src: &[f32], offset: usize) {
    let end = offset + src.len();
    if dst.len() < end {
        dst.resize(end, 0.0);
    }
    for (out, &s) in dst[offset..end].iter_mut().zip(src) {
        *out += s;
    }
}

/// Scales so the loudest sample sits at `ceiling`. Silence is left alone.
pub fn normalize_peak(samples: &mut [f32], ceiling: f32) {
    let peak = samples.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()));
    if peak > 0.0 && peak.is_finite() {
        let gain = ceiling / peak;
        for s in samples.iter_mut() {
            *s *= gain;
        }
    }
}

/// Linear ramps over the first and last `fade_frames` samples.
pub fn apply_edge_fades(samples: &mut [f32], fade_frames: usize) {
    let n = fade_frames.min(samples.len());
    if n == 0 {
        return;
    }
    // same shape as linspace(0, 1, n): both end points included
    let denom = (n.max(2) - 1) as f32;
    let len = samples.len();
    for i in 0..n {
        let gain = i as f32 / denom;
        samples[i] *= gain;
        samples[len - 1 - i] *= gain;
    }
}

pub fn headroom_to_ceiling(headroom_db: f32) -> f32 {
    10.0_f32.powf(-headroom_db.abs() / 20.0)
}
