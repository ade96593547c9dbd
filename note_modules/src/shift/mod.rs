// src/shift/mod.rs
pub mod resample;
pub mod vocoder;

use crate::buffer::AudioBuffer;
use crate::error::CoreResult;
use crate::theory::{cents_to_semitones, semitones_to_ratio};

/// The two ways a recording can be moved to another pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PitchShift {
    /// Plays the samples back at a different rate. Pitch and duration both
    /// change; a shift up shortens the result by the same ratio.
    Resample,
    /// Phase-vocoder stretch followed by resampling. Duration is preserved.
    Spectral,
}

impl PitchShift {
    /// Shifts by `semitones` (fractional allowed). The result is mono at the
    /// input sample rate; a zero shift hands back the input untouched.
    pub fn apply(self, buffer: &AudioBuffer, semitones: f64) -> CoreResult<AudioBuffer> {
        buffer.ensure_rate()?;
        if semitones == 0.0 {
            return Ok(buffer.clone());
        }
        let mono = buffer.clone().into_mono();
        match self {
            PitchShift::Resample => resample_shift(mono, semitones),
            PitchShift::Spectral => spectral_shift(mono, semitones),
        }
    }

    pub fn apply_cents(self, buffer: &AudioBuffer, cents: f64) -> CoreResult<AudioBuffer> {
        self.apply(buffer, cents_to_semitones(cents))
    }
}

fn resample_shift(mono: AudioBuffer, semitones: f64) -> CoreResult<AudioBuffer> {
    let rate = mono.sample_rate;
    let ratio = semitones_to_ratio(semitones);
    // the data is read as if it had been captured at `new_rate`
    let new_rate = (rate as f64 * ratio).round().clamp(1.0, u32::MAX as f64) as u32;
    let samples = resample::resample_mono(&mono.samples, rate as f64 / new_rate as f64)?;
    log::debug!(
        "🎚️ [Shift] resample {semitones:+.2} st: {} Hz -> {} Hz, {} -> {} frames",
        rate,
        new_rate,
        mono.samples.len(),
        samples.len()
    );
    Ok(AudioBuffer::mono(samples, rate))
}

fn spectral_shift(mono: AudioBuffer, semitones: f64) -> CoreResult<AudioBuffer> {
    let len = mono.samples.len();
    let rate = 2.0_f64.powf(-semitones / 12.0);
    let stretched = vocoder::time_stretch(&mono.samples, rate as f32);
    let mut samples = resample::resample_mono(&stretched, rate)?;
    samples.resize(len, 0.0);
    log::debug!("🎚️ [Shift] spectral {semitones:+.2} st over {len} frames");
    Ok(AudioBuffer::mono(samples, mono.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::dominant_frequency;
    use crate::error::CoreError;

    const RATE: u32 = 8000;

    #[test]
    fn zero_resample_shift_is_bit_identical() {
        let tone = AudioBuffer::tone(330.0, RATE, 0.25, 0.7);
        assert_eq!(PitchShift::Resample.apply(&tone, 0.0).unwrap(), tone);
    }

    #[test]
    fn zero_spectral_shift_is_identity() {
        let tone = AudioBuffer::tone(330.0, RATE, 0.25, 0.7);
        let out = PitchShift::Spectral.apply(&tone, 0.0).unwrap();
        assert_eq!(out.samples.len(), tone.samples.len());
        for (a, b) in out.samples.iter().zip(&tone.samples) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn resample_shift_moves_pitch_and_duration() {
        let tone = AudioBuffer::tone(220.0, RATE, 1.0, 0.5);
        let up = PitchShift::Resample.apply(&tone, 12.0).unwrap();
        assert_eq!(up.sample_rate, RATE);
        assert_eq!(up.samples.len(), 4000);
        let f = dominant_frequency(&up).unwrap();
        assert!((f - 440.0).abs() < 2.0, "got {f}");
    }

    #[test]
    fn resample_round_trip_restores_frequency() {
        let tone = AudioBuffer::tone(261.63, RATE, 1.0, 0.5);
        let base = dominant_frequency(&tone).unwrap();
        for n in [3.0, 5.0, 7.0] {
            let up = PitchShift::Resample.apply(&tone, n).unwrap();
            let back = PitchShift::Resample.apply(&up, -n).unwrap();
            let f = dominant_frequency(&back).unwrap();
            assert!((f - base).abs() <= 2.0, "{n} st: {base} -> {f}");
        }
    }

    #[test]
    fn spectral_shift_keeps_duration() {
        let tone = AudioBuffer::tone(220.0, RATE, 1.0, 0.5);
        let fifth = PitchShift::Spectral.apply_cents(&tone, 701.955).unwrap();
        assert_eq!(fifth.samples.len(), tone.samples.len());
        let f = dominant_frequency(&fifth).unwrap();
        assert!((f - 330.0).abs() < 3.0, "got {f}");

        let down = PitchShift::Spectral.apply(&tone, -12.0).unwrap();
        assert_eq!(down.samples.len(), tone.samples.len());
        let f = dominant_frequency(&down).unwrap();
        assert!((f - 110.0).abs() < 3.0, "got {f}");
    }

    #[test]
    fn zero_rate_is_rejected() {
        let broken = AudioBuffer::mono(vec![0.1; 16], 0);
        for strategy in [PitchShift::Resample, PitchShift::Spectral] {
            assert_eq!(
                strategy.apply(&broken, 2.0),
                Err(CoreError::UnsupportedSampleRate { rate: 0 })
            );
        }
    }

    #[test]
    fn stereo_input_is_shifted_from_the_first_channel() {
        let buf = AudioBuffer::new(vec![0.2; 2000], RATE, 2);
        let out = PitchShift::Resample.apply(&buf, 12.0).unwrap();
        assert_eq!(out.channels, 1);
        assert_eq!(out.samples.len(), 500);
    }
}
