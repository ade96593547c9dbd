// src/io/wav.rs

use anyhow::Result;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;

use crate::buffer::AudioBuffer;

/// Full-scale float to 16-bit PCM, clamped. Non-finite samples become silence.
pub fn to_i16(s: f32) -> i16 {
    if s.is_finite() {
        (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
    } else {
        0
    }
}

pub fn write_wav(path: impl AsRef<Path>, buffer: &AudioBuffer) -> Result<()> {
    buffer.ensure_rate()?;
    let spec = WavSpec {
        channels: buffer.channels,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path.as_ref(), spec)?;
    for &s in &buffer.samples {
        writer.write_sample(to_i16(s))?;
    }
    writer.finalize()?;
    log::info!("💾 [Wav] wrote {} ({:.2} s)", path.as_ref().display(), buffer.duration_ms() / 1000.0);
    Ok(())
}
