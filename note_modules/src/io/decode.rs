// src/io/decode.rs
use anyhow::{Context, Result, anyhow};
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};

use crate::buffer::AudioBuffer;

/// Decodes the default track of any container symphonia understands into
/// interleaved `f32` samples.
pub fn decode_file(path: impl AsRef<Path>) -> Result<AudioBuffer> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .with_context(|| format!("probing {}", path.display()))?;
    let mut format = probed.format;
    let track = format.default_track().ok_or_else(|| anyhow!("no default audio track"))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let mut decoder = get_codecs().make(&codec_params, &DecoderOptions::default())?;
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut out = Vec::<f32>::new();

    // locked on the first packet that carries frames
    let mut layout: Option<(u32, usize)> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => {
                log::warn!("⚠️ [Decode] {} truncated after {} samples: {e}", path.display(), out.len());
                break;
            }
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(e)) => {
                log::warn!("⚠️ [Decode] skipping corrupt packet: {e}");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        let current_channels = spec.channels.count();

        let (_, channels) = match layout {
            Some(l) => l,
            None if decoded.frames() > 0 => {
                log::debug!("🔍 [Decode] locked format: {} Hz / {} ch", spec.rate, current_channels);
                let locked = (spec.rate, current_channels);
                layout = Some(locked);
                locked
            }
            None => continue,
        };

        if sample_buf.as_ref().is_none_or(|b| b.capacity() < decoded.capacity()) {
            sample_buf = Some(SampleBuffer::<f32>::new(decoded.capacity() as u64, spec));
        }
        let Some(buf) = sample_buf.as_mut() else { continue };
        buf.copy_interleaved_ref(decoded);
        let new_samples = buf.samples();

        if current_channels == channels {
            out.extend_from_slice(new_samples);
        } else {
            // keep the locked layout: take the first channel and spread it
            for frame in new_samples.chunks(current_channels.max(1)) {
                out.extend(std::iter::repeat_n(frame[0], channels));
            }
        }
    }

    let (sample_rate, channels) = layout.ok_or_else(|| anyhow!("{} contains no audio", path.display()))?;
    let buffer = AudioBuffer::new(out, sample_rate, channels as u16);
    log::info!(
        "📂 [Decode] {}: {} frames, {} Hz, {} ch",
        path.display(),
        buffer.frames(),
        sample_rate,
        channels
    );
    Ok(buffer)
}
