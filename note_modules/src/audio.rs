// src/audio.rs

use anyhow::{Result, anyhow};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, SizedSample, Stream, StreamConfig};
use ringbuf::HeapRb;
use ringbuf::traits::{Consumer, Producer, Split};
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};
use std::time::{Duration, Instant};

use crate::buffer::AudioBuffer;
use crate::error::CoreResult;
use crate::shift::resample::resample_mono;

const RING_CAPACITY: usize = 131_072;
/// Slack on top of the buffer's own length before playback counts as stalled.
const STALL_MARGIN: Duration = Duration::from_secs(2);

/// Helper struct to hold output device info
pub struct OutputConfig {
    pub device: Device,
    pub config: StreamConfig,
    pub sample_format: SampleFormat,
    pub output_channels: usize,
    pub output_sample_rate: u32,
}

/// Finds the default audio output device and its config.
pub fn setup_output_device() -> Result<OutputConfig> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow!("no output device available"))?;
    let supported_config = device.default_output_config()?;
    let sample_format = supported_config.sample_format();
    let config = supported_config.config();
    let output_channels = config.channels as usize;
    let output_sample_rate = config.sample_rate.0;

    log::info!("🔊 [Audio] output device: {} ch, {} Hz", output_channels, output_sample_rate);

    Ok(OutputConfig {
        device,
        config,
        sample_format,
        output_channels,
        output_sample_rate,
    })
}

/// Mono at the device rate, copied into every output channel.
pub fn prepare_for_device(buffer: &AudioBuffer, rate: u32, channels: usize) -> CoreResult<Vec<f32>> {
    buffer.ensure_rate()?;
    let mono = buffer.clone().into_mono();
    let samples = if mono.sample_rate == rate {
        mono.samples
    } else {
        resample_mono(&mono.samples, rate as f64 / mono.sample_rate as f64)?
    };
    Ok(spread_channels(&samples, channels))
}

pub fn spread_channels(mono: &[f32], channels: usize) -> Vec<f32> {
    let channels = channels.max(1);
    mono.iter().flat_map(|&s| std::iter::repeat_n(s, channels)).collect()
}

/// Progress shared between the device callbacks and the waiting thread.
struct PlaybackWatch {
    played: Arc<AtomicU64>,
    failed: Arc<AtomicBool>,
    total: u64,
    deadline: Instant,
}

impl PlaybackWatch {
    fn new(total: u64, length: Duration) -> Self {
        Self {
            played: Arc::new(AtomicU64::new(0)),
            failed: Arc::new(AtomicBool::new(false)),
            total,
            deadline: Instant::now() + length + STALL_MARGIN,
        }
    }

    /// `Ok(true)` once every sample reached the device; an error when the
    /// stream reported a failure or the deadline passed first.
    fn finished(&self) -> Result<bool> {
        if self.failed.load(Ordering::Relaxed) {
            anyhow::bail!("output stream failed");
        }
        let played = self.played.load(Ordering::Relaxed);
        if played >= self.total {
            return Ok(true);
        }
        if Instant::now() >= self.deadline {
            anyhow::bail!("playback stalled after {} of {} samples", played, self.total);
        }
        Ok(false)
    }
}

fn build_stream<T, C>(
    device: &Device,
    config: &StreamConfig,
    watch: &PlaybackWatch,
    mut consumer: C,
) -> Result<Stream>
where
    T: cpal::Sample + cpal::FromSample<f32> + SizedSample,
    C: Consumer<Item = f32> + Send + 'static,
{
    let played = watch.played.clone();
    let failed = watch.failed.clone();
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                for out in data.iter_mut() {
                    let s = match consumer.try_pop() {
                        Some(s) => {
                            played.fetch_add(1, Ordering::Relaxed);
                            s
                        }
                        None => 0.0,
                    };
                    *out = T::from_sample(s);
                }
            },
            move |err| {
                log::error!("❌ [Audio] stream error: {err}");
                failed.store(true, Ordering::Relaxed);
            },
            None,
        )
        .map_err(Into::into)
}

/// Plays `buffer` on the default output device and blocks until it is done.
pub fn play_buffer(buffer: &AudioBuffer) -> Result<()> {
    let OutputConfig {
        device,
        config,
        sample_format,
        output_channels,
        output_sample_rate,
    } = setup_output_device()?;

    let samples = prepare_for_device(buffer, output_sample_rate, output_channels)?;
    let frames = samples.len() / output_channels.max(1);
    let length = Duration::from_secs_f64(frames as f64 / output_sample_rate.max(1) as f64);
    let watch = PlaybackWatch::new(samples.len() as u64, length);

    let (mut producer, consumer) = HeapRb::<f32>::new(RING_CAPACITY).split();

    let stream = match sample_format {
        SampleFormat::F32 => build_stream::<f32, _>(&device, &config, &watch, consumer)?,
        SampleFormat::I16 => build_stream::<i16, _>(&device, &config, &watch, consumer)?,
        SampleFormat::U16 => build_stream::<u16, _>(&device, &config, &watch, consumer)?,
        other => anyhow::bail!("unsupported sample format: {other:?}"),
    };
    stream.play()?;
    log::info!("▶️ [Audio] playing {:.2} s", buffer.duration_ms() / 1000.0);

    let mut idx = 0usize;
    while idx < samples.len() {
        let pushed = producer.push_slice(&samples[idx..]);
        idx += pushed;
        if pushed == 0 {
            watch.finished()?;
            std::thread::park_timeout(Duration::from_millis(2));
        }
    }
    while !watch.finished()? {
        std::thread::sleep(Duration::from_millis(10));
    }
    // let the device drain its own buffer
    std::thread::sleep(Duration::from_millis(100));
    drop(stream);
    log::info!("⏹️ [Audio] done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mono_is_copied_to_every_channel() {
        assert_eq!(spread_channels(&[0.1, 0.2], 2), vec![0.1, 0.1, 0.2, 0.2]);
        assert_eq!(spread_channels(&[0.3], 0), vec![0.3]);
    }

    #[test]
    fn buffers_are_converted_to_the_device_rate() {
        let tone = AudioBuffer::tone(440.0, 8000, 0.5, 0.5);
        let out = prepare_for_device(&tone, 16000, 2).unwrap();
        assert_eq!(out.len(), 8000 * 2);

        let same = prepare_for_device(&tone, 8000, 1).unwrap();
        assert_eq!(same, tone.samples);
    }

    #[test]
    fn watch_finishes_once_everything_played() {
        let watch = PlaybackWatch::new(100, Duration::from_secs(1));
        assert!(!watch.finished().unwrap());
        watch.played.store(100, Ordering::Relaxed);
        assert!(watch.finished().unwrap());
    }

    #[test]
    fn stream_error_ends_the_wait() {
        let watch = PlaybackWatch::new(100, Duration::from_secs(60));
        watch.failed.store(true, Ordering::Relaxed);
        let err = watch.finished().unwrap_err();
        assert!(err.to_string().contains("stream failed"));
    }

    #[test]
    fn stalled_stream_times_out() {
        let mut watch = PlaybackWatch::new(100, Duration::ZERO);
        watch.played.store(40, Ordering::Relaxed);
        watch.deadline = Instant::now();
        let err = watch.finished().unwrap_err();
        assert!(err.to_string().contains("stalled after 40 of 100"));
    }
}
