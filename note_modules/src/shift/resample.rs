// src/shift/resample.rs

use rubato::{
    calculate_cutoff, Resampler, SincFixedIn, SincInterpolationParameters,
    SincInterpolationType, WindowFunction,
};

use crate::error::CoreResult;

/// `None` when `ratio` (output rate / input rate) needs no conversion.
pub fn build_resampler(ratio: f64, channels: usize) -> CoreResult<Option<SincFixedIn<f32>>> {
    if (ratio - 1.0).abs() < 1e-12 {
        return Ok(None);
    }
    let sinc_len = 256usize;
    let window = WindowFunction::BlackmanHarris2;
    let f_cutoff = calculate_cutoff(sinc_len, window);
    let params = SincInterpolationParameters {
        sinc_len,
        f_cutoff,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 128,
        window,
    };
    let chunk_size = 1024;
    let r = SincFixedIn::<f32>::new(ratio, 2.0, params, chunk_size, channels)?;
    Ok(Some(r))
}

/// Resamples a whole mono signal in one go.
///
/// The result holds exactly `round(len * ratio)` samples with the filter
/// delay removed.
pub fn resample_mono(samples: &[f32], ratio: f64) -> CoreResult<Vec<f32>> {
    let Some(mut resampler) = build_resampler(ratio, 1)? else {
        return Ok(samples.to_vec());
    };
    let expected = (samples.len() as f64 * ratio).round() as usize;
    let delay = resampler.output_delay();
    let mut out = Vec::with_capacity(expected + delay + 1024);

    let mut pos = 0usize;
    while samples.len() - pos >= resampler.input_frames_next() {
        let need = resampler.input_frames_next();
        let block: [&[f32]; 1] = [&samples[pos..pos + need]];
        let resampled = resampler.process(&block[..], None)?;
        out.extend_from_slice(&resampled[0]);
        pos += need;
    }

    if pos < samples.len() {
        let tail: [&[f32]; 1] = [&samples[pos..]];
        let resampled = resampler.process_partial(Some(&tail[..]), None)?;
        out.extend_from_slice(&resampled[0]);
    }

    // flush whatever is still inside the filter
    while out.len() < expected + delay {
        let resampled = resampler.process_partial::<Vec<f32>>(None, None)?;
        if resampled[0].is_empty() {
            break;
        }
        out.extend_from_slice(&resampled[0]);
    }

    out.drain(..delay.min(out.len()));
    out.resize(expected, 0.0);
    Ok(out)
}
