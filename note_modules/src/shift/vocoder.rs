// src/shift/vocoder.rs
//
// Phase-vocoder time stretching: STFT, phase-coherent resynthesis at a new
// frame rate, then overlap-add.

use rustfft::{FftPlanner, num_complex::Complex, num_traits::Zero};
use std::f32::consts::PI;

pub const N_FFT: usize = 2048;
pub const HOP: usize = N_FFT / 4;

/// Periodic Hann window.
pub fn hann_window(n: usize) -> Vec<f32> {
    (0..n).map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / n as f32).cos())).collect()
}

/// Centered STFT: the signal is padded with `n_fft / 2` zeros on each side and
/// only the non-negative bins (`n_fft / 2 + 1`) of each frame are kept.
pub fn stft(
    signal: &[f32],
    n_fft: usize,
    hop: usize,
    window: &[f32],
    planner: &mut FftPlanner<f32>,
) -> Vec<Vec<Complex<f32>>> {
    let pad = n_fft / 2;
    let mut padded = vec![0.0f32; signal.len() + 2 * pad];
    padded[pad..pad + signal.len()].copy_from_slice(signal);

    let fft = planner.plan_fft_forward(n_fft);
    let half = n_fft / 2 + 1;
    let mut frames = Vec::new();
    let mut buf = vec![Complex::zero(); n_fft];
    let mut pos = 0usize;
    while pos + n_fft <= padded.len() {
        for k in 0..n_fft {
            buf[k] = Complex { re: padded[pos + k] * window[k], im: 0.0 };
        }
        fft.process(&mut buf);
        frames.push(buf[..half].to_vec());
        pos += hop;
    }
    frames
}

/// Inverse of [`stft`]; returns exactly `length` samples.
pub fn istft(
    frames: &[Vec<Complex<f32>>],
    n_fft: usize,
    hop: usize,
    window: &[f32],
    length: usize,
    planner: &mut FftPlanner<f32>,
) -> Vec<f32> {
    if frames.is_empty() {
        return vec![0.0; length];
    }
    let ifft = planner.plan_fft_inverse(n_fft);
    let total = n_fft + hop * (frames.len() - 1);
    let mut out = vec![0.0f32; total];
    let mut win_sum = vec![0.0f32; total];
    let mut buf = vec![Complex::zero(); n_fft];
    let scale = 1.0 / n_fft as f32;

    for (f, half) in frames.iter().enumerate() {
        // rebuild the full Hermitian spectrum
        buf[..half.len()].copy_from_slice(half);
        for k in 1..n_fft - half.len() + 1 {
            buf[n_fft - k] = half[k].conj();
        }
        ifft.process(&mut buf);

        let offset = f * hop;
        for k in 0..n_fft {
            out[offset + k] += buf[k].re * scale * window[k];
            win_sum[offset + k] += window[k] * window[k];
        }
    }

    for (s, w) in out.iter_mut().zip(&win_sum) {
        if *w > 1e-6 {
            *s /= *w;
        }
    }

    let pad = n_fft / 2;
    let mut trimmed: Vec<f32> = out.into_iter().skip(pad).take(length).collect();
    trimmed.resize(length, 0.0);
    trimmed
}

/// Resynthesizes `frames` at `rate` times the analysis frame rate.
pub fn phase_vocoder(frames: &[Vec<Complex<f32>>], rate: f32, hop: usize) -> Vec<Vec<Complex<f32>>> {
    if frames.is_empty() {
        return Vec::new();
    }
    let bins = frames[0].len();
    let n_fft = (bins - 1) * 2;
    let phi_advance: Vec<f32> =
        (0..bins).map(|k| 2.0 * PI * hop as f32 * k as f32 / n_fft as f32).collect();
    let mut phase_acc: Vec<f32> = frames[0].iter().map(|c| c.arg()).collect();

    let zero_frame = vec![Complex::zero(); bins];
    let column = |i: usize| frames.get(i).unwrap_or(&zero_frame);

    let steps = (frames.len() as f32 / rate).ceil() as usize;
    let mut out = Vec::with_capacity(steps);
    for t in 0..steps {
        let step = t as f32 * rate;
        if step >= frames.len() as f32 {
            break;
        }
        let idx = step.floor() as usize;
        let alpha = step - idx as f32;
        let (c0, c1) = (column(idx), column(idx + 1));

        let mut frame = Vec::with_capacity(bins);
        for k in 0..bins {
            let mag = (1.0 - alpha) * c0[k].norm() + alpha * c1[k].norm();
            frame.push(Complex::from_polar(mag, phase_acc[k]));

            let mut dphase = c1[k].arg() - c0[k].arg() - phi_advance[k];
            dphase -= 2.0 * PI * (dphase / (2.0 * PI)).round();
            phase_acc[k] += phi_advance[k] + dphase;
        }
        out.push(frame);
    }
    out
}

/// Changes duration by `1 / rate` without moving pitch.
pub fn time_stretch(signal: &[f32], rate: f32) -> Vec<f32> {
    let length = (signal.len() as f32 / rate).round() as usize;
    if signal.is_empty() || length == 0 {
        return vec![0.0; length];
    }
    let window = hann_window(N_FFT);
    let mut planner = FftPlanner::<f32>::new();
    let frames = stft(signal, N_FFT, HOP, &window, &mut planner);
    let stretched = phase_vocoder(&frames, rate, HOP);
    istft(&stretched, N_FFT, HOP, &window, length, &mut planner)
}
