// src/theory/scale.rs

use super::note::PitchClass;

/// C4, the tonic every degree ratio is measured against.
pub const TONIC_HZ: f32 = 261.63;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleDegree {
    /// Solfège syllable, e.g. `ソ`.
    pub name: &'static str,
    /// Sustained spelling used in reports, e.g. `ソー`.
    pub sustained: &'static str,
    pub letter: PitchClass,
    /// Just-intonation ratio to the tonic.
    pub ratio: f32,
}

const fn degree(
    name: &'static str,
    sustained: &'static str,
    letter: PitchClass,
    ratio: f32,
) -> ScaleDegree {
    ScaleDegree { name, sustained, letter, ratio }
}

/// Tonic to octave in just intonation.
pub static SCALE_DEGREES: [ScaleDegree; 8] = [
    degree("ド", "ドー", PitchClass::C, 1.0),
    degree("レ", "レー", PitchClass::D, 9.0 / 8.0),
    degree("ミ", "ミー", PitchClass::E, 5.0 / 4.0),
    degree("ファ", "ファー", PitchClass::F, 4.0 / 3.0),
    degree("ソ", "ソー", PitchClass::G, 3.0 / 2.0),
    degree("ラ", "ラー", PitchClass::A, 5.0 / 3.0),
    degree("シ", "シー", PitchClass::B, 15.0 / 8.0),
    degree("ド", "ドー", PitchClass::C, 2.0),
];

/// Classifies `freq` to the closest degree after folding it into the tonic's
/// octave. The fold truncates toward zero, so anything between C3 and C5 is
/// compared unfolded.
pub fn nearest_degree(freq: f32) -> &'static ScaleDegree {
    let octave = (freq / TONIC_HZ).log2().trunc();
    let normalized = if octave.is_finite() { freq / 2.0_f32.powf(octave) } else { freq };

    let mut best = &SCALE_DEGREES[0];
    let mut best_diff = f32::INFINITY;
    for d in &SCALE_DEGREES {
        let diff = (normalized - TONIC_HZ * d.ratio).abs();
        if diff < best_diff {
            best_diff = diff;
            best = d;
        }
    }
    best
}
