// src/theory/mod.rs
pub mod note;
pub mod scale;

pub use note::{
    A4_HZ, DEFAULT_OCTAVE, Note, PitchClass, cents_to_semitones, frequency_to_note, parse,
    ratio_to_cents, semitone_distance, semitones_to_ratio,
};
pub use scale::{SCALE_DEGREES, ScaleDegree, TONIC_HZ, nearest_degree};
