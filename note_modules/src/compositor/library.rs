// src/compositor/library.rs

use std::collections::BTreeMap;

use crate::buffer::AudioBuffer;
use crate::error::{CoreError, CoreResult};
use crate::shift::resample;
use crate::theory::PitchClass;

/// One mono reference recording per natural letter. Sharps are derived from
/// the natural below them and are never stored.
#[derive(Debug, Clone, Default)]
pub struct ReferenceLibrary {
    recordings: BTreeMap<PitchClass, AudioBuffer>,
}

impl ReferenceLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `buffer` for a natural letter. The first recording per letter
    /// wins; returns `false` when the buffer was not kept.
    pub fn insert(&mut self, class: PitchClass, buffer: AudioBuffer) -> bool {
        if class.is_sharp() || self.recordings.contains_key(&class) {
            return false;
        }
        self.recordings.insert(class, buffer.into_mono());
        true
    }

    pub fn get(&self, class: PitchClass) -> Option<&AudioBuffer> {
        self.recordings.get(&class)
    }

    pub fn len(&self) -> usize {
        self.recordings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recordings.is_empty()
    }

    pub fn letters(&self) -> impl Iterator<Item = PitchClass> + '_ {
        self.recordings.keys().copied()
    }

    pub fn missing_naturals(&self) -> Vec<PitchClass> {
        PitchClass::NATURALS
            .iter()
            .copied()
            .filter(|c| !self.recordings.contains_key(c))
            .collect()
    }

    /// Every letter A to G must be present before composing.
    pub fn require_naturals(&self) -> CoreResult<()> {
        let missing = self.missing_naturals();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CoreError::MissingReferenceNote {
                missing: missing.iter().map(|c| c.name().to_string()).collect(),
            })
        }
    }

    /// Rate shared by the session: the rate of the A recording.
    pub fn session_rate(&self) -> Option<u32> {
        self.get(PitchClass::A)
            .or_else(|| self.recordings.values().next())
            .map(|b| b.sample_rate)
    }

    /// Brings every recording to `rate`.
    pub fn conformed(&self, rate: u32) -> CoreResult<Self> {
        let mut out = Self::new();
        for (&class, buffer) in &self.recordings {
            buffer.ensure_rate()?;
            let conformed = if buffer.sample_rate == rate {
                buffer.clone()
            } else {
                log::warn!(
                    "⚠️ [Library] {} recorded at {} Hz, converting to {} Hz",
                    class,
                    buffer.sample_rate,
                    rate
                );
                let ratio = rate as f64 / buffer.sample_rate as f64;
                AudioBuffer::mono(resample::resample_mono(&buffer.samples, ratio)?, rate)
            };
            out.recordings.insert(class, conformed);
        }
        Ok(out)
    }
}

/// Reads the letter out of a reference file stem such as `C4` or `f#5`:
/// a letter, an optional sharp and exactly one octave digit.
pub fn classify_file_stem(stem: &str) -> Option<PitchClass> {
    let upper = stem.trim().to_uppercase();
    let bytes = upper.as_bytes();
    let (letter_len, digit) = match bytes {
        [_, b'#', d] => (2, *d),
        [_, d] => (1, *d),
        _ => return None,
    };
    if !digit.is_ascii_digit() {
        return None;
    }
    let label = &upper[..letter_len];
    crate::theory::parse(label).ok().map(|n| n.class)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(rate: u32) -> AudioBuffer {
        AudioBuffer::tone(440.0, rate, 0.1, 0.5)
    }

    #[test]
    fn reports_every_missing_letter() {
        let mut lib = ReferenceLibrary::new();
        for c in [PitchClass::A, PitchClass::C, PitchClass::D, PitchClass::F, PitchClass::G] {
            lib.insert(c, tone(8000));
        }
        assert_eq!(
            lib.require_naturals(),
            Err(CoreError::MissingReferenceNote { missing: vec!["B".into(), "E".into()] })
        );
    }

    #[test]
    fn first_recording_wins_and_sharps_are_ignored() {
        let mut lib = ReferenceLibrary::new();
        assert!(lib.insert(PitchClass::C, tone(8000)));
        assert!(!lib.insert(PitchClass::C, tone(16000)));
        assert!(!lib.insert(PitchClass::CSharp, tone(8000)));
        assert_eq!(lib.len(), 1);
        assert_eq!(lib.get(PitchClass::C).map(|b| b.sample_rate), Some(8000));
    }

    #[test]
    fn conforming_resamples_mismatched_rates() {
        let mut lib = ReferenceLibrary::new();
        lib.insert(PitchClass::A, tone(8000));
        lib.insert(PitchClass::B, tone(16000));
        let conformed = lib.conformed(8000).unwrap();
        let b = conformed.get(PitchClass::B).unwrap();
        assert_eq!(b.sample_rate, 8000);
        assert_eq!(b.samples.len(), 800);
    }

    #[test]
    fn file_stems() {
        assert_eq!(classify_file_stem("C4"), Some(PitchClass::C));
        assert_eq!(classify_file_stem("f#5"), Some(PitchClass::FSharp));
        assert_eq!(classify_file_stem("A"), None);
        assert_eq!(classify_file_stem("C45"), None);
        assert_eq!(classify_file_stem("H4"), None);
        assert_eq!(classify_file_stem("whistle"), None);
    }
}
