// src/theory/note.rs

use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};

/// Concert pitch used when no other reference is given.
pub const A4_HZ: f32 = 440.0;

/// Octave assumed for labels such as `"C"` or `"F#"`.
pub const DEFAULT_OCTAVE: i32 = 4;

/// The twelve semitone classes, in ascending order from C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PitchClass {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl PitchClass {
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    /// The seven natural letters a reference library must cover.
    pub const NATURALS: [PitchClass; 7] = [
        PitchClass::A,
        PitchClass::B,
        PitchClass::C,
        PitchClass::D,
        PitchClass::E,
        PitchClass::F,
        PitchClass::G,
    ];

    /// Position counted from C (C = 0 .. B = 11).
    pub fn index_from_c(self) -> i32 {
        self as i32
    }

    /// Semitone offset relative to A (A = 0).
    pub fn offset(self) -> i32 {
        self.index_from_c() - 9
    }

    pub fn from_index_from_c(index: i32) -> Self {
        Self::ALL[index.rem_euclid(12) as usize]
    }

    pub fn is_sharp(self) -> bool {
        matches!(
            self,
            PitchClass::CSharp
                | PitchClass::DSharp
                | PitchClass::FSharp
                | PitchClass::GSharp
                | PitchClass::ASharp
        )
    }

    /// The natural letter this class is spelled from (`F#` -> `F`).
    pub fn natural(self) -> Self {
        if self.is_sharp() {
            Self::from_index_from_c(self.index_from_c() - 1)
        } else {
            self
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::CSharp => "C#",
            PitchClass::D => "D",
            PitchClass::DSharp => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::FSharp => "F#",
            PitchClass::G => "G",
            PitchClass::GSharp => "G#",
            PitchClass::A => "A",
            PitchClass::ASharp => "A#",
            PitchClass::B => "B",
        }
    }

    /// Fixed-do solfège spelling.
    pub fn solfege(self) -> &'static str {
        match self {
            PitchClass::C => "ド",
            PitchClass::CSharp => "ド#",
            PitchClass::D => "レ",
            PitchClass::DSharp => "レ#",
            PitchClass::E => "ミ",
            PitchClass::F => "ファ",
            PitchClass::FSharp => "ファ#",
            PitchClass::G => "ソ",
            PitchClass::GSharp => "ソ#",
            PitchClass::A => "ラ",
            PitchClass::ASharp => "ラ#",
            PitchClass::B => "シ",
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'C' => Some(PitchClass::C),
            'D' => Some(PitchClass::D),
            'E' => Some(PitchClass::E),
            'F' => Some(PitchClass::F),
            'G' => Some(PitchClass::G),
            'A' => Some(PitchClass::A),
            'B' => Some(PitchClass::B),
            _ => None,
        }
    }

    /// Raises a natural by one semitone. E and B have no sharp spelling.
    fn sharpened(self) -> Option<Self> {
        match self {
            PitchClass::E | PitchClass::B => None,
            c if c.is_sharp() => None,
            c => Some(Self::from_index_from_c(c.index_from_c() + 1)),
        }
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A pitch class placed in a concrete octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Note {
    pub class: PitchClass,
    pub octave: i32,
}

impl Note {
    pub const A4: Note = Note { class: PitchClass::A, octave: 4 };

    pub fn new(class: PitchClass, octave: i32) -> Self {
        Self { class, octave }
    }

    /// `offset + 12 * octave`; A4 sits at 48.
    pub fn absolute_index(&self) -> i32 {
        self.class.offset() + 12 * self.octave
    }

    pub fn from_absolute_index(index: i32) -> Self {
        // shift so that C of each octave lands on a multiple of 12
        let from_c = index + 9;
        Self {
            class: PitchClass::from_index_from_c(from_c.rem_euclid(12)),
            octave: from_c.div_euclid(12),
        }
    }

    pub fn transposed(&self, semitones: i32) -> Self {
        Self::from_absolute_index(self.absolute_index() + semitones)
    }

    /// Equal-tempered frequency relative to `reference` Hz at A4.
    pub fn frequency(&self, reference: f32) -> f32 {
        let steps = self.absolute_index() - Note::A4.absolute_index();
        reference * 2.0_f32.powf(steps as f32 / 12.0)
    }

    /// International spelling, e.g. `C#4`.
    pub fn international(&self) -> String {
        self.to_string()
    }

    /// Solfège spelling, e.g. `ド#4`.
    pub fn solfege(&self) -> String {
        format!("{}{}", self.class.solfege(), self.octave)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.class.name(), self.octave)
    }
}

impl FromStr for Note {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Parses labels like `"A"`, `"f#"`, `"C4"` or `"G#-1"`.
pub fn parse(label: &str) -> CoreResult<Note> {
    let invalid = || CoreError::InvalidNoteFormat { label: label.to_string() };
    let normalized = label.trim().to_uppercase();

    let mut chars = normalized.chars();
    let natural = chars
        .next()
        .and_then(PitchClass::from_letter)
        .ok_or_else(invalid)?;

    let rest = chars.as_str();
    let (class, octave_str) = match rest.strip_prefix('#') {
        Some(tail) => (natural.sharpened().ok_or_else(invalid)?, tail),
        None => (natural, rest),
    };

    let octave = if octave_str.is_empty() {
        DEFAULT_OCTAVE
    } else {
        octave_str.parse::<i32>().map_err(|_| invalid())?
    };

    Ok(Note { class, octave })
}

/// Signed semitone count from `a` to `b`; positive when `b` is higher.
pub fn semitone_distance(a: Note, b: Note) -> i32 {
    b.absolute_index() - a.absolute_index()
}

/// Nearest equal-tempered note and the deviation from it in cents.
pub fn frequency_to_note(freq: f32, reference: f32) -> CoreResult<(Note, f32)> {
    if !(freq > 0.0) || !freq.is_finite() {
        return Err(CoreError::SilentInput);
    }
    let steps = (12.0 * (freq / reference).log2()).round() as i32;
    let note = Note::A4.transposed(steps);
    let cents = ratio_to_cents(freq / note.frequency(reference));
    Ok((note, cents))
}

pub fn ratio_to_cents(ratio: f32) -> f32 {
    1200.0 * ratio.log2()
}

pub fn semitones_to_ratio(semitones: f64) -> f64 {
    2.0_f64.powf(semitones / 12.0)
}

pub fn cents_to_semitones(cents: f64) -> f64 {
    cents / 100.0
}
