// src/compositor/mod.rs
pub mod events;
pub mod library;

pub use events::{NoteEvent, NoteRow, TimelineEntry, parse_timestamp, schedule};
pub use library::{ReferenceLibrary, classify_file_stem};

use std::fmt;

use crate::buffer::{self, AudioBuffer};
use crate::config::CompositionConfig;
use crate::error::{CoreError, CoreResult};
use crate::shift::PitchShift;
use crate::theory::{Note, PitchClass, semitone_distance};

/// Why an entry did not make it into the mix.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    InvalidNote(CoreError),
    NonPositiveDuration(i64),
    MissingReference(PitchClass),
    Shift(CoreError),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InvalidNote(e) => write!(f, "{e}"),
            SkipReason::NonPositiveDuration(ms) => write!(f, "non-positive duration {ms} ms"),
            SkipReason::MissingReference(c) => write!(f, "no reference recording for {c}"),
            SkipReason::Shift(e) => write!(f, "pitch shift failed: {e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedEvent {
    pub row: usize,
    pub label: String,
    pub reason: SkipReason,
}

/// The mixed timeline plus what had to be left out.
#[derive(Debug, Clone)]
pub struct Composition {
    pub buffer: AudioBuffer,
    pub rendered: usize,
    pub skipped: Vec<SkippedEvent>,
}

/// Renders note timelines from a library of reference recordings.
pub struct Compositor {
    config: CompositionConfig,
}

impl Compositor {
    pub fn new(config: CompositionConfig) -> Self {
        Self { config }
    }

    /// Semitones to move the natural's recording (nominally at octave 4) to
    /// `target`. Sharps carry one semitone on top of the distance from the
    /// natural.
    pub fn shift_for(target: Note) -> f64 {
        let natural = target.class.natural();
        let mut semitones = semitone_distance(Note::new(natural, 4), target);
        if target.class.is_sharp() {
            semitones += 1;
        }
        semitones as f64
    }

    /// Mixes `entries` in the given order.
    ///
    /// Fails up front when the library lacks any of A to G. After that, a
    /// failing entry is logged and skipped; the rest still render.
    pub fn render(
        &self,
        library: &ReferenceLibrary,
        entries: &[TimelineEntry],
    ) -> CoreResult<Composition> {
        library.require_naturals()?;
        let rate = library.session_rate().ok_or(CoreError::EmptyBuffer)?;
        let library = library.conformed(rate)?;

        log::info!("🎼 [Compositor] rendering {} events at {} Hz", entries.len(), rate);

        let mut master: Vec<f32> = Vec::new();
        let mut rendered = 0usize;
        let mut skipped = Vec::new();

        for entry in entries {
            match self.render_entry(&library, entry) {
                Ok(fitted) => {
                    let start = buffer::ms_to_frames(entry.start_ms, rate);
                    if start > master.len() {
                        log::debug!(
                            "🔇 [Compositor] silence {} frames before row {}",
                            start - master.len(),
                            entry.row
                        );
                        master.resize(start, 0.0);
                    }
                    buffer::overlay(&mut master, &fitted, start);
                    rendered += 1;
                }
                Err(reason) => {
                    log::warn!("⚠️ [Compositor] row {} ({:?}) skipped: {}", entry.row, entry.label, reason);
                    skipped.push(SkippedEvent {
                        row: entry.row,
                        label: entry.label.clone(),
                        reason,
                    });
                }
            }
        }

        buffer::normalize_peak(&mut master, buffer::headroom_to_ceiling(self.config.headroom_db));
        let buffer = AudioBuffer::mono(master, rate);
        log::info!(
            "✅ [Compositor] {} rendered, {} skipped, {:.2} s total",
            rendered,
            skipped.len(),
            buffer.duration_ms() / 1000.0
        );
        Ok(Composition { buffer, rendered, skipped })
    }

    fn render_entry(
        &self,
        library: &ReferenceLibrary,
        entry: &TimelineEntry,
    ) -> Result<Vec<f32>, SkipReason> {
        let target = entry.note.clone().map_err(SkipReason::InvalidNote)?;
        let natural = target.class.natural();
        let reference = library.get(natural).ok_or(SkipReason::MissingReference(natural))?;

        if entry.duration_ms <= 0 {
            return Err(SkipReason::NonPositiveDuration(entry.duration_ms));
        }

        let semitones = Self::shift_for(target);
        let pitched = PitchShift::Resample
            .apply(reference, semitones)
            .map_err(SkipReason::Shift)?;

        let frames = buffer::ms_to_frames(entry.duration_ms, pitched.sample_rate);
        log::debug!(
            "🎵 [Compositor] row {}: {} {:+} st, {} ms",
            entry.row,
            target,
            semitones,
            entry.duration_ms
        );
        Ok(buffer::fit_to_length(pitched.samples, frames))
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(CompositionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theory::parse;

    const RATE: u32 = 8000;

    fn full_library() -> ReferenceLibrary {
        let mut lib = ReferenceLibrary::new();
        for class in PitchClass::NATURALS {
            let freq = Note::new(class, 4).frequency(440.0);
            lib.insert(class, AudioBuffer::tone(freq, RATE, 0.3, 0.5));
        }
        lib
    }

    fn event(start_ms: i64, label: &str, duration_ms: i64) -> TimelineEntry {
        NoteEvent::new(start_ms, parse(label).unwrap(), duration_ms).into()
    }

    #[test]
    fn missing_natural_aborts_before_rendering() {
        let mut lib = ReferenceLibrary::new();
        for class in PitchClass::NATURALS.iter().filter(|&&c| c != PitchClass::E) {
            lib.insert(*class, AudioBuffer::tone(300.0, RATE, 0.1, 0.5));
        }
        let err = Compositor::default().render(&lib, &[event(0, "C4", 100)]).unwrap_err();
        assert_eq!(err, CoreError::MissingReferenceNote { missing: vec!["E".into()] });
    }

    #[test]
    fn gaps_between_events_are_silent() {
        let entries = [event(0, "A4", 400), event(500, "C4", 400)];
        let comp = Compositor::default().render(&full_library(), &entries).unwrap();
        let samples = &comp.buffer.samples;

        assert!(comp.buffer.duration_ms() >= 900.0);
        let gap = &samples[ms_frames(400)..ms_frames(500)];
        assert!(gap.iter().all(|&s| s == 0.0));
        assert!(samples[..ms_frames(400)].iter().any(|&s| s != 0.0));
        assert!(samples[ms_frames(500)..].iter().any(|&s| s != 0.0));
        assert_eq!(comp.rendered, 2);
    }

    fn ms_frames(ms: i64) -> usize {
        buffer::ms_to_frames(ms, RATE)
    }

    #[test]
    fn short_recordings_are_tiled_to_the_event() {
        // reference is 300 ms, the event lasts a full second
        let comp = Compositor::default()
            .render(&full_library(), &[event(0, "A4", 1000)])
            .unwrap();
        assert_eq!(comp.buffer.samples.len(), ms_frames(1000));
        let tail = &comp.buffer.samples[ms_frames(900)..];
        assert!(tail.iter().any(|&s| s.abs() > 0.1));
    }

    #[test]
    fn overlapping_events_are_summed() {
        let lib = full_library();
        let single = Compositor::new(CompositionConfig { headroom_db: 0.0, ..Default::default() })
            .render(&lib, &[event(0, "A4", 200)])
            .unwrap();
        assert!((single.buffer.peak() - 1.0).abs() < 1e-5);

        // the same note twice on top of itself: identical shape after normalization
        let doubled = Compositor::new(CompositionConfig { headroom_db: 0.0, ..Default::default() })
            .render(&lib, &[event(0, "A4", 200), event(0, "A4", 200)])
            .unwrap();
        assert_eq!(doubled.buffer.samples.len(), single.buffer.samples.len());
        for (a, b) in doubled.buffer.samples.iter().zip(&single.buffer.samples) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn bad_entries_are_skipped_and_the_rest_render() {
        let rows = vec![
            NoteRow::new("00:00:00.000", "C4"),
            NoteRow::new("00:00:00.100", "Q9"),
            NoteRow::new("00:00:00.200", "D4"),
            NoteRow::new("00:00:00.200", "E4"),
        ];
        let entries = schedule(&rows, 300).unwrap();
        let comp = Compositor::default().render(&full_library(), &entries).unwrap();

        assert_eq!(comp.rendered, 2);
        let skipped: Vec<(usize, bool)> = comp
            .skipped
            .iter()
            .map(|s| (s.row, matches!(s.reason, SkipReason::NonPositiveDuration(0))))
            .collect();
        assert_eq!(skipped, vec![(1, false), (2, true)]);
        assert!(matches!(comp.skipped[0].reason, SkipReason::InvalidNote(_)));
        assert_eq!(comp.buffer.samples.len(), ms_frames(500));
    }

    #[test]
    fn sharps_add_a_semitone_over_their_natural() {
        assert_eq!(Compositor::shift_for(parse("A4").unwrap()), 0.0);
        assert_eq!(Compositor::shift_for(parse("C5").unwrap()), 12.0);
        assert_eq!(Compositor::shift_for(parse("F#4").unwrap()), 2.0);
        assert_eq!(Compositor::shift_for(parse("G3").unwrap()), -12.0);
    }

    #[test]
    fn master_is_peak_normalized_below_full_scale() {
        let comp = Compositor::default()
            .render(&full_library(), &[event(0, "E4", 300)])
            .unwrap();
        let ceiling = buffer::headroom_to_ceiling(0.1);
        assert!((comp.buffer.peak() - ceiling).abs() < 1e-5);
        assert!(comp.buffer.peak() < 1.0);
    }

    #[test]
    fn nothing_rendered_still_yields_a_buffer() {
        let comp = Compositor::default().render(&full_library(), &[]).unwrap();
        assert!(comp.buffer.is_empty());
        assert_eq!(comp.buffer.sample_rate, RATE);
    }
}
