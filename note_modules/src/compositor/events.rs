// src/compositor/events.rs

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::theory::{self, Note};

/// Length given to the final row, which has no successor to end it.
pub const TRAILING_DURATION_MS: i64 = 500;

/// One row of a timed note sheet.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NoteRow {
    #[serde(alias = "時刻(hh:mm:ss:fff)")]
    pub time: String, // hh:mm:ss.fff or hh:mm:ss:fff
    #[serde(alias = "音階（国際式）")]
    pub note: String, // "C4", "F#", "A"
}

impl NoteRow {
    pub fn new(time: impl Into<String>, note: impl Into<String>) -> Self {
        Self { time: time.into(), note: note.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    pub start_ms: i64,
    pub note: Note,
    pub duration_ms: i64,
}

impl NoteEvent {
    pub fn new(start_ms: i64, note: Note, duration_ms: i64) -> Self {
        Self { start_ms, note, duration_ms }
    }
}

/// A scheduled row. The label may have failed to parse, in which case the
/// compositor skips it.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    pub row: usize,
    pub label: String,
    pub start_ms: i64,
    pub duration_ms: i64,
    pub note: CoreResult<Note>,
}

impl TimelineEntry {
    pub fn event(&self) -> CoreResult<NoteEvent> {
        let note = self.note.clone()?;
        Ok(NoteEvent::new(self.start_ms, note, self.duration_ms))
    }
}

impl From<NoteEvent> for TimelineEntry {
    fn from(e: NoteEvent) -> Self {
        Self {
            row: 0,
            label: e.note.to_string(),
            start_ms: e.start_ms,
            duration_ms: e.duration_ms,
            note: Ok(e.note),
        }
    }
}

/// Milliseconds from `hh:mm:ss.fff` or `hh:mm:ss:fff`.
///
/// Fraction digits are a decimal fraction of a second (`.5` is 500 ms); digits
/// past the millisecond are dropped.
pub fn parse_timestamp(value: &str) -> CoreResult<i64> {
    let invalid = || CoreError::InvalidTimestamp { value: value.to_string() };
    let parts: Vec<&str> = value.trim().split(':').collect();

    let (h, m, s, frac) = match parts.as_slice() {
        [h, m, sec] => match sec.split_once('.') {
            Some((s, f)) => (*h, *m, s, f),
            None => (*h, *m, *sec, ""),
        },
        [h, m, s, f] => (*h, *m, *s, *f),
        _ => return Err(invalid()),
    };

    let number = |field: &str| -> CoreResult<i64> {
        if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        field.parse::<i64>().map_err(|_| invalid())
    };
    let (hours, minutes, seconds) = (number(h)?, number(m)?, number(s)?);

    if !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let millis = frac
        .bytes()
        .chain(std::iter::repeat(b'0'))
        .take(3)
        .fold(0i64, |acc, b| acc * 10 + (b - b'0') as i64);

    Ok(((hours * 60 + minutes) * 60 + seconds) * 1000 + millis)
}

/// Turns rows into timeline entries. Each entry lasts until the next row
/// starts; the last one gets `trailing_ms`. Rows keep their input order.
///
/// A malformed timestamp rejects the whole sheet; a malformed note label only
/// marks its own entry.
pub fn schedule(rows: &[NoteRow], trailing_ms: i64) -> CoreResult<Vec<TimelineEntry>> {
    let starts = rows
        .iter()
        .map(|r| parse_timestamp(&r.time))
        .collect::<CoreResult<Vec<i64>>>()?;

    let entries = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let start_ms = starts[i];
            let end_ms = starts.get(i + 1).copied().unwrap_or(start_ms + trailing_ms);
            TimelineEntry {
                row: i,
                label: row.note.clone(),
                start_ms,
                duration_ms: end_ms - start_ms,
                note: theory::parse(&row.note),
            }
        })
        .collect();
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theory::PitchClass;
    use pretty_assertions::assert_eq;

    #[test]
    fn both_timestamp_separators_parse() {
        assert_eq!(parse_timestamp("00:00:01.500").unwrap(), 1500);
        assert_eq!(parse_timestamp("00:00:01:500").unwrap(), 1500);
        assert_eq!(parse_timestamp("01:02:03.004").unwrap(), 3_723_004);
        assert_eq!(parse_timestamp("00:00:02").unwrap(), 2000);
        assert_eq!(parse_timestamp("00:00:01.5").unwrap(), 1500);
        assert_eq!(parse_timestamp("00:00:00.0019").unwrap(), 1);
    }

    #[test]
    fn malformed_timestamps_are_rejected() {
        for bad in ["", "1.5", "00:01", "aa:00:00.000", "00:00:01.x", "00::01.000", "0:0:0:0:0"] {
            assert_eq!(
                parse_timestamp(bad),
                Err(CoreError::InvalidTimestamp { value: bad.to_string() }),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn durations_run_to_the_next_row() {
        let rows = vec![
            NoteRow::new("00:00:00.000", "C4"),
            NoteRow::new("00:00:00.250", "xx"),
            NoteRow::new("00:00:01:000", "f#"),
        ];
        let entries = schedule(&rows, TRAILING_DURATION_MS).unwrap();

        let spans: Vec<(i64, i64)> = entries.iter().map(|e| (e.start_ms, e.duration_ms)).collect();
        assert_eq!(spans, vec![(0, 250), (250, 750), (1000, 500)]);

        assert_eq!(entries[0].note, Ok(Note::new(PitchClass::C, 4)));
        assert!(entries[1].event().is_err());
        assert_eq!(entries[2].event().unwrap().note, Note::new(PitchClass::FSharp, 4));
    }

    #[test]
    fn unsorted_rows_keep_their_order() {
        let rows = vec![NoteRow::new("00:00:01.000", "A"), NoteRow::new("00:00:00.500", "B")];
        let entries = schedule(&rows, 500).unwrap();
        assert_eq!(entries[0].duration_ms, -500);
        assert_eq!(entries[1].start_ms, 500);
    }

    #[test]
    fn bad_timestamp_fails_the_sheet() {
        let rows = vec![NoteRow::new("00:00:00.000", "C"), NoteRow::new("later", "D")];
        assert!(matches!(schedule(&rows, 500), Err(CoreError::InvalidTimestamp { .. })));
    }

    #[test]
    fn spreadsheet_headers_deserialize() {
        let json = r#"[{"時刻(hh:mm:ss:fff)": "00:00:00:100", "音階（国際式）": "G5"}]"#;
        let rows: Vec<NoteRow> = serde_json::from_str(json).unwrap();
        assert_eq!(rows, vec![NoteRow::new("00:00:00:100", "G5")]);
    }
}
