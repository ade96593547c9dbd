// src/io/report.rs

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::compositor::NoteRow;

pub fn save_json<T: Serialize + ?Sized>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, value)?;
    log::info!("💾 [Report] wrote {}", path.display());
    Ok(())
}

pub fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader = BufReader::new(file);
    let value = serde_json::from_reader(reader).with_context(|| format!("parsing {}", path.display()))?;
    Ok(value)
}

/// Timed note sheet: a JSON array of `{"time", "note"}` rows.
pub fn load_note_rows(path: impl AsRef<Path>) -> Result<Vec<NoteRow>> {
    let rows: Vec<NoteRow> = load_json(path)?;
    log::info!("📄 [Report] {} note rows", rows.len());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::AnalysisRow;
    use pretty_assertions::assert_eq;

    #[test]
    fn note_rows_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.json");
        let rows = vec![NoteRow::new("00:00:00.000", "C4"), NoteRow::new("00:00:00.500", "F#")];
        save_json(&path, &rows).unwrap();
        assert_eq!(load_note_rows(&path).unwrap(), rows);
    }

    #[test]
    fn analysis_rows_serialize_empty_pitch_as_null() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let rows = vec![AnalysisRow {
            time: "00:00:00:025".into(),
            frequency_hz: None,
            amplitude: 0.0,
            note: None,
            solfege: None,
        }];
        save_json(&path, &rows).unwrap();
        let back: serde_json::Value = load_json(&path).unwrap();
        assert_eq!(back[0]["time"], "00:00:00:025");
        assert!(back[0]["note"].is_null());
    }

    #[test]
    fn malformed_sheet_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"[{"time": "00:00:00.000"}]"#).unwrap();
        assert!(load_note_rows(&path).is_err());
    }
}
