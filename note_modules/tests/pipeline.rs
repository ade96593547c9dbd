// tests/pipeline.rs

use note_modules::analyzer::dominant_frequency;
use note_modules::compositor::{Compositor, NoteRow, schedule};
use note_modules::config::ScaleConfig;
use note_modules::io;
use note_modules::scale::{COMPLETE_SCALE_FILE, SCALE_INFO_FILE, ScaleGenerator};
use note_modules::theory::{Note, PitchClass};
use note_modules::{AudioBuffer, CoreError};

const RATE: u32 = 8000;

fn write_reference_folder(dir: &std::path::Path, skip: Option<PitchClass>) {
    for class in PitchClass::NATURALS {
        if Some(class) == skip {
            continue;
        }
        let freq = Note::new(class, 4).frequency(440.0);
        let tone = AudioBuffer::tone(freq, RATE, 0.4, 0.5);
        io::write_wav(dir.join(format!("{class}4.wav")), &tone).unwrap();
    }
}

#[test]
fn wav_written_then_decoded_keeps_pitch_and_length() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a4.wav");
    let tone = AudioBuffer::tone(440.0, RATE, 0.5, 0.5);
    io::write_wav(&path, &tone).unwrap();

    let decoded = io::decode_file(&path).unwrap();
    assert_eq!(decoded.sample_rate, RATE);
    assert_eq!(decoded.channels, 1);
    assert_eq!(decoded.samples.len(), tone.samples.len());
    let f = dominant_frequency(&decoded).unwrap();
    assert!((f - 440.0).abs() < 2.0, "got {f}");
}

#[test]
fn sheet_to_wav_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let refs = dir.path().join("refs");
    std::fs::create_dir(&refs).unwrap();
    write_reference_folder(&refs, None);

    let sheet = dir.path().join("sheet.json");
    let rows = vec![
        NoteRow::new("00:00:00.000", "C4"),
        NoteRow::new("00:00:00.250", "E4"),
        NoteRow::new("00:00:00.500", "G#4"),
        NoteRow::new("00:00:00.750", "C5"),
    ];
    io::save_json(&sheet, &rows).unwrap();

    let library = io::load_library_dir(&refs).unwrap();
    let entries = schedule(&io::load_note_rows(&sheet).unwrap(), 500).unwrap();
    let comp = Compositor::default().render(&library, &entries).unwrap();
    assert_eq!(comp.rendered, 4);
    assert!(comp.skipped.is_empty());
    // last row starts at 750 ms and lasts the trailing 500 ms
    assert_eq!(comp.buffer.samples.len(), 10_000);

    let out = dir.path().join("mix.wav");
    io::write_wav(&out, &comp.buffer).unwrap();
    assert_eq!(io::decode_file(&out).unwrap().samples.len(), 10_000);
}

#[test]
fn incomplete_reference_folder_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_reference_folder(dir.path(), Some(PitchClass::B));
    let library = io::load_library_dir(dir.path()).unwrap();
    let entries = schedule(&[NoteRow::new("00:00:00.000", "C4")], 500).unwrap();
    let err = Compositor::default().render(&library, &entries).unwrap_err();
    assert_eq!(err, CoreError::MissingReferenceNote { missing: vec!["B".into()] });
}

#[test]
fn scale_is_persisted_with_note_named_files() {
    let dir = tempfile::tempdir().unwrap();
    let source = AudioBuffer::tone(261.63, RATE, 1.5, 0.5);
    let config = ScaleConfig { note_secs: 2.0, fade_secs: 0.1, ..Default::default() };
    let output = ScaleGenerator::new(config).generate(&source).unwrap();
    let written = output.persist(dir.path().join("scale")).unwrap();

    assert_eq!(written.len(), 10);
    let names: Vec<String> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(&names[..2], &["C4.wav".to_string(), "D4.wav".to_string()]);
    assert!(names.contains(&COMPLETE_SCALE_FILE.to_string()));
    assert!(names.contains(&SCALE_INFO_FILE.to_string()));

    let info: serde_json::Value = io::load_json(dir.path().join("scale").join(SCALE_INFO_FILE)).unwrap();
    let info = info.as_array().unwrap();
    assert_eq!(info.len(), 8);
    assert_eq!(info[7]["note"], "C5");
    assert_eq!(info[1]["time_secs"], 2.5);

    let complete = io::decode_file(dir.path().join("scale").join(COMPLETE_SCALE_FILE)).unwrap();
    assert_eq!(complete.samples.len(), 8 * (2 * RATE as usize + RATE as usize / 2));
}
