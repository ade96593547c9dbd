// src/main.rs

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use note_modules::analyzer::{self, FrequencyFrame};
use note_modules::compositor::{Compositor, schedule};
use note_modules::config::Settings;
use note_modules::scale::ScaleGenerator;
use note_modules::shift::PitchShift;
use note_modules::theory::{self, Note};
use note_modules::{audio, io};

#[derive(Parser)]
#[command(name = "notesynth", about = "Note-driven audio analysis and synthesis")]
#[command(version)]
struct Cli {
    /// JSON settings file; missing fields keep their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Detect the dominant pitch, optionally writing a per-window report
    Analyze {
        input: PathBuf,

        /// Write the windowed analysis as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Move a recording to another pitch
    Shift {
        input: PathBuf,

        #[arg(long)]
        out: PathBuf,

        /// Semitones (fractional allowed)
        #[arg(long, allow_hyphen_values = true, conflicts_with = "to")]
        semitones: Option<f64>,

        /// Target note; the shift is measured from the detected pitch
        #[arg(long)]
        to: Option<Note>,

        #[arg(long, value_enum, default_value_t = Method::Spectral)]
        method: Method,
    },

    /// Render a timed note sheet from a folder of reference recordings
    Compose {
        /// JSON array of {"time", "note"} rows
        sheet: PathBuf,

        /// Folder holding A4.wav, B4.wav ... G4.wav
        #[arg(long)]
        library: PathBuf,

        #[arg(long)]
        out: PathBuf,

        #[arg(long)]
        play: bool,
    },

    /// Build an eight-degree scale from one recording
    Scale {
        input: PathBuf,

        #[arg(long)]
        out_dir: PathBuf,

        #[arg(long)]
        play: bool,
    },

    /// Play an audio file on the default output device
    Play { input: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum Method {
    Resample,
    Spectral,
}

impl From<Method> for PitchShift {
    fn from(m: Method) -> Self {
        match m {
            Method::Resample => PitchShift::Resample,
            Method::Spectral => PitchShift::Spectral,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    match cli.command {
        Command::Analyze { input, report } => analyze(&settings, input, report),
        Command::Shift { input, out, semitones, to, method } => {
            shift(&settings, input, out, semitones, to, method.into())
        }
        Command::Compose { sheet, library, out, play } => {
            compose(&settings, sheet, library, out, play)
        }
        Command::Scale { input, out_dir, play } => scale(&settings, input, out_dir, play),
        Command::Play { input } => audio::play_buffer(&io::decode_file(&input)?),
    }
}

fn analyze(settings: &Settings, input: PathBuf, report: Option<PathBuf>) -> Result<()> {
    let cfg = &settings.analysis;
    let buffer = io::decode_file(&input)?;

    let freq = analyzer::dominant_frequency(&buffer)?;
    let (note, cents) = theory::frequency_to_note(freq, cfg.reference_hz)?;
    let degree = theory::nearest_degree(freq);
    println!(
        "{}: {:.1} Hz, {} ({}) {:+.1} cents, scale degree {}",
        input.display(),
        freq,
        note,
        note.solfege(),
        cents,
        degree.sustained
    );

    if let Some(path) = report {
        let frames = analyzer::analyze_windowed(&buffer, cfg.window_ms, cfg.hop_ms)?
            .with_reference(cfg.reference_hz);
        let rows: Vec<_> = frames.map(|f: FrequencyFrame| f.to_row()).collect();
        io::save_json(&path, &rows)?;
        println!("{} frames -> {}", rows.len(), path.display());
    }
    Ok(())
}

fn shift(
    settings: &Settings,
    input: PathBuf,
    out: PathBuf,
    semitones: Option<f64>,
    to: Option<Note>,
    method: PitchShift,
) -> Result<()> {
    let buffer = io::decode_file(&input)?;
    let semitones = match (semitones, to) {
        (Some(s), _) => s,
        (None, Some(target)) => {
            let freq = analyzer::dominant_frequency(&buffer)?;
            let reference = settings.analysis.reference_hz;
            let ratio = target.frequency(reference) / freq;
            theory::cents_to_semitones(theory::ratio_to_cents(ratio) as f64)
        }
        (None, None) => bail!("pass --semitones or --to"),
    };

    let shifted = method.apply(&buffer, semitones)?;
    io::write_wav(&out, &shifted)?;
    println!("{:+.2} semitones -> {}", semitones, out.display());
    Ok(())
}

fn compose(settings: &Settings, sheet: PathBuf, library: PathBuf, out: PathBuf, play: bool) -> Result<()> {
    let cfg = &settings.composition;
    let library = io::load_library_dir(&library)?;
    let rows = io::load_note_rows(&sheet)?;
    let entries = schedule(&rows, cfg.trailing_duration_ms)?;

    let composition = Compositor::new(cfg.clone()).render(&library, &entries)?;
    for skipped in &composition.skipped {
        eprintln!("skipped row {} ({:?}): {}", skipped.row, skipped.label, skipped.reason);
    }
    io::write_wav(&out, &composition.buffer)
        .with_context(|| format!("writing {}", out.display()))?;
    println!(
        "{} events, {:.2} s -> {}",
        composition.rendered,
        composition.buffer.duration_ms() / 1000.0,
        out.display()
    );

    if play {
        audio::play_buffer(&composition.buffer)?;
    }
    Ok(())
}

fn scale(settings: &Settings, input: PathBuf, out_dir: PathBuf, play: bool) -> Result<()> {
    let source = io::decode_file(&input)?;
    let output = ScaleGenerator::new(settings.scale.clone()).generate(&source)?;
    let written = output.persist(&out_dir)?;

    println!(
        "detected {:.1} Hz ({}), {} files in {}",
        output.base_frequency,
        output.detected.sustained,
        written.len(),
        out_dir.display()
    );
    for frame in output.frames() {
        println!(
            "  {:>5.1} s  {:>7.1} Hz  {:<4} {:<6} {}",
            frame.time_secs, frame.frequency_hz, frame.note, frame.solfege, frame.degree
        );
    }

    if play {
        audio::play_buffer(&output.complete)?;
    }
    Ok(())
}
