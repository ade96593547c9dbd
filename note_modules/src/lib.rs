// src/lib.rs

pub mod analyzer;
pub mod audio;
pub mod buffer;
pub mod compositor;
pub mod config;
pub mod error;
pub mod io;
pub mod scale;
pub mod shift;
pub mod theory;

pub use analyzer::{FrequencyFrame, analyze_windowed, dominant_frequency};
pub use buffer::AudioBuffer;
pub use compositor::{Composition, Compositor, ReferenceLibrary};
pub use config::Settings;
pub use error::{CoreError, CoreResult};
pub use scale::{ScaleGenerator, ScaleOutput};
pub use shift::PitchShift;
pub use theory::{Note, PitchClass};
