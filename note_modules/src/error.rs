// src/error.rs

use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

/// Failures raised by the analysis and synthesis core.
///
/// Only `InvalidNoteFormat` is recoverable inside a composition (the event is
/// skipped); the rest abort the call that raised them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("invalid note label: {label:?}")]
    InvalidNoteFormat { label: String },

    #[error("buffer contains no samples")]
    EmptyBuffer,

    #[error("input carries no signal")]
    SilentInput,

    #[error("missing reference recordings for: {}", .missing.join(", "))]
    MissingReferenceNote { missing: Vec<String> },

    #[error("unsupported sample rate: {rate} Hz")]
    UnsupportedSampleRate { rate: u32 },

    #[error("invalid timestamp: {value:?} (expected hh:mm:ss.fff or hh:mm:ss:fff)")]
    InvalidTimestamp { value: String },

    #[error("resampler error: {0}")]
    Resampler(String),
}

impl From<rubato::ResamplerConstructionError> for CoreError {
    fn from(e: rubato::ResamplerConstructionError) -> Self {
        CoreError::Resampler(e.to_string())
    }
}

impl From<rubato::ResampleError> for CoreError {
    fn from(e: rubato::ResampleError) -> Self {
        CoreError::Resampler(e.to_string())
    }
}
