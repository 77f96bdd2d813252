//! Shared error type used by every crate in the workspace.
//!
//! Per-crate boundaries (`sdr-audio`, `sdr-dsp`, `sdr-engine`,
//! `sdr-connector`, `sdr-state`) define their own `thiserror` enums for
//! concerns specific to them and wrap [`CoreError`] via `#[from]` where a
//! lower-level failure needs to surface through a higher-level one.

use thiserror::Error;

/// Core error type shared across the audio pipeline.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("audio error: {0}")]
    Audio(String),

    #[error("dsp error: {0}")]
    Dsp(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(u32),

    #[error("buffer underrun")]
    BufferUnderrun,

    #[error("buffer overrun")]
    BufferOverrun,

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("state error: {0}")]
    State(String),
}

/// Result type alias for [`CoreError`].
pub type CoreResult<T> = Result<T, CoreError>;
