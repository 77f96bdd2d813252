//! Rendering-side errors: malformed canvas geometry handed down from a
//! host UI. Never raised by a well-behaved caller; present so render
//! entry points return `Result` rather than panicking on a zero-width
//! canvas.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VizError {
    #[error("canvas width must be positive, got {0}")]
    InvalidCanvasWidth(f64),
    #[error("canvas height must be positive, got {0}")]
    InvalidCanvasHeight(f64),
}

pub type VizResult<T> = Result<T, VizError>;
