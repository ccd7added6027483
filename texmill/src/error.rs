//! Error types for the texture pipeline.

use thiserror::Error;

/// Errors that can occur while preparing a texture for compression.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The wavelet path requires a square power-of-two image.
    #[error("Image width {0} is not a power of two")]
    NotPow2(u32),

    /// Malformed or inconsistent input (bad flag combination, missing
    /// companion file, dimension mismatch).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An input whose pixel format this build cannot decode.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// An internal buffer allocation failed.
    #[error("Out of memory: {0}")]
    OutOfMemory(String),

    /// The downstream sink returned failure; propagated unchanged.
    #[error("Compressor error: {0}")]
    Compressor(String),
}
