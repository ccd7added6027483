//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the driver: one message on stderr, one
//! non-zero exit code, no stack traces.

use std::fmt;
use std::process;
use texmill::PipelineError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Bad flag combination or value
    InvalidArguments(String),
    /// Failed to decode an input image
    ImageLoad {
        path: String,
        error: image::ImageError,
    },
    /// Failed to create the output file
    FileCreate {
        path: String,
        error: std::io::Error,
    },
    /// The pipeline reported failure
    Pipeline(PipelineError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);
        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::InvalidArguments(msg) => write!(f, "Invalid arguments: {}", msg),
            CliError::ImageLoad { path, error } => {
                write!(f, "Failed to load image '{}': {}", path, error)
            }
            CliError::FileCreate { path, error } => {
                write!(f, "Failed to create '{}': {}", path, error)
            }
            CliError::Pipeline(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ImageLoad { error, .. } => Some(error),
            CliError::FileCreate { error, .. } => Some(error),
            CliError::Pipeline(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PipelineError> for CliError {
    fn from(e: PipelineError) -> Self {
        CliError::Pipeline(e)
    }
}
