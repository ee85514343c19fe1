// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported document format for {path}: {reason}")]
    UnsupportedFormat { path: String, reason: String },

    #[error("File operation failed for {path}: {source}")]
    FileOperation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Classification backend unavailable: {0}")]
    Backend(String),

    #[error("Response parse failure: {0}")]
    Parse(String),

    #[error("Vector store error: {0}")]
    Store(String),

    #[error("Pipeline run timed out after {seconds}s")]
    TimedOut { seconds: u64 },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
