//! Error types for Lydtrekk.

use thiserror::Error;

/// Library-level error type for Lydtrekk operations.
#[derive(Error, Debug)]
pub enum LydtrekkError {
    #[error("Missing fileId")]
    MissingFileId,

    #[error("No storage bucket configured")]
    StoreNotConfigured,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Upstream fetch failed: {0}")]
    UpstreamFetch(String),

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("Transcode failed: {0}")]
    Transcode(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Signing failed: {0}")]
    Sign(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Lydtrekk operations.
pub type Result<T> = std::result::Result<T, LydtrekkError>;
