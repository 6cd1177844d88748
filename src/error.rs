use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the video library server
#[derive(Error, Debug)]
pub enum ShelfError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unreadable path {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory cycle detected at {path:?}")]
    CycleDetected { path: PathBuf },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Root is no longer configured: {0}")]
    ConfigMissing(String),

    #[error("Range not satisfiable: {header} (file size {file_size})")]
    RangeNotSatisfiable { header: String, file_size: u64 },

    #[error("Stream I/O error: {0}")]
    StreamIo(#[source] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ShelfError {
    /// Wrap an I/O failure on a specific filesystem path.
    pub fn unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ShelfError::Unreadable {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ShelfError>;
