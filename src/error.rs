//! Error types for chronosort

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for chronosort operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for chronosort
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read EXIF data from {path}: {message}")]
    ExifRead { path: PathBuf, message: String },

    #[error("Failed to read container metadata from {path}: {message}")]
    ContainerMetadata { path: PathBuf, message: String },

    /// Directory creation, file creation, mid-stream copy and source removal
    /// failures all land here, told apart only by path and cause.
    #[error("Transfer failed at {path}: {source}")]
    Transfer {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] crate::config::ConfigError),

    #[error("Destination directory {path} is unusable: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory traversal error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("Failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Invalid file path: {path}")]
    InvalidPath { path: PathBuf },
}

impl Error {
    /// Wrap an I/O error raised while transferring `path`
    pub fn transfer(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Transfer {
            path: path.into(),
            source,
        }
    }
}
