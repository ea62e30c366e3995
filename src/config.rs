//! Run configuration for chronosort

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default log file name, created in the working directory
pub const DEFAULT_LOG_FILE: &str = "chronosort.log";

/// File operation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FileOperation {
    /// Copy files to destination
    #[default]
    Copy,
    /// Copy files, then delete the source once the copy succeeded
    Move,
}

/// Configuration for a single run
///
/// Built once at startup and shared read-only by every worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source tree to scan for media files
    pub source_dir: PathBuf,

    /// Root of the date-organized destination tree
    pub output_dir: PathBuf,

    /// File operation mode
    pub operation: FileOperation,

    /// Number of workers (0 = available processing units)
    pub workers: usize,

    /// Write a log file in addition to console output
    pub log_to_file: bool,

    /// Log file path (defaults to `chronosort.log` in the working directory)
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::new(),
            output_dir: PathBuf::new(),
            operation: FileOperation::default(),
            workers: 0,
            log_to_file: false,
            log_file: None,
        }
    }
}

impl Config {
    /// Create a configuration for the given source and destination roots
    pub fn new(source_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    /// Whether sources are removed after a successful copy
    pub fn move_after_copy(&self) -> bool {
        self.operation == FileOperation::Move
    }

    /// Get log file path, using default if not specified
    pub fn get_log_file(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> std::result::Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Check the roots before any work starts
    pub fn validate(&self) -> Result<()> {
        if self.source_dir.as_os_str().is_empty() {
            return Err(Error::Config("no source directory given".into()));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(Error::Config("no destination directory given".into()));
        }
        if !self.source_dir.is_dir() {
            return Err(Error::Config(format!(
                "source directory {} does not exist or is not a directory",
                self.source_dir.display()
            )));
        }

        // Compare canonical forms so `./a` and `a` match
        let source = canonical_or_raw(&self.source_dir);
        let output = canonical_or_raw(&self.output_dir);
        if output.starts_with(&source) {
            return Err(Error::Config(format!(
                "destination {} is inside source {}",
                self.output_dir.display(),
                self.source_dir.display()
            )));
        }

        Ok(())
    }
}

/// Canonicalize the deepest existing ancestor of `path` and re-append the rest
fn canonical_or_raw(path: &Path) -> PathBuf {
    let mut missing = Vec::new();
    let mut current = path;

    loop {
        if let Ok(canonical) = current.canonicalize() {
            return missing
                .iter()
                .rev()
                .fold(canonical, |acc, part| acc.join(part));
        }
        match (current.parent(), current.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name);
                current = if parent.as_os_str().is_empty() {
                    Path::new(".")
                } else {
                    parent
                };
            }
            _ => return path.to_path_buf(),
        }
    }
}

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("Failed to read config file '{}': {source}", .path.display())]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse configuration file
    #[error("Failed to parse config file '{}': {source}", .path.display())]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}
