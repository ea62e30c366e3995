//! chronosort - file photos and videos into a date tree
//!
//! This library organizes media files by capture time with support for:
//! - EXIF metadata extraction for images
//! - `moov/mvhd` creation time for MP4/MOV/3GP videos
//! - File system timestamp fallback
//! - xxHash-based detection of identical files at the destination
//! - Parallel processing on a bounded Rayon pool

pub mod cli;
pub mod config;
pub mod destination;
pub mod error;
pub mod hash;
pub mod media;
pub mod pool;
pub mod process;
pub mod report;
pub mod time;
pub mod transfer;

pub use cli::Cli;
pub use config::{Config, ConfigError, FileOperation};
pub use destination::{DestinationDecision, DirectoryLocks, Outcome, OutputDirState};
pub use error::{Error, Result};
pub use media::{MediaFile, MediaKind};
pub use process::{JobOutcome, JobResult, Processor};
pub use report::RunReport;
pub use time::{ExtractedTime, TimeSource};
