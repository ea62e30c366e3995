//! Capture time resolution
//!
//! Each media kind has an ordered chain of metadata strategies:
//! - EXIF metadata for images
//! - `moov/mvhd` creation time for ISO-BMFF videos
//!
//! Every strategy either yields a plausible timestamp or nothing, and the
//! chain always ends with the file system modification time.

pub mod exif;
pub mod video;

use crate::error::Result;
use crate::media::MediaKind;
use chrono::{DateTime, Duration, Local};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// How far past "now" a metadata timestamp may lie before it is discarded
pub const FUTURE_TOLERANCE_HOURS: i64 = 24;

/// Source of the extracted timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSource {
    /// Extracted from EXIF metadata
    Exif,
    /// Extracted from the video container header
    ContainerMetadata,
    /// From file system modification time
    FileSystem,
    /// Current time, substituted when nothing else was readable
    Now,
}

impl TimeSource {
    /// Metadata strategies for a media kind, in priority order.
    /// The file system fallback is implied after the last one.
    pub fn metadata_chain(kind: MediaKind) -> &'static [TimeSource] {
        match kind {
            MediaKind::Image => &[TimeSource::Exif],
            MediaKind::Video => &[TimeSource::ContainerMetadata],
            MediaKind::Unknown => &[],
        }
    }
}

/// Result of timestamp extraction
#[derive(Debug, Clone)]
pub struct ExtractedTime {
    /// The capture instant, in local time
    pub timestamp: DateTime<Local>,
    /// Source of the timestamp
    pub source: TimeSource,
}

/// Resolve the capture time of a media file
///
/// Only fails when the modification time itself cannot be read.
pub fn extract_time(path: &Path, kind: MediaKind) -> Result<ExtractedTime> {
    extract_time_at(path, kind, Local::now())
}

fn extract_time_at(path: &Path, kind: MediaKind, now: DateTime<Local>) -> Result<ExtractedTime> {
    for &source in TimeSource::metadata_chain(kind) {
        let decoded = match source {
            TimeSource::Exif => exif::extract_exif_time(path),
            TimeSource::ContainerMetadata => video::extract_container_time(path),
            // never listed in a metadata chain
            TimeSource::FileSystem | TimeSource::Now => break,
        };

        match decoded {
            Ok(timestamp) if is_plausible(&timestamp, &now) => {
                debug!(?path, ?source, %timestamp, "Resolved capture time");
                return Ok(ExtractedTime { timestamp, source });
            }
            Ok(timestamp) => {
                warn!(?path, ?source, %timestamp, "Discarding implausible metadata time");
            }
            Err(e) => {
                debug!(?path, ?source, error = %e, "No usable metadata time");
            }
        }
    }

    let timestamp = file_system_time(path)?;
    debug!(?path, %timestamp, "Using file system modification time");
    Ok(ExtractedTime {
        timestamp,
        source: TimeSource::FileSystem,
    })
}

/// Accept timestamps from the Unix epoch up to a day past `now`
pub fn is_plausible(timestamp: &DateTime<Local>, now: &DateTime<Local>) -> bool {
    timestamp.timestamp() >= 0 && *timestamp <= *now + Duration::hours(FUTURE_TOLERANCE_HOURS)
}

impl ExtractedTime {
    /// Stand-in used when even the modification time is unreadable
    pub fn now() -> Self {
        Self {
            timestamp: Local::now(),
            source: TimeSource::Now,
        }
    }
}

/// Modification time of `path` in local time
pub fn file_system_time(path: &Path) -> Result<DateTime<Local>> {
    let modified = fs::metadata(path)?.modified()?;
    Ok(DateTime::<Local>::from(modified))
}
