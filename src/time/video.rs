//! Video creation time from ISO-BMFF (`mp4`, `mov`, `3gp`) headers
//!
//! The movie header box (`moov/mvhd`) stores its creation time as seconds
//! since 1904-01-01 UTC. Containers without that box fail here and the
//! caller falls back to the next time source.

use crate::error::{Error, Result};
use chrono::{DateTime, Local, Utc};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use tracing::trace;

/// Seconds between the MP4 epoch (1904-01-01) and the Unix epoch
pub const MP4_EPOCH_OFFSET: i64 = 2_082_844_800;

/// Byte range of a box payload within the file
#[derive(Debug, Clone, Copy)]
struct BoxRange {
    data_start: u64,
    data_end: u64,
}

/// Translate a container timestamp into Unix seconds
///
/// Returns `None` only if the raw value does not fit the arithmetic.
pub fn container_epoch_to_unix(raw: u64, epoch_offset_seconds: i64) -> Option<i64> {
    i64::try_from(raw).ok()?.checked_sub(epoch_offset_seconds)
}

/// Extract the `mvhd` creation time, converted to local time
pub fn extract_container_time(path: &Path) -> Result<DateTime<Local>> {
    let raw = read_mvhd_creation_time(path)?;
    let unix = container_epoch_to_unix(raw, MP4_EPOCH_OFFSET)
        .ok_or_else(|| metadata_error(path, format!("creation time {raw} out of range")))?;
    let utc = DateTime::<Utc>::from_timestamp(unix, 0)
        .ok_or_else(|| metadata_error(path, format!("creation time {raw} out of range")))?;

    trace!(?path, raw, unix, "Read mvhd creation time");
    Ok(utc.with_timezone(&Local))
}

fn read_mvhd_creation_time(path: &Path) -> Result<u64> {
    let mut file = File::open(path)?;
    let file_len = file.metadata()?.len();

    let moov = find_box(&mut file, 0, file_len, *b"moov")?
        .ok_or_else(|| metadata_error(path, "no moov box"))?;
    let mvhd = find_box(&mut file, moov.data_start, moov.data_end, *b"mvhd")?
        .ok_or_else(|| metadata_error(path, "no mvhd box"))?;

    file.seek(SeekFrom::Start(mvhd.data_start))?;
    let mut version_flags = [0u8; 4];
    file.read_exact(&mut version_flags)?;

    let (needed, creation_time) = match version_flags[0] {
        0 => (8, u64::from(read_u32_be(&mut file)?)),
        1 => (12, read_u64_be(&mut file)?),
        version => {
            return Err(metadata_error(
                path,
                format!("unsupported mvhd version {version}"),
            ));
        }
    };

    if mvhd.data_end.saturating_sub(mvhd.data_start) < needed {
        return Err(metadata_error(path, "truncated mvhd box"));
    }

    Ok(creation_time)
}

/// Scan sibling boxes in `[start, end)` for the first one of `box_type`
fn find_box(
    file: &mut File,
    start: u64,
    end: u64,
    box_type: [u8; 4],
) -> std::io::Result<Option<BoxRange>> {
    let mut offset = start;
    while offset + 8 <= end {
        file.seek(SeekFrom::Start(offset))?;
        let mut header = [0u8; 8];
        file.read_exact(&mut header)?;

        let mut box_size = u64::from(u32::from_be_bytes([header[0], header[1], header[2], header[3]]));
        let kind = [header[4], header[5], header[6], header[7]];
        let mut header_size = 8u64;

        if box_size == 1 {
            box_size = read_u64_be(file)?;
            header_size = 16;
        } else if box_size == 0 {
            // Box extends to the end of its parent
            box_size = end - offset;
        }
        if box_size < header_size {
            return Ok(None);
        }

        let box_end = offset.saturating_add(box_size).min(end);
        if kind == box_type {
            return Ok(Some(BoxRange {
                data_start: offset + header_size,
                data_end: box_end,
            }));
        }
        offset = box_end;
    }
    Ok(None)
}

fn read_u32_be(file: &mut File) -> std::io::Result<u32> {
    let mut buf = [0u8; 4];
    file.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

fn read_u64_be(file: &mut File) -> std::io::Result<u64> {
    let mut buf = [0u8; 8];
    file.read_exact(&mut buf)?;
    Ok(u64::from_be_bytes(buf))
}

fn metadata_error(path: &Path, message: impl Into<String>) -> Error {
    Error::ContainerMetadata {
        path: path.to_path_buf(),
        message: message.into(),
    }
}
