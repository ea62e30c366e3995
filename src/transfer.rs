//! Copying and moving files into the destination tree

use crate::config::FileOperation;
use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, warn};

/// Buffer size for streaming copies (256KB)
const BUFFER_SIZE: usize = 256 * 1024;

/// Copy `source` to `dest`, then remove `source` when moving
///
/// Missing parent directories are created. The source is only removed
/// after every byte has been written and flushed.
pub fn transfer(source: &Path, dest: &Path, operation: FileOperation) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::transfer(parent, e))?;
    }

    copy_file(source, dest)?;
    preserve_mtime(source, dest);

    if operation == FileOperation::Move {
        fs::remove_file(source).map_err(|e| Error::transfer(source, e))?;
        debug!(?source, "Removed source after copy");
    }

    Ok(())
}

/// Copy file with buffered I/O, removing a partially written destination
fn copy_file(source: &Path, dest: &Path) -> Result<()> {
    let src_file = File::open(source).map_err(|e| Error::transfer(source, e))?;
    let dest_file = File::create(dest).map_err(|e| Error::transfer(dest, e))?;

    let result = stream(src_file, dest_file, source, dest);
    if result.is_err()
        && let Err(e) = fs::remove_file(dest)
    {
        warn!(?dest, error = %e, "Failed to remove partial copy");
    }
    result
}

fn stream(src_file: File, dest_file: File, source: &Path, dest: &Path) -> Result<()> {
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, src_file);
    let mut writer = BufWriter::with_capacity(BUFFER_SIZE, dest_file);

    let mut buffer = vec![0u8; BUFFER_SIZE];
    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .map_err(|e| Error::transfer(source, e))?;
        if bytes_read == 0 {
            break;
        }
        writer
            .write_all(&buffer[..bytes_read])
            .map_err(|e| Error::transfer(dest, e))?;
    }

    writer.flush().map_err(|e| Error::transfer(dest, e))?;
    Ok(())
}

/// Carry the source modification time over to the copy (best effort)
fn preserve_mtime(source: &Path, dest: &Path) {
    if let Ok(metadata) = fs::metadata(source)
        && let Ok(mtime) = metadata.modified()
        && let Err(e) = filetime::set_file_mtime(dest, filetime::FileTime::from_system_time(mtime))
    {
        debug!(?dest, error = %e, "Could not preserve modification time");
    }
}
