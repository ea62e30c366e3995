//! Byte-for-byte file comparison for deduplication
//!
//! Sizes are compared first; only same-sized files are streamed through a
//! 128-bit xxHash3 digest.

use crate::error::Result;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{trace, warn};
use xxhash_rust::xxh3::Xxh3;

/// Read chunk size while digesting (256KB)
const CHUNK_SIZE: usize = 256 * 1024;

/// Compute the 128-bit content digest of a file
pub fn compute_content_digest(path: &Path) -> Result<u128> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(CHUNK_SIZE, file);
    let mut hasher = Xxh3::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    let digest = hasher.digest128();
    trace!(?path, digest = %format!("{digest:032x}"), "Computed content digest");
    Ok(digest)
}

/// Whether two files hold identical bytes
///
/// Any I/O failure counts as "different", so callers never skip a file
/// they could not verify.
pub fn files_identical(a: &Path, b: &Path) -> bool {
    match compare_files(a, b) {
        Ok(identical) => identical,
        Err(e) => {
            warn!(left = ?a, right = ?b, error = %e, "Comparison failed, treating files as different");
            false
        }
    }
}

fn compare_files(a: &Path, b: &Path) -> Result<bool> {
    let size_a = fs::metadata(a)?.len();
    let size_b = fs::metadata(b)?.len();
    if size_a != size_b {
        trace!(left = ?a, right = ?b, size_a, size_b, "Sizes differ");
        return Ok(false);
    }

    Ok(compute_content_digest(a)? == compute_content_digest(b)?)
}
