//! Destination layout and name collision handling
//!
//! Files land at `<output>/<YYYY>/<YYYYMMDD>/[VIDEO/]<name>`. When that name
//! is taken, identical content is skipped and different content gets the
//! first free `name_N.ext`.

use crate::error::{Error, Result};
use crate::hash::files_identical;
use crate::media::MediaKind;
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// What to do with a source file at its computed destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Destination name is free
    Copy,
    /// Destination already holds the same bytes, nothing is written
    SkipIdentical,
    /// Destination holds different bytes, copy under a numbered name
    RenameAndCopy,
}

/// Resolved destination for one source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationDecision {
    pub final_path: PathBuf,
    pub outcome: Outcome,
}

/// State of the destination root before a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputDirState {
    /// Did not exist and was created
    Created,
    /// Exists and is empty
    Empty,
    /// Exists and has entries; needs confirmation before use
    NonEmpty,
}

/// Relative directory for a capture time: `YYYY/YYYYMMDD[/VIDEO]`
pub fn relative_dir(timestamp: &DateTime<Local>, kind: MediaKind) -> PathBuf {
    let mut dir = PathBuf::from(timestamp.format("%Y").to_string());
    dir.push(timestamp.format("%Y%m%d").to_string());
    if let Some(category) = kind.category_dir() {
        dir.push(category);
    }
    dir
}

/// Build the candidate destination path (without collision handling)
pub fn build_destination_path(
    output_dir: &Path,
    source: &Path,
    timestamp: &DateTime<Local>,
    kind: MediaKind,
) -> Result<PathBuf> {
    let filename = source.file_name().ok_or_else(|| Error::InvalidPath {
        path: source.to_path_buf(),
    })?;

    Ok(output_dir.join(relative_dir(timestamp, kind)).join(filename))
}

/// Decide where `source` goes, given its candidate destination
///
/// Not atomic on its own: callers running concurrently must hold the
/// destination directory's lock from [`DirectoryLocks`] until the file has
/// been written.
pub fn resolve_destination(source: &Path, candidate: &Path) -> Result<DestinationDecision> {
    if !candidate.try_exists()? {
        return Ok(DestinationDecision {
            final_path: candidate.to_path_buf(),
            outcome: Outcome::Copy,
        });
    }

    if files_identical(source, candidate) {
        debug!(?source, ?candidate, "Destination holds identical content");
        return Ok(DestinationDecision {
            final_path: candidate.to_path_buf(),
            outcome: Outcome::SkipIdentical,
        });
    }

    let final_path = first_free_numbered_name(candidate)?;
    debug!(?source, ?candidate, ?final_path, "Destination taken, using numbered name");
    Ok(DestinationDecision {
        final_path,
        outcome: Outcome::RenameAndCopy,
    })
}

/// Probe `stem_1.ext`, `stem_2.ext`, ... and return the first unused one
fn first_free_numbered_name(path: &Path) -> Result<PathBuf> {
    let stem = path.file_stem().ok_or_else(|| Error::InvalidPath {
        path: path.to_path_buf(),
    })?;
    let extension = path.extension();
    let parent = path.parent().unwrap_or_else(|| Path::new(""));

    let mut n: u64 = 1;
    loop {
        let candidate = parent.join(numbered_name(stem, extension, n));
        if !candidate.try_exists()? {
            return Ok(candidate);
        }
        n += 1;
    }
}

fn numbered_name(stem: &OsStr, extension: Option<&OsStr>, n: u64) -> OsString {
    let mut name = stem.to_os_string();
    name.push(format!("_{n}"));
    if let Some(ext) = extension {
        name.push(".");
        name.push(ext);
    }
    name
}

/// Per-directory locks serializing name allocation and writes
///
/// Two workers targeting the same directory would otherwise both see a name
/// as free and one would overwrite the other.
#[derive(Debug, Default)]
pub struct DirectoryLocks {
    dirs: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl DirectoryLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock handle for `dir`, shared by every caller asking for the same path
    pub fn handle(&self, dir: &Path) -> Arc<Mutex<()>> {
        let mut dirs = self.dirs.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(dirs.entry(dir.to_path_buf()).or_default())
    }

    /// Run `f` while holding the lock for `dir`
    pub fn with_lock<T>(&self, dir: &Path, f: impl FnOnce() -> T) -> T {
        let handle = self.handle(dir);
        let _guard = handle.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }
}

/// Make sure the destination root exists and report whether it has content
pub fn inspect_output_dir(path: &Path) -> Result<OutputDirState> {
    match fs::read_dir(path) {
        Ok(mut entries) => {
            if entries.next().is_some() {
                Ok(OutputDirState::NonEmpty)
            } else {
                Ok(OutputDirState::Empty)
            }
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            fs::create_dir_all(path).map_err(|source| Error::OutputDir {
                path: path.to_path_buf(),
                source,
            })?;
            debug!(?path, "Created destination directory");
            Ok(OutputDirState::Created)
        }
        Err(source) => Err(Error::OutputDir {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_relative_dir() {
        assert_eq!(
            relative_dir(&at(2022, 3, 1), MediaKind::Image),
            PathBuf::from("2022").join("20220301")
        );
        assert_eq!(
            relative_dir(&at(2021, 7, 4), MediaKind::Video),
            PathBuf::from("2021").join("20210704").join("VIDEO")
        );
    }

    #[test]
    fn test_build_destination_path() {
        let dest = build_destination_path(
            Path::new("/sorted"),
            Path::new("/in/deep/photo.jpg"),
            &at(2022, 3, 1),
            MediaKind::Image,
        )
        .unwrap();
        assert_eq!(dest, PathBuf::from("/sorted/2022/20220301/photo.jpg"));

        assert!(
            build_destination_path(Path::new("/sorted"), Path::new("/"), &at(2022, 3, 1), MediaKind::Image)
                .is_err()
        );
    }

    #[test]
    fn test_resolve_free_name() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.jpg");
        fs::write(&source, b"a").unwrap();
        let candidate = dir.path().join("out").join("a.jpg");

        let decision = resolve_destination(&source, &candidate).unwrap();
        assert_eq!(decision.outcome, Outcome::Copy);
        assert_eq!(decision.final_path, candidate);
    }

    #[test]
    fn test_resolve_identical_is_skipped() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.jpg");
        let candidate = dir.path().join("b.jpg");
        fs::write(&source, b"same").unwrap();
        fs::write(&candidate, b"same").unwrap();

        let decision = resolve_destination(&source, &candidate).unwrap();
        assert_eq!(decision.outcome, Outcome::SkipIdentical);
        assert_eq!(decision.final_path, candidate);
    }

    #[test]
    fn test_resolve_numbered_without_gaps() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("src.jpg");
        fs::write(&source, b"new content").unwrap();
        let candidate = dir.path().join("a.jpg");
        fs::write(&candidate, b"old").unwrap();

        let first = resolve_destination(&source, &candidate).unwrap();
        assert_eq!(first.outcome, Outcome::RenameAndCopy);
        assert_eq!(first.final_path, dir.path().join("a_1.jpg"));

        fs::write(dir.path().join("a_1.jpg"), b"other").unwrap();
        fs::write(dir.path().join("a_3.jpg"), b"other").unwrap();
        let second = resolve_destination(&source, &candidate).unwrap();
        assert_eq!(second.final_path, dir.path().join("a_2.jpg"));
    }

    #[test]
    fn test_resolve_after_copy_is_skip() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("src.jpg");
        fs::write(&source, b"payload").unwrap();
        let candidate = dir.path().join("a.jpg");

        let decision = resolve_destination(&source, &candidate).unwrap();
        assert_eq!(decision.outcome, Outcome::Copy);
        fs::copy(&source, &decision.final_path).unwrap();

        let again = resolve_destination(&source, &candidate).unwrap();
        assert_eq!(again.outcome, Outcome::SkipIdentical);
    }

    #[test]
    fn test_numbered_name_without_extension() {
        assert_eq!(numbered_name(OsStr::new("README"), None, 2), OsString::from("README_2"));
        assert_eq!(
            numbered_name(OsStr::new("archive.tar"), Some(OsStr::new("gz")), 1),
            OsString::from("archive.tar_1.gz")
        );
    }

    #[test]
    fn test_directory_locks_share_handles() {
        let locks = DirectoryLocks::new();
        let a = locks.handle(Path::new("/out/2022/20220301"));
        let b = locks.handle(Path::new("/out/2022/20220301"));
        let c = locks.handle(Path::new("/out/2022/20220302"));
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn test_directory_locks_serialize() {
        let locks = DirectoryLocks::new();
        let inside = AtomicUsize::new(0);
        let max_inside = AtomicUsize::new(0);

        thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    locks.with_lock(Path::new("/out/shared"), || {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_inside.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(10));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    });
                });
            }
        });

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_inspect_output_dir() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("new").join("root");

        assert_eq!(inspect_output_dir(&target).unwrap(), OutputDirState::Created);
        assert!(target.is_dir());
        assert_eq!(inspect_output_dir(&target).unwrap(), OutputDirState::Empty);

        fs::write(target.join("existing.jpg"), b"x").unwrap();
        assert_eq!(inspect_output_dir(&target).unwrap(), OutputDirState::NonEmpty);
    }

    #[test]
    fn test_inspect_output_dir_on_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain");
        fs::write(&file, b"x").unwrap();

        assert!(matches!(
            inspect_output_dir(&file),
            Err(Error::OutputDir { .. })
        ));
    }
}
