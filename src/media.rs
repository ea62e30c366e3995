//! Media kind classification by file extension

use std::fmt;
use std::path::{Path, PathBuf};

/// Extensions treated as still images
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "heic"];

/// Extensions treated as videos
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "mts", "3gp"];

/// Category subdirectory used for videos
const VIDEO_CATEGORY: &str = "VIDEO";

/// Kind of media a file holds, derived only from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
    Unknown,
}

impl MediaKind {
    /// Classify a path by its extension (case-insensitive)
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(MediaKind::Unknown)
    }

    /// Classify a bare extension, without the leading dot
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Image
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Video
        } else {
            MediaKind::Unknown
        }
    }

    /// Whether files of this kind take part in a run
    pub fn is_supported(&self) -> bool {
        !matches!(self, MediaKind::Unknown)
    }

    /// Category subdirectory under the date folder, if any
    pub fn category_dir(&self) -> Option<&'static str> {
        match self {
            MediaKind::Video => Some(VIDEO_CATEGORY),
            MediaKind::Image | MediaKind::Unknown => None,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
            MediaKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// A source file accepted into the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub path: PathBuf,
    pub kind: MediaKind,
}

impl MediaFile {
    /// Classify `path`, returning `None` for unsupported files
    pub fn classify(path: PathBuf) -> Option<Self> {
        let kind = MediaKind::from_path(&path);
        kind.is_supported().then_some(MediaFile { path, kind })
    }
}
