//! Filesystem source classification

use std::path::{Path, PathBuf};

/// Archive extension
const ARCHIVE_EXT: &str = ".zip";

/// Raw image extension
pub(crate) const IMAGE_EXT: &str = ".bin";

/// Where the filesystem payload comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilesystemSource {
    /// A directory to be packed and uploaded by the build tool
    Directory(PathBuf),
    /// A `.zip` archive containing a `.bin` image
    Archive(PathBuf),
    /// A raw `.bin` image
    RawImage(PathBuf),
    /// Anything else
    Invalid(PathBuf),
}

impl FilesystemSource {
    /// Classify a user-supplied path
    ///
    /// Returns `None` for an empty path, meaning no filesystem step was
    /// requested. An existing directory wins over any extension check;
    /// extensions are compared case-insensitively.
    pub fn classify(path: &str) -> Option<Self> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return None;
        }

        let path = PathBuf::from(trimmed);
        let source = if path.is_dir() {
            Self::Directory(path)
        } else if has_extension(&path, ARCHIVE_EXT) {
            Self::Archive(path)
        } else if has_extension(&path, IMAGE_EXT) {
            Self::RawImage(path)
        } else {
            Self::Invalid(path)
        };

        log::debug!("Filesystem source: {:?}", source);
        Some(source)
    }

    /// The path this source was classified from
    pub fn path(&self) -> &Path {
        match self {
            Self::Directory(p) | Self::Archive(p) | Self::RawImage(p) | Self::Invalid(p) => p,
        }
    }

    /// Short description for messages
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Directory(_) => "directory",
            Self::Archive(_) => "archive",
            Self::RawImage(_) => "image",
            Self::Invalid(_) => "invalid",
        }
    }
}

/// Case-insensitive suffix check on the whole path
pub(crate) fn has_extension(path: &Path, ext: &str) -> bool {
    path.to_string_lossy().to_lowercase().ends_with(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_no_step() {
        assert_eq!(FilesystemSource::classify(""), None);
        assert_eq!(FilesystemSource::classify("   "), None);
    }

    #[test]
    fn test_classify_by_extension() {
        assert_eq!(
            FilesystemSource::classify("/nonexistent/fs.zip"),
            Some(FilesystemSource::Archive("/nonexistent/fs.zip".into()))
        );
        assert_eq!(
            FilesystemSource::classify("/nonexistent/FS.ZIP"),
            Some(FilesystemSource::Archive("/nonexistent/FS.ZIP".into()))
        );
        assert_eq!(
            FilesystemSource::classify("/nonexistent/littlefs.BIN"),
            Some(FilesystemSource::RawImage("/nonexistent/littlefs.BIN".into()))
        );
        assert_eq!(
            FilesystemSource::classify("/nonexistent/fs.tar.gz"),
            Some(FilesystemSource::Invalid("/nonexistent/fs.tar.gz".into()))
        );
    }

    #[test]
    fn test_directory_wins() {
        let dir = tempfile::Builder::new().suffix(".zip").tempdir().unwrap();
        let path = dir.path().to_str().unwrap();
        assert_eq!(
            FilesystemSource::classify(path),
            Some(FilesystemSource::Directory(dir.path().to_path_buf()))
        );
    }
}
