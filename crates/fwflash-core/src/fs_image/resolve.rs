//! Filesystem source resolution

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::source::{has_extension, FilesystemSource, IMAGE_EXT};
use crate::error::{Error, Result};
use crate::offset::FlashOffset;
use crate::partition::{FilesystemPartition, FsSubtype};
use crate::plan::FlashRegion;

/// Prefix for scratch directories holding extracted archives
const SCRATCH_PREFIX: &str = "fwflash-fs-";

/// The build-system project a directory source is uploaded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildProject {
    /// Project root; the build tool runs here
    pub root: PathBuf,
    /// Build environment (profile) name
    pub environment: String,
}

/// Instruction to let the build tool pack and upload the filesystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFs {
    /// Project to run the upload target in
    pub project: BuildProject,
    /// The directory the user pointed at
    pub data_dir: PathBuf,
}

/// A filesystem image ready to be written
///
/// For archive sources this owns the directory the archive was extracted
/// to. The directory is removed when the `ResolvedImage` is dropped, so it
/// must be kept alive until the write has finished.
#[derive(Debug)]
pub struct ResolvedImage {
    region: FlashRegion,
    subtype: Option<FsSubtype>,
    scratch: Option<TempDir>,
}

impl ResolvedImage {
    /// The region to write
    pub fn region(&self) -> &FlashRegion {
        &self.region
    }

    /// Filesystem kind, if known from the partition table
    pub fn subtype(&self) -> Option<FsSubtype> {
        self.subtype
    }

    /// Extraction directory, for archive sources
    pub fn scratch_dir(&self) -> Option<&Path> {
        self.scratch.as_ref().map(TempDir::path)
    }
}

/// What to do for the filesystem
#[derive(Debug)]
pub enum FilesystemStep {
    /// Run the build tool's upload-filesystem target
    Upload(UploadFs),
    /// Write an image with the flashing utility
    Image(ResolvedImage),
}

/// Offset and filesystem kind the image goes to
///
/// The offset is kept as the user wrote it; it is only validated when an
/// image actually needs it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FsPlacement {
    /// Offset text, `0x`-prefixed hex expected
    pub offset: Option<String>,
    /// Filesystem kind
    pub subtype: Option<FsSubtype>,
}

impl From<FilesystemPartition> for FsPlacement {
    fn from(fs: FilesystemPartition) -> Self {
        Self {
            offset: Some(fs.offset.to_string()),
            subtype: Some(fs.subtype),
        }
    }
}

/// Turns a [`FilesystemSource`] into a [`FilesystemStep`]
#[derive(Debug, Clone, Default)]
pub struct FsResolver {
    project: Option<BuildProject>,
    scratch_root: Option<PathBuf>,
}

impl FsResolver {
    /// Create a resolver without a build project
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the build project used for directory sources
    pub fn with_project(mut self, project: Option<BuildProject>) -> Self {
        self.project = project;
        self
    }

    /// Create extraction directories below `root` instead of the system
    /// temp directory
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    /// Resolve a filesystem source
    pub fn resolve(
        &self,
        source: &FilesystemSource,
        placement: &FsPlacement,
    ) -> Result<FilesystemStep> {
        match source {
            FilesystemSource::Directory(dir) => {
                let project = self
                    .project
                    .clone()
                    .ok_or(Error::MissingRequiredField("project"))?;
                log::info!(
                    "Filesystem directory {} will be built and uploaded by the build tool ({})",
                    dir.display(),
                    project.environment
                );
                Ok(FilesystemStep::Upload(UploadFs {
                    project,
                    data_dir: dir.clone(),
                }))
            }
            FilesystemSource::Archive(archive) => {
                let offset = require_offset(placement)?;
                let scratch = self.scratch_dir()?;
                let image = extract_image(archive, scratch.path())?;
                log::info!("Using {} from {}", image.display(), archive.display());
                Ok(FilesystemStep::Image(ResolvedImage {
                    region: FlashRegion::new(offset, image),
                    subtype: placement.subtype,
                    scratch: Some(scratch),
                }))
            }
            FilesystemSource::RawImage(image) => {
                let offset = require_offset(placement)?;
                Ok(FilesystemStep::Image(ResolvedImage {
                    region: FlashRegion::new(offset, image.clone()),
                    subtype: placement.subtype,
                    scratch: None,
                }))
            }
            FilesystemSource::Invalid(path) => Err(Error::InvalidFilesystemSource(path.clone())),
        }
    }

    fn scratch_dir(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(SCRATCH_PREFIX);
        let dir = match &self.scratch_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };
        dir.map_err(|e| Error::io("failed to create extraction directory", e))
    }
}

fn require_offset(placement: &FsPlacement) -> Result<FlashOffset> {
    placement
        .offset
        .as_deref()
        .and_then(FlashOffset::parse_hex)
        .ok_or(Error::MissingOffset)
}

/// Extract `archive` into `dest` and pick the image
///
/// Candidates are all `.bin` files at any depth; the lexicographically
/// smallest relative path wins so the choice does not depend on directory
/// listing order.
fn extract_image(archive: &Path, dest: &Path) -> Result<PathBuf> {
    let invalid = |reason: String| Error::InvalidArchive {
        path: archive.to_path_buf(),
        reason,
    };

    let file = File::open(archive).map_err(|e| invalid(e.to_string()))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| invalid(e.to_string()))?;
    zip.extract(dest).map_err(|e| invalid(e.to_string()))?;
    log::debug!("Extracted {} entries to {}", zip.len(), dest.display());

    let mut images = Vec::new();
    collect_images(dest, &mut images)?;
    images.sort();

    match images.as_slice() {
        [] => Err(invalid(format!("no {} image found", IMAGE_EXT))),
        [only] => Ok(only.clone()),
        [first, ..] => {
            log::warn!(
                "Archive {} contains {} images, using {}",
                archive.display(),
                images.len(),
                first.display()
            );
            Ok(first.clone())
        }
    }
}

fn collect_images(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        fs::read_dir(dir).map_err(|e| Error::io(format!("failed to list {}", dir.display()), e))?;
    for entry in entries {
        let path = entry
            .map_err(|e| Error::io(format!("failed to list {}", dir.display()), e))?
            .path();
        if path.is_dir() {
            collect_images(&path, out)?;
        } else if has_extension(&path, IMAGE_EXT) {
            out.push(path);
        }
    }
    Ok(())
}
