//! Error types for fwflash-core
//!
//! Every failure of a flash request ends up as one [`Error`]. Callers that
//! need to tell the user *what* went wrong (nothing was flashed, the firmware
//! is on the device but the filesystem is not, ...) use [`Error::class`].

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Broad classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// A required input was missing; no process was started
    Precondition,
    /// No filesystem partition could be read from the partition table.
    /// Recoverable: ask the user for the offset instead.
    PartitionLookup,
    /// The filesystem source could not be resolved; no process was started
    Request,
    /// The combined bootloader/partition-table/firmware write failed
    FirmwareStage,
    /// The firmware write succeeded but the filesystem write did not
    FilesystemStage,
}

/// fwflash error type
#[derive(Debug, Error)]
pub enum Error {
    /// A required request field is empty
    #[error("missing required field: {0}")]
    MissingRequiredField(&'static str),

    /// The partition table has no data/littlefs or data/spiffs entry,
    /// or could not be read
    #[error("no spiffs/littlefs partition found in partition table")]
    PartitionNotFound,

    /// The filesystem source is neither a directory, a .zip nor a .bin
    #[error("invalid filesystem source {0:?}: expected a directory, a .zip or a .bin")]
    InvalidFilesystemSource(PathBuf),

    /// The archive could not be extracted or holds no .bin image
    #[error("invalid filesystem archive {path:?}: {reason}")]
    InvalidArchive {
        /// Archive path
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// A filesystem image needs an offset but none (or a non-hex one) was given
    #[error("filesystem offset missing or malformed (expected 0x-prefixed hex)")]
    MissingOffset,

    /// The combined firmware write exited unsuccessfully
    #[error("firmware write failed:\n{output}")]
    FirmwareWriteFailed {
        /// Captured flashing utility output
        output: String,
    },

    /// The filesystem write or upload exited unsuccessfully
    #[error("firmware was written, but the filesystem write failed:\n{output}")]
    FilesystemWriteFailed {
        /// Captured flashing utility or build tool output
        output: String,
    },

    /// Local I/O failure while preparing the request
    #[error("{context}: {source}")]
    Io {
        /// What was being done
        context: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Classify this error
    pub fn class(&self) -> FailureClass {
        match self {
            Self::MissingRequiredField(_) => FailureClass::Precondition,
            Self::PartitionNotFound => FailureClass::PartitionLookup,
            Self::InvalidFilesystemSource(_)
            | Self::InvalidArchive { .. }
            | Self::MissingOffset
            | Self::Io { .. } => FailureClass::Request,
            Self::FirmwareWriteFailed { .. } => FailureClass::FirmwareStage,
            Self::FilesystemWriteFailed { .. } => FailureClass::FilesystemStage,
        }
    }

    /// Captured process output, for the two write failures
    pub fn process_output(&self) -> Option<&str> {
        match self {
            Self::FirmwareWriteFailed { output } | Self::FilesystemWriteFailed { output } => {
                Some(output)
            }
            _ => None,
        }
    }

    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Result type alias using the fwflash Error type
pub type Result<T> = std::result::Result<T, Error>;
