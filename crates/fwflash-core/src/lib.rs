//! fwflash-core - Core library for flash provisioning
//!
//! This crate holds everything about a flash request that does not involve
//! running external programs:
//!
//! - [`partition`] - partition table parsing, finding the filesystem partition
//! - [`fs_image`] - classifying and resolving the filesystem payload
//! - [`plan`] - ordered offset/image pairs for one write
//! - [`offset`] - flash addresses and their notations
//!
//! # Example
//!
//! ```ignore
//! use fwflash_core::fs_image::{FilesystemSource, FsPlacement, FsResolver};
//! use fwflash_core::partition::locate_filesystem_partition;
//!
//! let placement = locate_filesystem_partition("partitions.csv")
//!     .map(FsPlacement::from)
//!     .unwrap_or_default();
//! let source = FilesystemSource::classify("littlefs.zip").unwrap();
//! let step = FsResolver::new().resolve(&source, &placement)?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod error;
pub mod fs_image;
pub mod offset;
pub mod partition;
pub mod plan;

pub use error::{Error, FailureClass, Result};
pub use offset::FlashOffset;
pub use plan::{FlashPlan, FlashRegion};
