//! Filesystem image sources
//!
//! The filesystem payload can be given three ways:
//!
//! - a directory: the build tool packs and uploads it itself (`uploadfs`),
//!   fwflash only delegates
//! - a `.zip` archive holding a prebuilt image
//! - a raw `.bin` image
//!
//! [`FilesystemSource::classify`] turns the user's path into one of these
//! once, and [`FsResolver::resolve`] turns that into a [`FilesystemStep`]
//! the sequencer can execute.

mod resolve;
mod source;

pub use resolve::{BuildProject, FilesystemStep, FsPlacement, FsResolver, ResolvedImage, UploadFs};
pub use source::FilesystemSource;
