//! Flash sequencing over external tools
//!
//! This crate turns a [`FlashRequest`] into runs of the external flashing
//! utility and build tool. The CLI should only need [`provision`] (or
//! [`plan_invocations`] for a dry run) plus a [`CommandRunner`] and an
//! [`OutputSink`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        CLI (bin/fwflash)                     │
//! │  - flags + config file -> FlashRequest, ToolEnvironment      │
//! │  - progress spinners (OutputSink)                            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     fwflash-seq (this crate)                 │
//! │  - Provisioner: validate, locate, resolve, run               │
//! │  - FlashSequencer: firmware write, then filesystem           │
//! │  - CommandRunner: SystemRunner / DryRunRunner                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     fwflash-core                             │
//! │  - partition table CSV, filesystem image resolution          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use fwflash_core::FlashRegion;
//! use fwflash_seq::{provision, FlashRequest, LogSink, SystemRunner, ToolEnvironment};
//!
//! let mut request = FlashRequest::new(
//!     "/dev/ttyUSB0",
//!     Some(921600),
//!     FlashRegion::new(0x1000, "bootloader.bin"),
//!     FlashRegion::new(0x8000, "partitions.bin"),
//!     FlashRegion::new(0x10000, "firmware.bin"),
//! );
//! request.fs_source = "littlefs.bin".into();
//! request.partitions_csv = Some("partitions.csv".into());
//!
//! let report = provision(&ToolEnvironment::default(), &request, &mut SystemRunner, &mut LogSink)?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod provision;
pub mod runner;
pub mod sequencer;
pub mod sink;
pub mod tools;

#[cfg(test)]
mod testing;

pub use provision::{plan_invocations, provision, FlashRequest, PreparedFlash, Provisioner};
pub use runner::{CommandRunner, DryRunRunner, ProcessOutput, SystemRunner};
pub use sequencer::{FilesystemReport, FlashReport, FlashSequencer};
pub use sink::{LogSink, OutputSink, Stage};
pub use tools::{Invocation, ToolEnvironment, DEFAULT_PROJECT_ROOT_VAR};
