//! Whole flash requests
//!
//! [`provision`] is what a front end calls: it checks the request, looks up
//! the filesystem partition if needed, resolves the filesystem source and
//! runs the sequence. Everything a request creates (including the archive
//! extraction directory) is dropped when it returns, whichever way it
//! returns.

use crate::runner::CommandRunner;
use crate::sequencer::{FlashReport, FlashSequencer};
use crate::sink::{OutputSink, Stage};
use crate::tools::{Invocation, ToolEnvironment};
use fwflash_core::fs_image::{
    BuildProject, FilesystemSource, FilesystemStep, FsPlacement, FsResolver,
};
use fwflash_core::partition::locate_filesystem_partition;
use fwflash_core::{Error, FlashPlan, FlashRegion, Result};
use std::path::PathBuf;

/// Everything needed to flash one device
#[derive(Debug, Clone)]
pub struct FlashRequest {
    /// Serial port of the device
    pub port: String,
    /// Baud rate; `None` if the user gave none
    pub baud: Option<u32>,
    /// Second-stage bootloader image
    pub bootloader: FlashRegion,
    /// Partition table image
    pub partition_table: FlashRegion,
    /// Application image
    pub firmware: FlashRegion,
    /// Filesystem source path; empty for no filesystem step
    pub fs_source: String,
    /// Filesystem offset typed in by the user (`0x` hex)
    pub fs_offset: Option<String>,
    /// Partition table CSV to find the filesystem offset in
    pub partitions_csv: Option<PathBuf>,
    /// Build project, for directory filesystem sources
    pub project: Option<BuildProject>,
}

impl FlashRequest {
    /// Create a request without a filesystem step
    pub fn new(
        port: impl Into<String>,
        baud: Option<u32>,
        bootloader: FlashRegion,
        partition_table: FlashRegion,
        firmware: FlashRegion,
    ) -> Self {
        Self {
            port: port.into(),
            baud,
            bootloader,
            partition_table,
            firmware,
            fs_source: String::new(),
            fs_offset: None,
            partitions_csv: None,
            project: None,
        }
    }

    /// Check that all required fields are present
    pub fn validate(&self) -> Result<()> {
        if self.port.trim().is_empty() {
            return Err(Error::MissingRequiredField("port"));
        }
        if self.baud.unwrap_or(0) == 0 {
            return Err(Error::MissingRequiredField("baud"));
        }
        for (name, region) in [
            ("bootloader", &self.bootloader),
            ("partition table", &self.partition_table),
            ("firmware", &self.firmware),
        ] {
            if region.image().is_none() {
                return Err(Error::MissingRequiredField(name));
            }
        }
        Ok(())
    }

    /// The combined bootloader/partition-table/firmware plan
    pub fn core_plan(&self) -> FlashPlan {
        FlashPlan::new()
            .with(self.bootloader.clone())
            .with(self.partition_table.clone())
            .with(self.firmware.clone())
    }

    /// Where a filesystem image would go
    ///
    /// A manually given offset wins over the partition table; the subtype
    /// is only known from the partition table. Without a manual offset, a
    /// partition table that has no filesystem partition (or cannot be read)
    /// is [`Error::PartitionNotFound`], so the caller can ask for the offset.
    pub fn placement(&self) -> Result<FsPlacement> {
        let mut placement = FsPlacement {
            offset: self.fs_offset.clone().filter(|o| !o.trim().is_empty()),
            subtype: None,
        };

        let Some(csv) = &self.partitions_csv else {
            return Ok(placement);
        };
        match locate_filesystem_partition(csv) {
            Ok(found) => {
                placement.subtype = Some(found.subtype);
                if placement.offset.is_none() {
                    placement.offset = Some(found.offset.to_string());
                }
            }
            Err(e) if placement.offset.is_none() => return Err(e),
            Err(_) => {}
        }

        Ok(placement)
    }
}

/// A validated request with its filesystem step resolved
///
/// Holds the archive extraction directory, if any, until dropped.
#[derive(Debug)]
pub struct PreparedFlash {
    port: String,
    baud: u32,
    core: FlashPlan,
    filesystem: Option<FilesystemStep>,
}

impl PreparedFlash {
    /// The resolved filesystem step
    pub fn filesystem(&self) -> Option<&FilesystemStep> {
        self.filesystem.as_ref()
    }

    /// The combined firmware plan
    pub fn core_plan(&self) -> &FlashPlan {
        &self.core
    }

    /// Commands that [`execute`](Self::execute) would run
    pub fn invocations(&self, tools: &ToolEnvironment) -> Result<Vec<(Stage, Invocation)>> {
        let seq = FlashSequencer::new(tools, &self.port, self.baud)?;
        Ok(seq.invocations(&self.core, self.filesystem.as_ref()))
    }

    /// Run the write sequence
    pub fn execute(
        &self,
        tools: &ToolEnvironment,
        runner: &mut dyn CommandRunner,
        sink: &mut dyn OutputSink,
    ) -> Result<FlashReport> {
        let seq = FlashSequencer::new(tools, &self.port, self.baud)?;
        seq.run(&self.core, self.filesystem.as_ref(), runner, sink)
    }
}

/// Prepares and runs flash requests
#[derive(Debug, Clone, Default)]
pub struct Provisioner {
    scratch_root: Option<PathBuf>,
}

impl Provisioner {
    /// Create a provisioner using the system temp directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract archives below `root`
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    /// Validate `request` and resolve its filesystem source
    ///
    /// No external process is started here.
    pub fn prepare(&self, request: &FlashRequest) -> Result<PreparedFlash> {
        request.validate()?;

        let filesystem = match FilesystemSource::classify(&request.fs_source) {
            None => None,
            Some(source) => {
                let placement = match source {
                    FilesystemSource::Archive(_) | FilesystemSource::RawImage(_) => {
                        request.placement()?
                    }
                    FilesystemSource::Directory(_) | FilesystemSource::Invalid(_) => {
                        FsPlacement::default()
                    }
                };
                let mut resolver = FsResolver::new().with_project(request.project.clone());
                if let Some(root) = &self.scratch_root {
                    resolver = resolver.with_scratch_root(root);
                }
                Some(resolver.resolve(&source, &placement)?)
            }
        };

        Ok(PreparedFlash {
            port: request.port.trim().to_string(),
            baud: request.baud.unwrap_or_default(),
            core: request.core_plan(),
            filesystem,
        })
    }

    /// Prepare and run `request`
    pub fn run(
        &self,
        tools: &ToolEnvironment,
        request: &FlashRequest,
        runner: &mut dyn CommandRunner,
        sink: &mut dyn OutputSink,
    ) -> Result<FlashReport> {
        let prepared = self.prepare(request)?;
        prepared.execute(tools, runner, sink)
    }
}

/// Flash a device
///
/// Runs at most two external commands through `runner`, forwarding their
/// output to `sink`. See [`FlashSequencer`] for the failure policy.
pub fn provision(
    tools: &ToolEnvironment,
    request: &FlashRequest,
    runner: &mut dyn CommandRunner,
    sink: &mut dyn OutputSink,
) -> Result<FlashReport> {
    Provisioner::new().run(tools, request, runner, sink)
}

/// The commands [`provision`] would run for `request`, without running them
///
/// Archive sources are still extracted to find the image name; the
/// extraction directory is gone again when this returns.
pub fn plan_invocations(
    tools: &ToolEnvironment,
    request: &FlashRequest,
) -> Result<Vec<(Stage, Invocation)>> {
    Provisioner::new().prepare(request)?.invocations(tools)
}
