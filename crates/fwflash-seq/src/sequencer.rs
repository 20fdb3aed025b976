//! Flash sequencing
//!
//! A flash request turns into at most two external invocations, run one
//! after the other:
//!
//! 1. one `write_flash` covering bootloader, partition table and firmware
//! 2. optionally the filesystem: a second `write_flash` for an image, or the
//!    build tool's `uploadfs` target for a directory
//!
//! If step 1 fails, step 2 never runs. Nothing is retried.

use crate::runner::{CommandRunner, ProcessOutput};
use crate::sink::{OutputSink, Stage};
use crate::tools::{Invocation, ToolEnvironment};
use fwflash_core::fs_image::FilesystemStep;
use fwflash_core::{Error, FlashOffset, FlashPlan, Result};

/// What happened in the filesystem stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilesystemReport {
    /// Image written with the flashing utility
    Flashed {
        /// Where it was written
        offset: FlashOffset,
        /// Captured output
        output: String,
    },
    /// Uploaded by the build tool
    Uploaded {
        /// Captured output
        output: String,
    },
}

/// Outcome of a successful flash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashReport {
    /// Captured output of the combined firmware write
    pub firmware_output: String,
    /// Filesystem stage outcome, if one was requested
    pub filesystem: Option<FilesystemReport>,
}

/// Runs the write sequence against one serial port
#[derive(Debug, Clone)]
pub struct FlashSequencer<'a> {
    tools: &'a ToolEnvironment,
    port: &'a str,
    baud: u32,
}

impl<'a> FlashSequencer<'a> {
    /// Create a sequencer
    ///
    /// Fails with [`Error::MissingRequiredField`] for an empty port or a
    /// zero baud rate.
    pub fn new(tools: &'a ToolEnvironment, port: &'a str, baud: u32) -> Result<Self> {
        if port.trim().is_empty() {
            return Err(Error::MissingRequiredField("port"));
        }
        if baud == 0 {
            return Err(Error::MissingRequiredField("baud"));
        }
        Ok(Self { tools, port, baud })
    }

    /// The invocations [`run`](Self::run) would perform, in order
    pub fn invocations(
        &self,
        core: &FlashPlan,
        filesystem: Option<&FilesystemStep>,
    ) -> Vec<(Stage, Invocation)> {
        let mut invocations = vec![(Stage::Firmware, self.firmware_invocation(core))];
        if let Some(step) = filesystem {
            invocations.push((Stage::Filesystem, self.filesystem_invocation(step)));
        }
        invocations
    }

    /// Write `core` and then the filesystem step
    pub fn run(
        &self,
        core: &FlashPlan,
        filesystem: Option<&FilesystemStep>,
        runner: &mut dyn CommandRunner,
        sink: &mut dyn OutputSink,
    ) -> Result<FlashReport> {
        if core.is_empty() {
            return Err(Error::MissingRequiredField("firmware images"));
        }

        let firmware = self.firmware_invocation(core);
        let firmware_output = execute(Stage::Firmware, &firmware, runner, sink)
            .map_err(|output| Error::FirmwareWriteFailed { output })?;

        let Some(step) = filesystem else {
            return Ok(FlashReport {
                firmware_output,
                filesystem: None,
            });
        };

        let invocation = self.filesystem_invocation(step);
        let output = execute(Stage::Filesystem, &invocation, runner, sink)
            .map_err(|output| Error::FilesystemWriteFailed { output })?;

        let report = match step {
            FilesystemStep::Image(image) => FilesystemReport::Flashed {
                offset: image.region().offset,
                output,
            },
            FilesystemStep::Upload(_) => FilesystemReport::Uploaded { output },
        };

        Ok(FlashReport {
            firmware_output,
            filesystem: Some(report),
        })
    }

    fn firmware_invocation(&self, core: &FlashPlan) -> Invocation {
        self.tools.write_flash(self.port, self.baud, core)
    }

    fn filesystem_invocation(&self, step: &FilesystemStep) -> Invocation {
        match step {
            FilesystemStep::Image(image) => {
                let plan = FlashPlan::new().with(image.region().clone());
                self.tools.write_flash(self.port, self.baud, &plan)
            }
            FilesystemStep::Upload(upload) => self.tools.upload_fs(upload),
        }
    }
}

/// Run one stage; `Err` carries the text to report
fn execute(
    stage: Stage,
    invocation: &Invocation,
    runner: &mut dyn CommandRunner,
    sink: &mut dyn OutputSink,
) -> std::result::Result<String, String> {
    sink.stage_started(stage, invocation);
    let result = runner.run(invocation, &mut |line| sink.output_line(stage, line));

    match result {
        Ok(ProcessOutput {
            success: true,
            output,
            ..
        }) => {
            sink.stage_finished(stage, true);
            Ok(output)
        }
        Ok(ProcessOutput { code, output, .. }) => {
            sink.stage_finished(stage, false);
            log::debug!("{} stage exited with code {:?}", stage, code);
            if output.trim().is_empty() {
                let program = invocation.program.display();
                Err(match code {
                    Some(code) => format!("{} exited with code {}", program, code),
                    None => format!("{} was terminated by a signal", program),
                })
            } else {
                Err(output)
            }
        }
        Err(e) => {
            sink.stage_finished(stage, false);
            Err(format!(
                "failed to run {}: {}",
                invocation.program.display(),
                e
            ))
        }
    }
}
