//! Output sinks
//!
//! Flashing takes a while, so tool output is passed on line by line while
//! the tool is still running. The CLI renders it under a spinner; library
//! users can just log it.

use crate::tools::Invocation;
use std::fmt;

/// Which write a line of output belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Combined bootloader, partition table and firmware write
    Firmware,
    /// Filesystem image write or build tool upload
    Filesystem,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Firmware => f.write_str("firmware"),
            Self::Filesystem => f.write_str("filesystem"),
        }
    }
}

/// Receives progress from the sequencer
pub trait OutputSink {
    /// A stage is about to run `invocation`
    fn stage_started(&mut self, _stage: Stage, _invocation: &Invocation) {}

    /// One line of tool output
    fn output_line(&mut self, stage: Stage, line: &str);

    /// A stage has finished
    fn stage_finished(&mut self, _stage: Stage, _success: bool) {}
}

/// Sink that forwards everything to the `log` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl OutputSink for LogSink {
    fn stage_started(&mut self, stage: Stage, invocation: &Invocation) {
        log::info!("Starting {} write: {}", stage, invocation);
    }

    fn output_line(&mut self, stage: Stage, line: &str) {
        log::debug!("[{}] {}", stage, line);
    }

    fn stage_finished(&mut self, stage: Stage, success: bool) {
        if success {
            log::info!("{} write complete", stage);
        } else {
            log::error!("{} write failed", stage);
        }
    }
}
