//! Flash command implementation

use crate::cli::FlashArgs;
use crate::config::Config;
use fwflash_core::offset::FlashOffset;
use fwflash_core::FailureClass;
use fwflash_seq::{
    provision, DryRunRunner, FilesystemReport, Invocation, LogSink, OutputSink, Provisioner,
    Stage, SystemRunner,
};
use indicatif::{ProgressBar, ProgressStyle};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::IsTerminal;
use std::time::Duration;

/// Create a standard spinner style
fn create_spinner_style() -> Result<ProgressStyle, Box<dyn std::error::Error>> {
    Ok(ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {prefix:.bold} {wide_msg}")?)
}

/// Output sink showing one spinner per stage
///
/// The latest tool output line is shown next to the spinner; all lines are
/// also logged at debug level.
pub struct IndicatifSink {
    current_bar: Option<ProgressBar>,
}

impl IndicatifSink {
    pub fn new() -> Self {
        Self { current_bar: None }
    }

    fn finish(&mut self, message: &str) {
        if let Some(pb) = self.current_bar.take() {
            pb.finish_with_message(message.to_string());
        }
    }
}

impl Default for IndicatifSink {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink for IndicatifSink {
    fn stage_started(&mut self, stage: Stage, invocation: &Invocation) {
        self.finish("");
        log::debug!("Running: {}", invocation);

        let pb = ProgressBar::new_spinner();
        pb.set_style(create_spinner_style().unwrap_or_else(|_| ProgressStyle::default_spinner()));
        pb.set_prefix(match stage {
            Stage::Firmware => "Firmware",
            Stage::Filesystem => "Filesystem",
        });
        pb.set_message("starting...");
        pb.enable_steady_tick(Duration::from_millis(100));
        self.current_bar = Some(pb);
    }

    fn output_line(&mut self, stage: Stage, line: &str) {
        log::debug!("[{}] {}", stage, line);
        if let Some(pb) = &self.current_bar {
            pb.set_message(line.to_string());
        }
    }

    fn stage_finished(&mut self, _stage: Stage, success: bool) {
        self.finish(if success { "done" } else { "FAILED" });
    }
}

/// Ask for the filesystem offset after the partition table lookup failed
///
/// Only prompts on an interactive terminal. Returns `None` if there is no
/// terminal or the user gives up.
fn prompt_for_fs_offset() -> Result<Option<String>, Box<dyn std::error::Error>> {
    if !std::io::stdin().is_terminal() {
        return Ok(None);
    }

    println!("No spiffs/littlefs partition found, please enter the filesystem offset.");
    let mut rl = DefaultEditor::new()?;
    loop {
        match rl.readline("Filesystem offset (hex, e.g. 0x290000): ") {
            Ok(line) => {
                let input = line.trim();
                if FlashOffset::parse_hex(input).is_some() {
                    return Ok(Some(input.to_string()));
                }
                eprintln!("Invalid offset {:?}, expected 0x-prefixed hex", input);
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Ok(None),
            Err(e) => return Err(e.into()),
        }
    }
}

/// Flash a device
pub fn cmd_flash(
    config: &Config,
    args: &FlashArgs,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let tools = config.tool_environment(args);
    let mut request = config.flash_request(args);

    if dry_run {
        let mut runner = DryRunRunner::new();
        provision(&tools, &request, &mut runner, &mut LogSink)?;
        println!("Dry run, nothing was flashed. Would run:");
        for invocation in &runner.invocations {
            println!("  {}", invocation);
        }
        return Ok(());
    }

    // Nothing has been written yet if the lookup fails, so retry with the
    // offset the user typed in
    let provisioner = Provisioner::new();
    let prepared = match provisioner.prepare(&request) {
        Err(e) if e.class() == FailureClass::PartitionLookup => {
            let Some(offset) = prompt_for_fs_offset()? else {
                log::warn!("No filesystem offset known; pass --fs-offset");
                return Err(e.into());
            };
            request.fs_offset = Some(offset);
            provisioner.prepare(&request)?
        }
        other => other?,
    };

    println!(
        "Flashing {} at {} baud",
        request.port,
        request.baud.unwrap_or_default()
    );
    let mut sink = IndicatifSink::new();
    let report = prepared.execute(&tools, &mut SystemRunner, &mut sink)?;

    println!("Bootloader, partition table and firmware written.");
    match report.filesystem {
        Some(FilesystemReport::Flashed { offset, .. }) => {
            println!("Filesystem image written at {}.", offset)
        }
        Some(FilesystemReport::Uploaded { .. }) => {
            println!("Filesystem uploaded by the build tool.")
        }
        None => {}
    }
    println!("Flash complete.");

    Ok(())
}
