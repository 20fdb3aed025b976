//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

#[derive(Parser)]
#[command(name = "fwflash")]
#[command(
    author,
    version,
    about = "Flash bootloader, partition table, firmware and filesystem to ESP32 boards",
    long_about = None
)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (TOML format)
    /// Defaults to ./fwflash.toml if it exists
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options describing one flash request
///
/// Anything left out is taken from the config file.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct FlashArgs {
    /// Serial port of the device
    #[arg(short, long)]
    pub port: Option<String>,

    /// Baud rate
    #[arg(short, long)]
    pub baud: Option<u32>,

    /// Bootloader image
    #[arg(long)]
    pub bootloader: Option<PathBuf>,

    /// Partition table image
    #[arg(long)]
    pub partition_table: Option<PathBuf>,

    /// Application firmware image
    #[arg(long)]
    pub firmware: Option<PathBuf>,

    /// Bootloader offset (hex or decimal)
    #[arg(long, value_parser = parse_hex_u32, default_value = "0x1000")]
    pub bootloader_offset: u32,

    /// Partition table offset (hex or decimal)
    #[arg(long, value_parser = parse_hex_u32, default_value = "0x8000")]
    pub partition_table_offset: u32,

    /// Firmware offset (hex or decimal)
    #[arg(long, value_parser = parse_hex_u32, default_value = "0x10000")]
    pub firmware_offset: u32,

    /// Partition table CSV used to find the filesystem offset
    #[arg(long)]
    pub partitions: Option<PathBuf>,

    /// Filesystem source: a data directory, a .zip holding an image, or a .bin image
    #[arg(long = "fs")]
    pub fs: Option<String>,

    /// Filesystem offset (hex, e.g., 0x290000); overrides the partition table
    #[arg(long)]
    pub fs_offset: Option<String>,

    /// Build project root
    #[arg(long)]
    pub project_dir: Option<PathBuf>,

    /// Build environment name
    #[arg(long)]
    pub env: Option<String>,

    /// Python interpreter that runs the flashing utility
    #[arg(long)]
    pub python: Option<PathBuf>,

    /// Build tool executable
    #[arg(long)]
    pub build_tool: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Flash firmware and, optionally, a filesystem
    Flash {
        #[command(flatten)]
        args: FlashArgs,

        /// Print the commands instead of running them
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the commands a flash would run
    Plan {
        #[command(flatten)]
        args: FlashArgs,
    },

    /// Show a partition table and its filesystem partition
    Partitions {
        /// Partition table CSV
        file: PathBuf,
    },
}
