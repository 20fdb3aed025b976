//! fwflash - Provision ESP32-style boards from the command line
//!
//! Writes the bootloader, partition table and application firmware in one
//! pass of the flashing utility, then optionally the filesystem partition:
//! a prebuilt image (raw `.bin` or inside a `.zip`) is written at the
//! offset read from the partition table, a data directory is handed to the
//! build tool's `uploadfs` target.
//!
//! # Architecture
//!
//! The CLI only turns flags and the config file into a `FlashRequest` and a
//! `ToolEnvironment`. Partition tables and filesystem sources are handled
//! by `fwflash-core`, running the external tools by `fwflash-seq`.

mod cli;
mod commands;
mod config;

use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use env_logger::Env;

/// Default log filter for a `-v` count; `RUST_LOG` still overrides it
fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn logger_builder(env: Env<'_>, verbose: u8) -> env_logger::Builder {
    env_logger::Builder::from_env(env.default_filter_or(log_filter(verbose)))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logger at the requested verbosity
    logger_builder(Env::default(), cli.verbose).init();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Flash { args, dry_run } => commands::flash::cmd_flash(&config, &args, dry_run),
        Commands::Plan { args } => commands::plan::cmd_plan(&config, &args),
        Commands::Partitions { file } => commands::partitions::cmd_partitions(&file),
    }
}
