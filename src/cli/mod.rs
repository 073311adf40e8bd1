// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub mod main;

use crate::cli_shared::config::default_config_folder;
use crate::utils::io::Output;
use clap::Parser;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

/// Scrapes a Lotus miner, its daemon and markets node once, and prints the
/// result in the Prometheus text format.
#[derive(Debug, Parser)]
#[command(name = env!("CARGO_PKG_NAME"), author = env!("CARGO_PKG_AUTHORS"), version = env!("CARGO_PKG_VERSION"), about = env!("CARGO_PKG_DESCRIPTION"))]
pub struct Cli {
    /// Log at debug level and print the full error chain on failure
    #[arg(long)]
    pub debug: bool,
    /// Log level, overridden by `RUST_LOG`
    #[arg(long, env = "FARCASTER_LOG_LEVEL", default_value = "info")]
    pub log_level: LevelFilter,
    /// Folder holding `config.toml` and `addresses.toml`
    #[arg(short = 'c', long = "farcaster-config-folder", default_value_os_t = default_config_folder())]
    pub config_folder: PathBuf,
    /// Where to write the metrics, `-` for stdout
    #[arg(long, default_value = "-")]
    pub file: Output,
}

impl Cli {
    pub fn level(&self) -> LevelFilter {
        match self.debug {
            true => self.log_level.max(LevelFilter::DEBUG),
            false => self.log_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("lotus-farcaster").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let cli = parse(&[]);
        assert!(!cli.debug);
        assert_eq!(cli.file, Output::Stdout);
        assert_eq!(cli.config_folder, default_config_folder());
    }

    #[test]
    fn debug_raises_the_level() {
        assert_eq!(parse(&["--log-level", "warn", "--debug"]).level(), LevelFilter::DEBUG);
        assert_eq!(parse(&["--log-level", "trace", "--debug"]).level(), LevelFilter::TRACE);
        assert_eq!(parse(&["--log-level", "error"]).level(), LevelFilter::ERROR);
    }

    #[test]
    fn output_file() {
        let cli = parse(&["--file", "/var/lib/node-exporter/farcaster.prom", "-c", "/etc/farcaster"]);
        assert_eq!(
            cli.file,
            Output::File("/var/lib/node-exporter/farcaster.prom".into())
        );
        assert_eq!(cli.config_folder, PathBuf::from("/etc/farcaster"));
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory as _;
        Cli::command().debug_assert();
    }
}
