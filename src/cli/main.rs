// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::Cli;
use crate::cli_shared::{config::RepoPaths, logger, read_config};
use crate::collector::{Nodes, collect};
use crate::metrics::Metrics;
use crate::rpc_client::{ErrorKind, LotusError, Target};
use anyhow::Context as _;
use clap::Parser;
use std::ffi::OsString;
use std::path::Path;
use std::process::ExitCode;
use tracing::{error, info};

pub fn main<ArgT>(args: impl IntoIterator<Item = ArgT>) -> ExitCode
where
    ArgT: Into<OsString> + Clone,
{
    // Capture Cli inputs
    let cli = Cli::parse_from(args);
    logger::setup_logger(cli.level());

    let result = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("couldn't start the async runtime")
        .and_then(|runtime| runtime.block_on(run(&cli.config_folder)));

    let (metrics, code) = match result {
        Ok(metrics) => (metrics, ExitCode::SUCCESS),
        Err(e) => {
            match cli.debug {
                true => error!("scrape failed: {e:?}"),
                false => error!("scrape failed: {e:#}"),
            }
            if let Some(lotus) = e.downcast_ref::<LotusError>() {
                error!(
                    "{} error calling {} on the {}, {}",
                    lotus.kind(),
                    lotus.method(),
                    lotus.target(),
                    hint(lotus.kind())
                );
            }
            (Metrics::failure(failure_indicator(&e)), ExitCode::FAILURE)
        }
    };
    match metrics.encode().and_then(|text| cli.file.write(&text)) {
        Ok(()) => code,
        Err(e) => {
            error!("couldn't write metrics to {}: {e:#}", cli.file);
            ExitCode::FAILURE
        }
    }
}

async fn run(config_folder: &Path) -> anyhow::Result<Metrics> {
    let (config, addresses) = read_config(config_folder)?;
    let endpoints = config.endpoints(&RepoPaths::from_env())?;
    info!(
        "scraping miner at {}, daemon at {}",
        endpoints.miner, endpoints.daemon
    );
    if let Some(markets) = &endpoints.markets {
        info!("scraping markets at {markets}");
    }
    let nodes = Nodes::new(endpoints);
    collect(&nodes, config.collectors, addresses.aliases).await
}

/// Value of `scrape_execution_succeed` for a failed run: which node let it
/// down, or `0` when it never got to talk to one.
pub fn failure_indicator(e: &anyhow::Error) -> i8 {
    match e.downcast_ref::<LotusError>().map(LotusError::target) {
        Some(Target::Daemon) => -1,
        Some(Target::Miner) => -2,
        Some(Target::Markets) => -3,
        None => 0,
    }
}

fn hint(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Transport => "check that the node is running and its API address",
        ErrorKind::Protocol => "check the API token and the node version",
        ErrorKind::Semantic => "the node version may not be supported",
    }
}
