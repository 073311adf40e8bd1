// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! The collection pipeline.
//!
//! A run is a strict sequence of phases, each finishing (including its
//! concurrent batches) before the next starts, since later phases read what
//! earlier ones found: the miner ID, the chain head, the sector size, the
//! local wallets. A failed required call ends the run with that call's
//! [`LotusError`](crate::rpc_client::LotusError); best-effort enrichment
//! degrades to sentinel labels instead.

mod chain;
mod market;
mod miner;
mod mpool;
mod network;
mod sectors;
mod storage;
mod workers;

use crate::actors::ActorRegistry;
use crate::address::AddressResolver;
use crate::cli_shared::config::{Collectors, Endpoints};
use crate::metrics::Metrics;
use crate::rpc_client::{Lotus, Target, types::ChainEpoch};
use ahash::HashMap;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Label value of anything best-effort that couldn't be looked up.
const UNKNOWN: &str = "unknown";

/// Handles on the three APIs a run talks to.
#[derive(Debug, Clone)]
pub struct Nodes {
    pub miner: Lotus,
    pub daemon: Lotus,
    /// The miner itself when there is no separate markets node.
    pub markets: Lotus,
}

impl Nodes {
    pub fn new(endpoints: Endpoints) -> Self {
        let miner = Lotus::new(Target::Miner, endpoints.miner);
        let markets = match endpoints.markets {
            Some(info) => Lotus::new(Target::Markets, info),
            None => miner.clone(),
        };
        Nodes {
            miner,
            daemon: Lotus::new(Target::Daemon, endpoints.daemon),
            markets,
        }
    }
}

/// State of one run, threaded through the phases.
struct Scrape<'a> {
    nodes: &'a Nodes,
    actors: &'a ActorRegistry,
    addresses: AddressResolver<'a>,
    metrics: Metrics,
    started_at: DateTime<Utc>,
    miner_id: String,
    height: ChainEpoch,
    tipset_key: Vec<Value>,
    sector_size: u64,
    wallets: Vec<String>,
    /// Worker ID to hostname.
    workers: HashMap<String, String>,
}

/// Runs every phase against `nodes` and returns the samples of a
/// successful run.
pub async fn collect(
    nodes: &Nodes,
    collectors: Collectors,
    aliases: impl IntoIterator<Item = (String, String)>,
) -> anyhow::Result<Metrics> {
    let actors = ActorRegistry::load(&nodes.daemon)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("couldn't load the actor code table: {e}");
            ActorRegistry::default()
        });
    if actors.is_empty() {
        tracing::warn!("no actor codes known, only legacy codes will be recognized");
    }

    let mut scrape = Scrape {
        nodes,
        actors: &actors,
        addresses: AddressResolver::new(&nodes.daemon, &actors).with_aliases(aliases),
        metrics: Metrics::new(),
        started_at: Utc::now(),
        miner_id: String::new(),
        height: 0,
        tipset_key: vec![],
        sector_size: 0,
        wallets: vec![],
        workers: HashMap::default(),
    };

    scrape.chain_head().await?;
    scrape.chain_sync().await?;
    scrape.miner_info().await?;
    scrape.daemon_info().await?;
    scrape.wallets().await?;
    scrape.power().await?;
    if collectors.mpool {
        scrape.mpool().await?;
    }
    scrape.net_peers().await?;
    scrape.net_bandwidth().await?;
    scrape.workers().await?;
    scrape.jobs().await?;
    scrape.sched_diag().await?;
    if collectors.sectors {
        scrape.sectors().await?;
    }
    if collectors.deadlines {
        scrape.deadlines().await?;
    }
    if collectors.storage {
        scrape.storage().await?;
    }
    if collectors.market {
        scrape.market().await?;
    }

    let resolved = scrape.addresses.len();
    let mut metrics = scrape.metrics;
    metrics.succeed();
    tracing::debug!(
        "collected {} samples, {resolved} address forms resolved",
        metrics.len()
    );
    Ok(metrics)
}
