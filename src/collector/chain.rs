// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::Scrape;
use crate::labels;
use crate::metrics::Metric;
use crate::rpc_client::{
    LotusError,
    types::{SyncState, TipSet},
};
use serde_json::json;

impl Scrape<'_> {
    /// Miner ID and chain head. Everything after this is labeled with the
    /// miner ID.
    pub(super) async fn chain_head(&mut self) -> Result<(), LotusError> {
        self.miner_id = self.nodes.miner.call("ActorAddress", json!([])).await?;
        let head: TipSet = self.nodes.daemon.call("ChainHead", json!([])).await?;
        tracing::debug!("miner {} at height {}", self.miner_id, head.height);

        self.height = head.height;
        self.tipset_key = head.cids;
        self.metrics.add(
            Metric::ChainHeight,
            self.height as f64,
            labels!("miner_id" => self.miner_id),
        );
        self.metrics.checkpoint("ChainHead");
        Ok(())
    }

    pub(super) async fn chain_sync(&mut self) -> Result<(), LotusError> {
        let state: SyncState = self.nodes.daemon.call("SyncState", json!([])).await?;
        for (worker_id, sync) in state.active_syncs.iter().enumerate() {
            let diff = match (&sync.target, &sync.base) {
                (Some(target), Some(base)) => target.height - base.height,
                _ => 0,
            };
            let labels = labels!("miner_id" => self.miner_id, "worker_id" => worker_id);
            self.metrics
                .add(Metric::ChainSyncDiff, diff as f64, labels.clone());
            self.metrics
                .add(Metric::ChainSyncStatus, sync.stage as f64, labels);
        }
        self.metrics.checkpoint("ChainSync");
        Ok(())
    }
}
