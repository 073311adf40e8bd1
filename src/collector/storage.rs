// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::Scrape;
use crate::labels;
use crate::metrics::Metric;
use crate::rpc_client::{
    LotusError, Request,
    types::{StorageInfo, StorageStat},
};
use crate::utils::net::HostNames;
use ahash::HashMap;
use serde_json::{Value, json};
use url::Url;

impl Scrape<'_> {
    /// Storage paths attached to the miner and its workers.
    pub(super) async fn storage(&mut self) -> Result<(), LotusError> {
        let miner = &self.nodes.miner;
        let mut ids = miner
            .call::<Option<HashMap<String, Value>>>("StorageList", json!([]))
            .await?
            .unwrap_or_default()
            .into_keys()
            .collect::<Vec<_>>();
        ids.sort();
        let local_paths = miner
            .call::<Option<HashMap<String, String>>>("StorageLocal", json!([]))
            .await?
            .unwrap_or_default();

        let infos = miner
            .call_many::<StorageInfo>(
                &ids.iter()
                    .map(|id| Request::new("StorageInfo", json!([id])))
                    .collect::<Vec<_>>(),
            )
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;
        // a path on a worker that is down has no stat
        let stats = miner
            .call_many::<StorageStat>(
                &ids.iter()
                    .map(|id| Request::new("StorageStat", json!([id])))
                    .collect::<Vec<_>>(),
            )
            .await;

        let mut host_names = HostNames::from_system_conf();
        for ((id, info), stat) in ids.iter().zip(infos).zip(stats) {
            let stat = stat.unwrap_or_else(|e| {
                tracing::debug!("couldn't get stat of storage {id}: {e}");
                StorageStat::default()
            });
            let url = info.urls.first().cloned().unwrap_or_default();
            let (host, port) = match Url::parse(&url) {
                Ok(it) => (
                    it.host_str().unwrap_or_default().to_string(),
                    it.port_or_known_default()
                        .map(|port| port.to_string())
                        .unwrap_or_default(),
                ),
                Err(_) => (String::new(), String::new()),
            };
            let host_name = host_names.lookup(&host).await;
            self.metrics.add(
                Metric::MinerStorageInfo,
                1.0,
                labels!(
                    "miner_id" => self.miner_id,
                    "storage_id" => info.id,
                    "storage_url" => url,
                    "storage_host" => host,
                    "storage_host_name" => host_name,
                    "storage_port" => port,
                    "weight" => info.weight,
                    "can_seal" => info.can_seal,
                    "can_store" => info.can_store,
                    "path" => local_paths.get(id).map(String::as_str).unwrap_or_default(),
                ),
            );
            let labels = labels!("miner_id" => self.miner_id, "storage_id" => info.id);
            self.metrics
                .add(Metric::MinerStorageCapacity, stat.capacity as f64, labels.clone());
            self.metrics
                .add(Metric::MinerStorageAvailable, stat.available as f64, labels.clone());
            self.metrics
                .add(Metric::MinerStorageReserved, stat.reserved as f64, labels);
        }
        self.metrics.checkpoint("Storage");
        Ok(())
    }
}
