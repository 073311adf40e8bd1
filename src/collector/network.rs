// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::Scrape;
use crate::labels;
use crate::metrics::Metric;
use crate::rpc_client::{Lotus, LotusError, types::BandwidthStats};
use ahash::HashMap;
use serde_json::{Value, json};

impl Scrape<'_> {
    pub(super) async fn net_peers(&mut self) -> Result<(), LotusError> {
        for node in [&self.nodes.daemon, &self.nodes.miner] {
            let peers = node
                .call::<Option<Vec<Value>>>("NetPeers", json!([]))
                .await?
                .unwrap_or_default();
            self.metrics.add(
                Metric::NetpeersTotal,
                peers.len() as f64,
                labels!("miner_id" => self.miner_id, "service" => node.target()),
            );
        }
        self.metrics.checkpoint("NetPeers");
        Ok(())
    }

    /// Totals and rates, overall and per protocol, of the daemon and the
    /// miner.
    pub(super) async fn net_bandwidth(&mut self) -> Result<(), LotusError> {
        let nodes: [&Lotus; 2] = [&self.nodes.daemon, &self.nodes.miner];
        for node in nodes {
            let service = node.target();
            let by_protocol = node
                .call::<Option<HashMap<String, BandwidthStats>>>(
                    "NetBandwidthStatsByProtocol",
                    json!([]),
                )
                .await?
                .unwrap_or_default();
            let mut protocols = by_protocol.into_iter().collect::<Vec<_>>();
            protocols.sort_by(|a, b| a.0.cmp(&b.0));
            for (protocol, stats) in protocols {
                let labels = labels!(
                    "miner_id" => self.miner_id,
                    "service" => service,
                    "protocol" => protocol,
                );
                self.metrics
                    .add(Metric::NetProtocolIn, stats.total_in as f64, labels.clone());
                self.metrics
                    .add(Metric::NetProtocolOut, stats.total_out as f64, labels);
            }

            let total: BandwidthStats = node.call("NetBandwidthStats", json!([])).await?;
            let labels = labels!("miner_id" => self.miner_id, "service" => service);
            self.metrics
                .add(Metric::NetTotalIn, total.total_in as f64, labels.clone());
            self.metrics
                .add(Metric::NetTotalOut, total.total_out as f64, labels.clone());
            self.metrics
                .add(Metric::NetRateIn, total.rate_in, labels.clone());
            self.metrics.add(Metric::NetRateOut, total.rate_out, labels);
        }
        self.metrics.checkpoint("NetBandwidth");
        Ok(())
    }
}
