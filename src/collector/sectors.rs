// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::Scrape;
use crate::deadlines;
use crate::labels;
use crate::metrics::Metric;
use crate::power::qa_power;
use crate::rpc_client::{
    LotusError, Request,
    types::{SectorNumber, SectorOnChainInfo, SectorStatus},
};
use num_traits::ToPrimitive as _;
use serde_json::json;
use std::collections::BTreeSet;

/// First event of a committed capacity sector.
const START_CC_EVENT: &str = "event;sealing.SectorStartCC";
const SECTOR_EVENTS: [(&str, &str); 2] = [
    ("event;sealing.SectorPacked", "packed"),
    ("event;sealing.SectorFinalized", "finalized"),
];

impl Scrape<'_> {
    /// State, deals and lifecycle dates of every sector, plus the quality
    /// adjusted power of the ones already on chain.
    pub(super) async fn sectors(&mut self) -> Result<(), LotusError> {
        // SectorsList has been known to repeat sectors
        let sectors = self
            .nodes
            .miner
            .call::<Option<Vec<SectorNumber>>>("SectorsList", json!([]))
            .await?
            .unwrap_or_default()
            .into_iter()
            .collect::<BTreeSet<_>>();

        let requests = sectors
            .iter()
            .map(|sector| Request::new("SectorsStatus", json!([sector, false])))
            .collect::<Vec<_>>();
        let statuses = self
            .nodes
            .miner
            .call_many::<SectorStatus>(&requests)
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;

        let requests = sectors
            .iter()
            .map(|sector| Request::new("StateSectorGetInfo", json!([self.miner_id, sector, []])))
            .collect::<Vec<_>>();
        let on_chain = self
            .nodes
            .daemon
            .call_many::<Option<SectorOnChainInfo>>(&requests)
            .await;

        for ((sector, status), on_chain) in sectors.iter().zip(statuses).zip(on_chain) {
            let deals = status.deals.iter().filter(|deal| **deal != 0).count();
            let pledged = status
                .log
                .first()
                .is_some_and(|log| log.kind == START_CC_EVENT);
            self.metrics.add(
                Metric::MinerSectorState,
                1.0,
                labels!(
                    "miner_id" => self.miner_id,
                    "sector_id" => sector,
                    "state" => status.state,
                    "pledged" => u8::from(pledged),
                    "deals" => deals,
                ),
            );

            if let Some(created) = status.log.first() {
                self.sector_event(*sector, "creation", created.timestamp);
            }
            for (kind, event_type) in SECTOR_EVENTS {
                // the latest one wins, as sectors can go through a state twice
                if let Some(log) = status.log.iter().rev().find(|log| log.kind == kind) {
                    self.sector_event(*sector, event_type, log.timestamp);
                }
            }

            match on_chain {
                Ok(Some(info)) => {
                    let power = qa_power(
                        self.sector_size,
                        info.expiration - info.activation,
                        &info.deal_weight.0,
                        &info.verified_deal_weight.0,
                    );
                    self.metrics.add(
                        Metric::MinerSectorQaPower,
                        power.to_f64().unwrap_or(f64::NAN),
                        labels!("miner_id" => self.miner_id, "sector_id" => sector),
                    );
                }
                // not on chain yet
                Ok(None) => {}
                Err(e) => tracing::debug!("couldn't get on chain info of sector {sector}: {e}"),
            }
        }
        self.metrics.checkpoint("Sectors");
        Ok(())
    }

    fn sector_event(&mut self, sector: SectorNumber, event_type: &str, timestamp: i64) {
        self.metrics.add(
            Metric::MinerSectorEvent,
            timestamp as f64,
            labels!(
                "miner_id" => self.miner_id,
                "sector_id" => sector,
                "event_type" => event_type,
            ),
        );
    }

    pub(super) async fn deadlines(&mut self) -> Result<(), LotusError> {
        let info = deadlines::aggregate(&self.nodes.daemon, &self.miner_id).await?;
        self.metrics.add(
            Metric::MinerDeadlineInfo,
            1.0,
            labels!(
                "miner_id" => self.miner_id,
                "current_idx" => info.current_index,
                "current_epoch" => info.current_epoch,
                "current_open_epoch" => info.open,
                "wpost_period_deadlines" => info.period_deadlines,
                "wpost_challenge_window" => info.challenge_window,
            ),
        );
        for deadline in &info.deadlines {
            let labels = labels!("miner_id" => self.miner_id, "index" => deadline.index);
            for (metric, value) in [
                (Metric::MinerDeadlineActiveStart, deadline.start_in as f64),
                (
                    Metric::MinerDeadlineActivePartitions,
                    deadline.partitions_count as f64,
                ),
                (
                    Metric::MinerDeadlineActivePartitionsProven,
                    deadline.proven_partitions_count as f64,
                ),
                (
                    Metric::MinerDeadlineActiveSectorsAll,
                    deadline.all_sectors_count as f64,
                ),
                (
                    Metric::MinerDeadlineActiveSectorsActive,
                    deadline.active_sectors_count as f64,
                ),
                (
                    Metric::MinerDeadlineActiveSectorsLive,
                    deadline.live_sectors_count as f64,
                ),
                (
                    Metric::MinerDeadlineActiveSectorsFaulty,
                    deadline.faulty_sectors_count as f64,
                ),
                (
                    Metric::MinerDeadlineActiveSectorsRecovering,
                    deadline.recovering_sectors_count as f64,
                ),
            ] {
                self.metrics.add(metric, value, labels.clone());
            }
        }
        self.metrics.checkpoint("Deadlines");
        Ok(())
    }
}
