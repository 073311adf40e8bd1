// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Window PoSt deadline overview of a miner, starting from the currently
//! open deadline.

use crate::bitfield::{SectorFlag, SectorState};
use crate::rpc_client::{
    Lotus, LotusError, Request,
    types::{ApiDeadline, ChainEpoch, Partition, ProvingDeadline},
};
use serde_json::json;

/// Block delay of mainnet, used to turn epochs into seconds.
pub const EPOCH_DURATION_SECONDS: i64 = 30;

/// Aggregates of one deadline that has at least one partition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeadlineSummary {
    pub index: u64,
    /// Seconds until the deadline opens, negative for the open one.
    pub start_in: i64,
    pub partitions_count: u64,
    pub proven_partitions_count: u64,
    /// Distinct sectors across all partitions.
    pub all_sectors_count: u64,
    pub active_sectors_count: u64,
    pub live_sectors_count: u64,
    pub faulty_sectors_count: u64,
    pub recovering_sectors_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeadlineInfo {
    pub current_index: u64,
    pub current_epoch: ChainEpoch,
    pub open: ChainEpoch,
    pub period_deadlines: u64,
    pub challenge_window: ChainEpoch,
    /// In proving order, the current deadline first. Deadlines without
    /// partitions are left out.
    pub deadlines: Vec<DeadlineSummary>,
}

/// Builds the overview from `StateMinerProvingDeadline`,
/// `StateMinerDeadlines` and `StateMinerPartitions` of every deadline index.
pub fn summarize(
    proving: &ProvingDeadline,
    deadlines: &[ApiDeadline],
    partitions: &[Vec<Partition>],
) -> DeadlineInfo {
    let n = proving.period_deadlines;
    let mut summaries = vec![];
    for c in 0..n {
        let index = (proving.index + c) % n;
        let Some(parts) = usize::try_from(index)
            .ok()
            .and_then(|i| partitions.get(i))
            .filter(|parts| !parts.is_empty())
        else {
            continue;
        };

        let opens_at = proving.open + proving.challenge_window * c as ChainEpoch;
        let mut summary = DeadlineSummary {
            index,
            start_in: (opens_at - proving.current_epoch) * EPOCH_DURATION_SECONDS,
            partitions_count: parts.len() as u64,
            proven_partitions_count: usize::try_from(index)
                .ok()
                .and_then(|i| deadlines.get(i))
                .map(|dl| dl.post_submissions.count())
                .unwrap_or_default(),
            ..Default::default()
        };
        for partition in parts {
            let mut state = SectorState::new();
            summary.faulty_sectors_count += partition
                .faulty_sectors
                .decode_into(SectorFlag::Faulty, &mut state);
            summary.recovering_sectors_count += partition
                .recovering_sectors
                .decode_into(SectorFlag::Recovering, &mut state);
            summary.active_sectors_count += partition
                .active_sectors
                .decode_into(SectorFlag::Active, &mut state);
            summary.live_sectors_count += partition
                .live_sectors
                .decode_into(SectorFlag::Live, &mut state);
            summary.all_sectors_count += state.len() as u64;
        }
        summaries.push(summary);
    }

    DeadlineInfo {
        current_index: proving.index,
        current_epoch: proving.current_epoch,
        open: proving.open,
        period_deadlines: n,
        challenge_window: proving.challenge_window,
        deadlines: summaries,
    }
}

/// Fetches the deadline documents of `miner_id` and summarizes them. The
/// partitions of every deadline are fetched in a single batch.
pub async fn aggregate(daemon: &Lotus, miner_id: &str) -> Result<DeadlineInfo, LotusError> {
    let deadlines: Option<Vec<ApiDeadline>> = daemon
        .call("StateMinerDeadlines", json!([miner_id, []]))
        .await?;
    let proving: ProvingDeadline = daemon
        .call("StateMinerProvingDeadline", json!([miner_id, []]))
        .await?;

    let requests = (0..proving.period_deadlines)
        .map(|index| Request::new("StateMinerPartitions", json!([miner_id, index, []])))
        .collect::<Vec<_>>();
    let partitions = daemon
        .call_many::<Option<Vec<Partition>>>(&requests)
        .await
        .into_iter()
        .map(|it| it.map(Option::unwrap_or_default))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(summarize(
        &proving,
        &deadlines.unwrap_or_default(),
        &partitions,
    ))
}
