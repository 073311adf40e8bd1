// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Lotus JSON documents, as far as the exporter reads them.
//!
//! Lotus de/serializes empty arrays as `null`, so every list goes through
//! [`nullable_vec`]. Big integers (token amounts, power, deal weights) travel
//! as decimal strings.

use crate::bitfield::Bitfield;
use ahash::HashMap;
use cid::Cid;
use num_bigint::BigInt;
use num_traits::ToPrimitive as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use serde_with::{DisplayFromStr, serde_as};

pub type ChainEpoch = i64;
pub type SectorNumber = u64;

/// attoFIL per FIL
const ATTO_PER_FIL: f64 = 1e18;

pub fn nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// `{"/": "bafy..."}`
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub struct CidJson {
    #[serde(rename = "/")]
    #[serde_as(as = "DisplayFromStr")]
    pub root: Cid,
}

/// An integer Lotus encodes as a decimal string.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct BigIntString(#[serde_as(as = "DisplayFromStr")] pub BigInt);

impl BigIntString {
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(f64::NAN)
    }

    /// Interprets the value as attoFIL and converts it to FIL.
    pub fn to_fil(&self) -> f64 {
        self.to_f64() / ATTO_PER_FIL
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TipSet {
    #[serde(default, deserialize_with = "nullable_vec")]
    pub cids: Vec<Value>,
    pub height: ChainEpoch,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SyncState {
    #[serde(default, deserialize_with = "nullable_vec")]
    pub active_syncs: Vec<ActiveSync>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActiveSync {
    pub base: Option<TipSetHeight>,
    pub target: Option<TipSetHeight>,
    pub stage: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TipSetHeight {
    pub height: ChainEpoch,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Version {
    pub version: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MinerInfo {
    pub owner: String,
    pub worker: String,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub control_addresses: Vec<String>,
    pub sector_size: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MinerPower {
    pub miner_power: Claim,
    pub total_power: Claim,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Claim {
    pub raw_byte_power: BigIntString,
    pub quality_adj_power: BigIntString,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MiningBaseInfo {
    pub eligible_for_mining: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MinerActorState {
    pub state: MinerLockedFunds,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MinerLockedFunds {
    pub pre_commit_deposits: BigIntString,
    pub locked_funds: BigIntString,
    pub fee_debt: BigIntString,
    pub initial_pledge: BigIntString,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SignedMessage {
    pub message: Message,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Message {
    pub from: String,
    pub to: String,
    pub nonce: u64,
    pub value: BigIntString,
    pub gas_limit: i64,
    pub gas_fee_cap: BigIntString,
    pub gas_premium: BigIntString,
    pub method: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BandwidthStats {
    pub total_in: i64,
    pub total_out: i64,
    pub rate_in: f64,
    pub rate_out: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WorkerStats {
    pub info: WorkerInfo,
    pub mem_used_min: u64,
    pub mem_used_max: u64,
    pub gpu_used: GpuUsage,
    pub cpu_use: u64,
}

/// Older Lotus reports GPU usage as a flag, newer as a fraction.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum GpuUsage {
    Flag(bool),
    Fraction(f64),
}

impl GpuUsage {
    pub fn as_f64(self) -> f64 {
        match self {
            GpuUsage::Flag(used) => f64::from(u8::from(used)),
            GpuUsage::Fraction(it) => it,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WorkerInfo {
    pub hostname: String,
    pub resources: WorkerResources,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WorkerResources {
    pub mem_physical: u64,
    pub mem_swap: u64,
    pub mem_reserved: u64,
    #[serde(rename = "CPUs")]
    pub cpus: u64,
    #[serde(rename = "GPUs", default, deserialize_with = "nullable_vec")]
    pub gpus: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WorkerJob {
    #[serde(rename = "ID")]
    pub id: Value,
    pub sector: SectorRef,
    pub task: String,
    pub run_wait: i64,
    pub start: String,
}

impl WorkerJob {
    /// Lotus has shipped both `"ID": "uuid"` and `"ID": {"Sector": .., "ID": "uuid"}`.
    pub fn job_id(&self) -> String {
        match &self.id {
            Value::String(it) => it.clone(),
            Value::Object(it) => it
                .get("ID")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SectorRef {
    pub number: SectorNumber,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SchedDiag {
    #[serde(default, deserialize_with = "nullable_vec")]
    pub requests: Vec<SchedRequest>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SchedRequest {
    pub sector: SectorRef,
    pub task_type: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SectorStatus {
    pub state: String,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub deals: Vec<u64>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub log: Vec<SectorLog>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SectorLog {
    pub kind: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SectorOnChainInfo {
    pub activation: ChainEpoch,
    pub expiration: ChainEpoch,
    pub deal_weight: BigIntString,
    pub verified_deal_weight: BigIntString,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiDeadline {
    pub post_submissions: Bitfield,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProvingDeadline {
    pub current_epoch: ChainEpoch,
    pub index: u64,
    pub open: ChainEpoch,
    #[serde(rename = "WPoStPeriodDeadlines")]
    pub period_deadlines: u64,
    #[serde(rename = "WPoStChallengeWindow")]
    pub challenge_window: ChainEpoch,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Partition {
    pub faulty_sectors: Bitfield,
    pub recovering_sectors: Bitfield,
    pub live_sectors: Bitfield,
    pub active_sectors: Bitfield,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StorageInfo {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "URLs", default, deserialize_with = "nullable_vec")]
    pub urls: Vec<String>,
    pub weight: u64,
    pub can_seal: bool,
    pub can_store: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StorageStat {
    pub capacity: i64,
    pub available: i64,
    pub reserved: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SignedStorageAsk {
    pub ask: StorageAsk,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StorageAsk {
    pub price: BigIntString,
    pub verified_price: BigIntString,
    pub min_piece_size: u64,
    pub max_piece_size: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MinerDeal {
    pub proposal: DealProposal,
    pub state: u64,
    #[serde(rename = "DealID")]
    pub deal_id: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DealProposal {
    pub piece_size: u64,
    pub client: String,
    pub start_epoch: ChainEpoch,
    pub end_epoch: ChainEpoch,
    pub storage_price_per_epoch: BigIntString,
    pub verified_deal: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MarketDeal {
    pub state: MarketDealState,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MarketDealState {
    pub sector_start_epoch: ChainEpoch,
    pub slash_epoch: ChainEpoch,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActorState {
    pub code: CidJson,
}

/// `StateActorCodeCIDs`: actor name to code CID.
pub type ActorCodeCids = HashMap<String, CidJson>;
