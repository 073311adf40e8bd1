// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Actor code to actor type resolution, and method numbers to message names.
//!
//! Actor codes change with every network upgrade, so the table is fetched from
//! the daemon for its current network version instead of being hardcoded.

use crate::rpc_client::{
    Lotus, LotusError,
    types::{ActorCodeCids, ActorState},
};
use ahash::{HashMap, HashMapExt as _};
use cid::Cid;
use itertools::Itertools as _;
use serde_json::json;
use std::str::FromStr as _;

/// Multihash code of the identity "hash", used by the pre-bundle actor codes.
const IDENTITY_HASH_CODE: u64 = 0x00;

/// The builtin actors the exporter knows how to annotate.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum ActorType {
    System,
    Init,
    Reward,
    Cron,
    StoragePower,
    StorageMarket,
    VerifiedRegistry,
    Account,
    Multisig,
    PaymentChannel,
    StorageMiner,
}

impl ActorType {
    /// Exported method names, method number `n` at index `n - 1`.
    pub fn methods(self) -> &'static [&'static str] {
        match self {
            ActorType::System => &["Constructor"],
            ActorType::Init => &["Constructor", "Exec"],
            ActorType::Reward => &[
                "Constructor",
                "AwardBlockReward",
                "ThisEpochReward",
                "UpdateNetworkKPI",
            ],
            ActorType::Cron => &["Constructor", "EpochTick"],
            ActorType::StoragePower => &[
                "Constructor",
                "CreateMiner",
                "UpdateClaimedPower",
                "EnrollCronEvent",
                "OnEpochTickEnd",
                "UpdatePledgeTotal",
                "OnConsensusFault",
                "SubmitPoRepForBulkVerify",
                "CurrentTotalPower",
            ],
            ActorType::StorageMarket => &[
                "Constructor",
                "AddBalance",
                "WithdrawBalance",
                "PublishStorageDeals",
                "VerifyDealsForActivation",
                "ActivateDeals",
                "OnMinerSectorsTerminate",
                "ComputeDataCommitment",
                "CronTick",
            ],
            ActorType::VerifiedRegistry => &[
                "Constructor",
                "AddVerifier",
                "RemoveVerifier",
                "AddVerifiedClient",
                "UseBytes",
                "RestoreBytes",
                "RemoveVerifiedClientDataCap",
            ],
            ActorType::Account => &["Constructor", "PubkeyAddress"],
            ActorType::Multisig => &[
                "Constructor",
                "Propose",
                "Approve",
                "Cancel",
                "AddSigner",
                "RemoveSigner",
                "SwapSigner",
                "ChangeNumApprovalsThreshold",
                "LockBalance",
            ],
            ActorType::PaymentChannel => &["Constructor", "UpdateChannelState", "Settle", "Collect"],
            ActorType::StorageMiner => &[
                "Constructor",
                "ControlAddresses",
                "ChangeWorkerAddress",
                "ChangePeerID",
                "SubmitWindowedPoSt",
                "PreCommitSector",
                "ProveCommitSector",
                "ExtendSectorExpiration",
                "TerminateSectors",
                "DeclareFaults",
                "DeclareFaultsRecovered",
                "OnDeferredCronEvent",
                "CheckSectorProven",
                "ApplyRewards",
                "ReportConsensusFault",
                "WithdrawBalance",
                "ConfirmSectorProofsValid",
                "ChangeMultiaddrs",
                "CompactPartitions",
                "CompactSectorNumbers",
                "ConfirmUpdateWorkerKey",
                "RepayDebt",
                "ChangeOwnerAddress",
                "DisputeWindowedPoSt",
                "PreCommitSectorBatch",
                "ProveCommitAggregate",
                "ProveReplicaUpdates",
            ],
        }
    }

    pub fn method_name(self, method: u64) -> Option<&'static str> {
        let index = usize::try_from(method.checked_sub(1)?).ok()?;
        self.methods().get(index).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown actor type for code {0}")]
pub struct UnknownActorType(pub Cid);

/// `(actor type, message name)` of a message, `("Unknown", "Unknown")` when
/// either cannot be determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageType {
    pub actor: &'static str,
    pub method: &'static str,
}

impl MessageType {
    pub const UNKNOWN: MessageType = MessageType {
        actor: "Unknown",
        method: "Unknown",
    };
}

/// Code CID to [`ActorType`] table of the current network version.
#[derive(Debug, Clone, Default)]
pub struct ActorRegistry {
    codes: HashMap<Cid, ActorType>,
}

impl ActorRegistry {
    /// Builds the table from a `StateActorCodeCIDs` document. Names that are
    /// not one of the known actor types are left out.
    pub fn from_code_cids(code_cids: ActorCodeCids) -> Self {
        let mut codes = HashMap::with_capacity(code_cids.len());
        let mut unknown = vec![];
        for (name, cid) in code_cids {
            match ActorType::from_str(&name) {
                Ok(actor_type) => {
                    codes.insert(cid.root, actor_type);
                }
                Err(_) => unknown.push(name),
            }
        }
        if !unknown.is_empty() {
            tracing::debug!("unknown actors in list: [{}]", unknown.iter().sorted().join(", "));
        }
        Self { codes }
    }

    /// Queries the daemon for its network version, then for that version's
    /// actor code table.
    pub async fn load(daemon: &Lotus) -> Result<Self, LotusError> {
        let network_version: u64 = daemon.call("StateNetworkVersion", json!([[]])).await?;
        let code_cids: ActorCodeCids = daemon
            .call("StateActorCodeCIDs", json!([network_version]))
            .await?;
        let registry = Self::from_code_cids(code_cids);
        tracing::debug!(
            "loaded {} actor codes for network version {network_version}",
            registry.len()
        );
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Codes missing from the table are still recognized when they are
    /// identity CIDs of the legacy `fil/<version>/<name>` form.
    pub fn actor_type_of(&self, code: &Cid) -> Result<ActorType, UnknownActorType> {
        if let Some(actor_type) = self.codes.get(code) {
            return Ok(*actor_type);
        }
        legacy_actor_type(code).ok_or(UnknownActorType(*code))
    }

    /// Looks up the actor at `address` and names the message `method` sent to
    /// it. Never fails.
    pub async fn message_type_of(&self, daemon: &Lotus, address: &str, method: u64) -> MessageType {
        let actor = match daemon
            .call::<ActorState>("StateGetActor", json!([address, []]))
            .await
        {
            Ok(actor) => actor,
            Err(e) => {
                tracing::debug!("couldn't look up actor {address}: {e}");
                return MessageType::UNKNOWN;
            }
        };
        let Ok(actor_type) = self.actor_type_of(&actor.code.root) else {
            return MessageType::UNKNOWN;
        };
        match actor_type.method_name(method) {
            Some(name) => MessageType {
                actor: actor_type.into(),
                method: name,
            },
            None => MessageType::UNKNOWN,
        }
    }
}

fn legacy_actor_type(code: &Cid) -> Option<ActorType> {
    if code.hash().code() != IDENTITY_HASH_CODE {
        return None;
    }
    let path = std::str::from_utf8(code.hash().digest()).ok()?;
    let name = path.strip_prefix("fil/")?.split('/').nth(1)?;
    ActorType::from_str(name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc_client::Target;
    use crate::test_utils::{ACCOUNT_CODE, EVM_CODE, MINER_CODE, MockNode, Reply, actor_code_table};
    use rstest::rstest;
    use strum::IntoEnumIterator as _;

    fn registry() -> ActorRegistry {
        ActorRegistry::from_code_cids(serde_json::from_value(actor_code_table()).unwrap())
    }

    #[test]
    fn every_actor_type_has_a_constructor() {
        for actor_type in ActorType::iter() {
            assert_eq!(actor_type.method_name(1), Some("Constructor"));
        }
    }

    #[rstest]
    #[case(ActorType::StorageMiner, 5, Some("SubmitWindowedPoSt"))]
    #[case(ActorType::StorageMiner, 27, Some("ProveReplicaUpdates"))]
    #[case(ActorType::StorageMiner, 28, None)]
    #[case(ActorType::StorageMarket, 4, Some("PublishStorageDeals"))]
    #[case(ActorType::Multisig, 2, Some("Propose"))]
    #[case(ActorType::Account, 0, None)]
    fn method_names(#[case] actor: ActorType, #[case] method: u64, #[case] expected: Option<&str>) {
        assert_eq!(actor.method_name(method), expected);
    }

    #[test]
    fn actor_type_names() {
        assert_eq!(ActorType::StoragePower.to_string(), "storagepower");
        assert_eq!(
            ActorType::from_str("paymentchannel").unwrap(),
            ActorType::PaymentChannel
        );
    }

    #[test]
    fn live_table_lookup() {
        let registry = registry();
        // evm is not a known actor type
        assert_eq!(registry.len(), 2);
        let miner = Cid::from_str(MINER_CODE).unwrap();
        assert_eq!(registry.actor_type_of(&miner), Ok(ActorType::StorageMiner));
        let account = Cid::from_str(ACCOUNT_CODE).unwrap();
        assert_eq!(registry.actor_type_of(&account), Ok(ActorType::Account));
    }

    #[test]
    fn unknown_code_fails() {
        let code = Cid::from_str(EVM_CODE).unwrap();
        assert_eq!(registry().actor_type_of(&code), Err(UnknownActorType(code)));
    }

    #[test]
    fn legacy_identity_codes() {
        let registry = ActorRegistry::default();
        let miner = Cid::from_str("bafkqaetgnfwc6mjpon2g64tbm5sw22lomvza").unwrap();
        assert_eq!(registry.actor_type_of(&miner), Ok(ActorType::StorageMiner));
        let account = Cid::from_str("bafkqadlgnfwc6mjpmfrwg33vnz2a").unwrap();
        assert_eq!(registry.actor_type_of(&account), Ok(ActorType::Account));
    }

    #[tokio::test]
    async fn load_from_node() {
        let node = MockNode::builder()
            .on("StateNetworkVersion", |_| Reply::result(json!(21)))
            .on("StateActorCodeCIDs", |params| {
                assert_eq!(params[0], json!(21));
                Reply::result(actor_code_table())
            })
            .spawn()
            .await;
        let registry = ActorRegistry::load(&node.lotus(Target::Daemon)).await.unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn message_type_lookup() {
        let node = MockNode::builder()
            .on("StateGetActor", |params| match params[0].as_str() {
                Some("f01000") => Reply::result(json!({ "Code": { "/": MINER_CODE } })),
                _ => Reply::error(1, "actor not found"),
            })
            .spawn()
            .await;
        let daemon = node.lotus(Target::Daemon);
        let registry = registry();

        let it = registry.message_type_of(&daemon, "f01000", 5).await;
        assert_eq!(
            it,
            MessageType {
                actor: "storageminer",
                method: "SubmitWindowedPoSt"
            }
        );
        // newer than the table
        let it = registry.message_type_of(&daemon, "f01000", 99).await;
        assert_eq!(it, MessageType::UNKNOWN);
        // actor lookup fails
        let it = registry.message_type_of(&daemon, "f09999", 1).await;
        assert_eq!(it, MessageType::UNKNOWN);
    }
}
