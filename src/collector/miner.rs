// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::Scrape;
use crate::labels;
use crate::metrics::Metric;
use crate::rpc_client::{
    LotusError, Request,
    types::{BigIntString, MinerActorState, MinerInfo, MinerPower, MiningBaseInfo, Version},
};
use serde_json::json;

impl Scrape<'_> {
    /// Miner version, sector size and the display names of its owner, worker
    /// and first control address.
    pub(super) async fn miner_info(&mut self) -> Result<(), LotusError> {
        let version: Version = self.nodes.miner.call("Version", json!([])).await?;
        let info: MinerInfo = self
            .nodes
            .daemon
            .call("StateMinerInfo", json!([self.miner_id, []]))
            .await?;
        self.sector_size = info.sector_size;

        let owner = self.addresses.resolve(&info.owner).await;
        let worker = self.addresses.resolve(&info.worker).await;
        let control0 = match info.control_addresses.first() {
            Some(control) => self.addresses.resolve(control).await,
            None => String::new(),
        };
        self.metrics.add(
            Metric::MinerInfo,
            1.0,
            labels!(
                "miner_id" => self.miner_id,
                "version" => version.version,
                "owner" => owner,
                "worker" => worker,
                "control0" => control0,
            ),
        );
        self.metrics.add(
            Metric::MinerInfoSectorSize,
            self.sector_size as f64,
            labels!("miner_id" => self.miner_id),
        );
        self.metrics.checkpoint("Miner");
        Ok(())
    }

    pub(super) async fn daemon_info(&mut self) -> Result<(), LotusError> {
        let daemon = &self.nodes.daemon;
        let network: String = daemon.call("StateNetworkName", json!([])).await?;
        let network_version: u64 = daemon.call("StateNetworkVersion", json!([[]])).await?;
        let version: Version = daemon.call("Version", json!([])).await?;
        self.metrics.add(
            Metric::DaemonInfo,
            network_version as f64,
            labels!(
                "miner_id" => self.miner_id,
                "version" => version.version,
                "network" => network,
            ),
        );
        self.metrics.checkpoint("Daemon");
        Ok(())
    }

    /// Balances of the local wallets and of the miner actor, and the miner's
    /// locked funds.
    pub(super) async fn wallets(&mut self) -> Result<(), LotusError> {
        let daemon = &self.nodes.daemon;
        self.wallets = daemon
            .call::<Option<Vec<String>>>("WalletList", json!([]))
            .await?
            .unwrap_or_default();
        let requests = self
            .wallets
            .iter()
            .map(|address| Request::new("WalletBalance", json!([address])))
            .collect::<Vec<_>>();
        let balances = daemon
            .call_many::<BigIntString>(&requests)
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;

        for (address, balance) in self.wallets.iter().zip(balances) {
            let name = self.addresses.resolve(address).await;
            self.metrics.add(
                Metric::WalletBalance,
                balance.to_fil(),
                labels!("miner_id" => self.miner_id, "address" => address, "name" => name),
            );
        }

        let available: BigIntString = daemon
            .call("StateMinerAvailableBalance", json!([self.miner_id, []]))
            .await?;
        self.metrics.add(
            Metric::WalletBalance,
            available.to_fil(),
            labels!(
                "miner_id" => self.miner_id,
                "address" => self.miner_id,
                "name" => self.miner_id,
            ),
        );

        let state: MinerActorState = daemon
            .call("StateReadState", json!([self.miner_id, []]))
            .await?;
        let funds = state.state;
        for (locked_type, amount) in [
            ("PreCommitDeposits", &funds.pre_commit_deposits),
            ("LockedFunds", &funds.locked_funds),
            ("FeeDebt", &funds.fee_debt),
            ("InitialPledge", &funds.initial_pledge),
        ] {
            self.metrics.add(
                Metric::WalletLockedBalance,
                amount.to_fil(),
                labels!(
                    "miner_id" => self.miner_id,
                    "address" => self.miner_id,
                    "locked_type" => locked_type,
                ),
            );
        }
        self.metrics.checkpoint("Balances");
        Ok(())
    }

    pub(super) async fn power(&mut self) -> Result<(), LotusError> {
        let daemon = &self.nodes.daemon;
        let power: MinerPower = daemon
            .call("StateMinerPower", json!([self.miner_id, []]))
            .await?;
        for (scope, claim) in [("miner", &power.miner_power), ("network", &power.total_power)] {
            for (power_type, value) in [
                ("RawBytePower", &claim.raw_byte_power),
                ("QualityAdjPower", &claim.quality_adj_power),
            ] {
                self.metrics.add(
                    Metric::Power,
                    value.to_f64(),
                    labels!(
                        "miner_id" => self.miner_id,
                        "scope" => scope,
                        "power_type" => power_type,
                    ),
                );
            }
        }

        // null when the miner has no power
        let base_info: Option<MiningBaseInfo> = daemon
            .call(
                "MinerGetBaseInfo",
                json!([self.miner_id, self.height, self.tipset_key]),
            )
            .await?;
        let eligible = base_info.is_some_and(|it| it.eligible_for_mining);
        self.metrics.add(
            Metric::PowerMiningEligibility,
            f64::from(u8::from(eligible)),
            labels!("miner_id" => self.miner_id),
        );
        self.metrics.checkpoint("Power");
        Ok(())
    }
}
