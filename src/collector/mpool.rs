// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::Scrape;
use crate::labels;
use crate::metrics::Metric;
use crate::rpc_client::{LotusError, types::SignedMessage};
use serde_json::json;

impl Scrape<'_> {
    /// Pending messages, with the ones sent from local wallets annotated with
    /// their sender, recipient and message type.
    pub(super) async fn mpool(&mut self) -> Result<(), LotusError> {
        let pending = self
            .nodes
            .daemon
            .call::<Option<Vec<SignedMessage>>>("MpoolPending", json!([[]]))
            .await?
            .unwrap_or_default();

        let mut local_total = 0u64;
        for message in pending.iter().map(|it| &it.message) {
            if !self.wallets.contains(&message.from) {
                continue;
            }
            local_total += 1;
            let from = self.addresses.resolve(&message.from).await;
            let to = self.addresses.resolve(&message.to).await;
            let message_type = self
                .actors
                .message_type_of(&self.nodes.daemon, &message.to, message.method)
                .await;
            self.metrics.add(
                Metric::MpoolLocalMessage,
                1.0,
                labels!(
                    "miner_id" => self.miner_id,
                    "from" => from,
                    "to" => to,
                    "nonce" => message.nonce,
                    "value" => message.value.to_fil(),
                    "gas_limit" => message.gas_limit,
                    "gas_fee_cap" => message.gas_fee_cap.0,
                    "gas_premium" => message.gas_premium.0,
                    "actor_type" => message_type.actor,
                    "method" => message_type.method,
                ),
            );
        }

        self.metrics.add(
            Metric::MpoolTotal,
            pending.len() as f64,
            labels!("miner_id" => self.miner_id),
        );
        self.metrics.add(
            Metric::MpoolLocalTotal,
            local_total as f64,
            labels!("miner_id" => self.miner_id),
        );
        self.metrics.checkpoint("MPool");
        Ok(())
    }
}
