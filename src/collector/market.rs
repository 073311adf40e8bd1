// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::{Scrape, UNKNOWN};
use crate::labels;
use crate::metrics::Metric;
use crate::rpc_client::{
    LotusError, Request,
    types::{MarketDeal, MinerDeal, SignedStorageAsk},
};
use serde_json::json;

impl Scrape<'_> {
    /// Storage ask and incomplete deals. Deals are annotated with their
    /// client's display name and, when published, their on chain state.
    pub(super) async fn market(&mut self) -> Result<(), LotusError> {
        let markets = &self.nodes.markets;
        // null until an ask is set
        let ask: Option<SignedStorageAsk> = markets.call("MarketGetAsk", json!([])).await?;
        if let Some(SignedStorageAsk { ask }) = ask {
            for (ask_type, value) in [
                ("price", ask.price.to_fil()),
                ("verified_price", ask.verified_price.to_fil()),
                ("min_piece_size", ask.min_piece_size as f64),
                ("max_piece_size", ask.max_piece_size as f64),
            ] {
                self.metrics.add(
                    Metric::MinerMarketAsk,
                    value,
                    labels!("miner_id" => self.miner_id, "ask_type" => ask_type),
                );
            }
        }

        let deals = markets
            .call::<Option<Vec<MinerDeal>>>("MarketListIncompleteDeals", json!([]))
            .await?
            .unwrap_or_default();
        let published = deals
            .iter()
            .filter(|deal| deal.deal_id != 0)
            .collect::<Vec<_>>();
        let requests = published
            .iter()
            .map(|deal| Request::new("StateMarketStorageDeal", json!([deal.deal_id, []])))
            .collect::<Vec<_>>();
        let on_chain = published
            .iter()
            .map(|deal| deal.deal_id)
            .zip(
                self.nodes
                    .daemon
                    .call_many::<MarketDeal>(&requests)
                    .await,
            )
            .collect::<ahash::HashMap<_, _>>();

        for deal in &deals {
            let client = self.addresses.resolve(&deal.proposal.client).await;
            let (sector_start_epoch, slash_epoch) = match on_chain.get(&deal.deal_id) {
                Some(Ok(it)) => (
                    it.state.sector_start_epoch.to_string(),
                    it.state.slash_epoch.to_string(),
                ),
                Some(Err(e)) => {
                    tracing::debug!("couldn't get on chain state of deal {}: {e}", deal.deal_id);
                    (UNKNOWN.to_string(), UNKNOWN.to_string())
                }
                None => (UNKNOWN.to_string(), UNKNOWN.to_string()),
            };
            let proposal = &deal.proposal;
            self.metrics.add(
                Metric::MinerMarketDealInfo,
                proposal.piece_size as f64,
                labels!(
                    "miner_id" => self.miner_id,
                    "deal_id" => deal.deal_id,
                    "client" => client,
                    "state" => deal.state,
                    "verified" => proposal.verified_deal,
                    "start_epoch" => proposal.start_epoch,
                    "end_epoch" => proposal.end_epoch,
                    "price_per_epoch" => proposal.storage_price_per_epoch.to_fil(),
                    "sector_start_epoch" => sector_start_epoch,
                    "slash_epoch" => slash_epoch,
                ),
            );
        }
        self.metrics.checkpoint("Market");
        Ok(())
    }
}
