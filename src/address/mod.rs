// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Display names for chain addresses.
//!
//! The same account shows up in API payloads as an ID address (`f0...`) and
//! as a public key address (`f1...`, `f3...`). [`AddressResolver`] maps both
//! to one display name, the ID form or an alias, and caches every form it
//! has seen so each address costs at most one lookup per run.

use crate::actors::{ActorRegistry, ActorType};
use crate::rpc_client::{Lotus, LotusError, types::ActorState};
use ahash::HashMap;
use serde_json::json;

/// Characters kept at each end by [`truncate`].
const TRUNCATE_KEEP: usize = 5;

/// `f1abjxfbp274xpdqcpuaykwkfb43omjotacm2p3za -> f1abj...2p3za`
pub fn truncate(address: &str) -> String {
    let head = address.chars().take(TRUNCATE_KEEP).collect::<String>();
    let tail = address
        .chars()
        .rev()
        .take(TRUNCATE_KEEP)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<String>();
    format!("{head}...{tail}")
}

/// `f0...` and `t0...` are ID addresses.
pub fn is_id_address(address: &str) -> bool {
    matches!(address.get(..2), Some("f0" | "t0"))
}

pub struct AddressResolver<'a> {
    daemon: &'a Lotus,
    actors: &'a ActorRegistry,
    cache: HashMap<String, String>,
}

impl<'a> AddressResolver<'a> {
    pub fn new(daemon: &'a Lotus, actors: &'a ActorRegistry) -> Self {
        Self {
            daemon,
            actors,
            cache: HashMap::default(),
        }
    }

    /// Seeds the cache with `address -> alias` pairs. An alias set on either
    /// form of an account applies to both.
    pub fn with_aliases(mut self, aliases: impl IntoIterator<Item = (String, String)>) -> Self {
        self.cache.extend(aliases);
        self
    }

    /// Number of cached address forms.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Display name of `address`. Never fails: lookup failures degrade to the
    /// input itself (ID form) or its [`truncate`]d form (public key form).
    pub async fn resolve(&mut self, address: &str) -> String {
        if let Some(name) = self.cache.get(address) {
            return name.clone();
        }

        let (name, addr) = match is_id_address(address) {
            true => match self.account_key(address).await {
                Ok(Some(key)) => (address.to_string(), key),
                Ok(None) => (address.to_string(), address.to_string()),
                Err(e) => {
                    tracing::debug!("couldn't resolve {address}: {e}");
                    (address.to_string(), address.to_string())
                }
            },
            false => match self.lookup_id(address).await {
                Ok(id) => (id, address.to_string()),
                Err(e) => {
                    tracing::debug!("couldn't resolve {address}: {e}");
                    (truncate(address), address.to_string())
                }
            },
        };

        if let Some(hit) = [&name, &addr]
            .into_iter()
            .find_map(|key| self.cache.get(key).cloned())
        {
            self.cache.insert(address.to_string(), hit.clone());
            return hit;
        }

        self.cache.insert(name.clone(), name.clone());
        self.cache.insert(addr, name.clone());
        name
    }

    /// Public key of the account actor at `id`, [`None`] for other actor types.
    async fn account_key(&self, id: &str) -> Result<Option<String>, LotusError> {
        let actor: ActorState = self
            .daemon
            .call("StateGetActor", json!([id, []]))
            .await?;
        match self.actors.actor_type_of(&actor.code.root) {
            Ok(ActorType::Account) => {
                let key = self
                    .daemon
                    .call("StateAccountKey", json!([id, []]))
                    .await?;
                Ok(Some(key))
            }
            _ => Ok(None),
        }
    }

    async fn lookup_id(&self, address: &str) -> Result<String, LotusError> {
        self.daemon
            .call("StateLookupID", json!([address, []]))
            .await
    }
}
