// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Reverse name lookups of storage hosts.

use ahash::HashMap;
use hickory_resolver::TokioResolver;
use std::{net::IpAddr, time::Duration};

/// A host that doesn't answer within this is shown by its address.
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

/// Host names of IP addresses, cached for the run. A host that is already a
/// name, or whose address has no PTR record, is returned as is.
pub struct HostNames {
    resolver: Option<TokioResolver>,
    cache: HashMap<String, String>,
}

impl HostNames {
    /// Uses the resolvers of the system configuration. Without one, no
    /// lookups are made.
    pub fn from_system_conf() -> Self {
        let resolver = match TokioResolver::builder_tokio() {
            Ok(mut builder) => {
                let options = builder.options_mut();
                options.timeout = LOOKUP_TIMEOUT;
                options.attempts = 1;
                Some(builder.build())
            }
            Err(e) => {
                tracing::debug!("no system resolver, host names won't be looked up: {e}");
                None
            }
        };
        Self::with_resolver(resolver)
    }

    fn with_resolver(resolver: Option<TokioResolver>) -> Self {
        HostNames {
            resolver,
            cache: HashMap::default(),
        }
    }

    pub async fn lookup(&mut self, host: &str) -> String {
        if let Some(name) = self.cache.get(host) {
            return name.clone();
        }
        let name = self
            .reverse(host)
            .await
            .unwrap_or_else(|| host.to_string());
        self.cache.insert(host.to_string(), name.clone());
        name
    }

    async fn reverse(&self, host: &str) -> Option<String> {
        let ip = parse_ip(host)?;
        let resolver = self.resolver.as_ref()?;
        match resolver.reverse_lookup(ip).await {
            Ok(names) => names
                .iter()
                .next()
                .map(|ptr| ptr.0.to_utf8().trim_end_matches('.').to_string()),
            Err(e) => {
                tracing::debug!("no host name for {ip}: {e}");
                None
            }
        }
    }
}

/// `10.0.0.5` and `[::1]`, the forms a URL host takes.
fn parse_ip(host: &str) -> Option<IpAddr> {
    host.strip_prefix('[')
        .and_then(|it| it.strip_suffix(']'))
        .unwrap_or(host)
        .parse()
        .ok()
}
