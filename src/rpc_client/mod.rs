// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Concurrent JSON-RPC client for the Lotus miner, daemon and markets APIs.
//!
//! A [`Lotus`] handle is cheap: it only carries the endpoint and token. Every
//! call to [`Lotus::send`] opens one HTTP session, dispatches the whole batch
//! concurrently and hands back one result per request, in request order.

mod error;
pub mod types;

pub use error::{ErrorKind, LotusError};

use anyhow::Context as _;
use futures::future::join_all;
use multiaddr::{Multiaddr, Protocol};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::{fmt, path::Path, str::FromStr};
use url::Url;

/// All Lotus methods live in this namespace on the wire.
pub const METHOD_NAMESPACE: &str = "Filecoin.";
/// Lotus ignores the request id, so every request carries the same one.
pub const JSON_RPC_ID: u64 = 3;
pub const API_PATH: &str = "/rpc/v0";

/// The subsystem a [`Lotus`] handle talks to. Errors carry it so that a
/// failed run can be attributed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum Target {
    Miner,
    Daemon,
    Markets,
}

/// Token and URL of a Lotus API endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiInfo {
    pub url: Url,
    pub token: Option<String>,
}

impl fmt::Display for ApiInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // never print the token
        self.url.fmt(f)
    }
}

impl FromStr for ApiInfo {
    type Err = anyhow::Error;

    /// Parses the `FULLNODE_API_INFO` format, `<token>:<multiaddr>`. The token
    /// is optional.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (token, host) = match s.starts_with('/') {
            true => (None, s),
            false => match s.split_once(':') {
                Some((token, host)) => (Some(token), host),
                None => anyhow::bail!("malformed API string: {s}"),
            },
        };
        let multiaddr: Multiaddr = host
            .parse()
            .with_context(|| format!("malformed API multiaddr: {host}"))?;
        let mut url = multiaddr2url(&multiaddr).context("couldn't convert multiaddr to URL")?;
        url.set_path(API_PATH);
        Ok(ApiInfo {
            url,
            token: token.filter(|it| !it.is_empty()).map(String::from),
        })
    }
}

impl ApiInfo {
    /// Reads the `api` and `token` files Lotus writes into its repository.
    pub fn from_repo(repo: &Path) -> anyhow::Result<Self> {
        let api = std::fs::read_to_string(repo.join("api"))
            .with_context(|| format!("couldn't read {}", repo.join("api").display()))?;
        let token = std::fs::read_to_string(repo.join("token"))
            .with_context(|| format!("couldn't read {}", repo.join("token").display()))?;
        let info: ApiInfo = api.parse()?;
        Ok(ApiInfo {
            token: Some(token.trim().to_string()),
            ..info
        })
    }
}

/// An at-rest description of a remote procedure call. `params` is the
/// positional parameter array.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: String,
    pub params: Value,
}

impl Request {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Request {
            method: method.into(),
            params,
        }
    }

    fn body(&self) -> Value {
        json!({
            "jsonrpc": "2.0",
            "method": format!("{METHOD_NAMESPACE}{}", self.method),
            "params": self.params,
            "id": JSON_RPC_ID,
        })
    }
}

/// Handle on one Lotus API endpoint.
#[derive(Clone, Debug)]
pub struct Lotus {
    target: Target,
    info: ApiInfo,
}

impl Lotus {
    pub fn new(target: Target, info: ApiInfo) -> Self {
        Lotus { target, info }
    }

    pub fn target(&self) -> Target {
        self.target
    }

    /// Sends every request concurrently over a single session. The returned
    /// vector has one element per request, in the same order; each element is
    /// the raw response body, or the transport/decode error of that request
    /// alone. An empty body decodes to [`Value::Null`].
    pub async fn send(&self, requests: &[Request]) -> Vec<Result<Value, LotusError>> {
        let client = reqwest::Client::new();
        join_all(requests.iter().map(|request| self.post(&client, request))).await
    }

    async fn post(&self, client: &reqwest::Client, request: &Request) -> Result<Value, LotusError> {
        let transport = |source| LotusError::Transport {
            target: self.target,
            method: request.method.clone(),
            source,
        };
        let mut builder = client.post(self.info.url.clone()).json(&request.body());
        if let Some(token) = &self.info.token {
            builder = builder.bearer_auth(token);
        }
        let body = builder
            .send()
            .await
            .map_err(transport)?
            .bytes()
            .await
            .map_err(transport)?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&body).map_err(|source| LotusError::Decode {
            target: self.target,
            method: request.method.clone(),
            source,
        })
    }

    /// Single request form of [`Lotus::send`]. A response carrying an `error`
    /// member, or no `result` at all, is a hard failure. Returns the whole
    /// response body.
    pub async fn get(&self, method: &str, params: Value) -> Result<Value, LotusError> {
        let request = Request::new(method, params);
        let response = self.send(std::slice::from_ref(&request)).await;
        let body = response
            .into_iter()
            .next()
            .unwrap_or_else(|| Err(self.empty(method)))?;
        self.check(method, &body)?;
        Ok(body)
    }

    /// [`Lotus::get`], then decodes the `result` member into `T`.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, LotusError> {
        let body = self.get(method, params).await?;
        self.decode(method, body)
    }

    /// [`Lotus::send`], then checks and decodes every response on its own.
    pub async fn call_many<T: DeserializeOwned>(
        &self,
        requests: &[Request],
    ) -> Vec<Result<T, LotusError>> {
        self.send(requests)
            .await
            .into_iter()
            .zip(requests)
            .map(|(response, request)| {
                let body = response?;
                self.check(&request.method, &body)?;
                self.decode(&request.method, body)
            })
            .collect()
    }

    fn check(&self, method: &str, body: &Value) -> Result<(), LotusError> {
        let Some(object) = body.as_object() else {
            return Err(self.empty(method));
        };
        match object.get("error") {
            Some(error) if !error.is_null() => Err(LotusError::Remote {
                target: self.target,
                method: method.to_string(),
                error: error.clone(),
            }),
            _ if !object.contains_key("result") => Err(self.empty(method)),
            _ => Ok(()),
        }
    }

    fn decode<T: DeserializeOwned>(&self, method: &str, mut body: Value) -> Result<T, LotusError> {
        let result = body
            .get_mut("result")
            .map(Value::take)
            .unwrap_or(Value::Null);
        serde_json::from_value(result)
            .map_err(|e| LotusError::semantic(self.target, method, e.to_string()))
    }

    fn empty(&self, method: &str) -> LotusError {
        LotusError::Empty {
            target: self.target,
            method: method.to_string(),
        }
    }
}

/// `"/dns/example.com/tcp/8080/http" -> "http://example.com:8080/"`
///
/// Returns [`None`] on unsupported formats, or if there is a URL parsing error.
///
/// Note that [`Multiaddr`]s do NOT support a (URL) `path`, so that must be handled
/// out-of-band.
fn multiaddr2url(m: &Multiaddr) -> Option<Url> {
    let mut components = m.iter().peekable();
    let host = match components.next()? {
        Protocol::Dns(it) | Protocol::Dns4(it) | Protocol::Dns6(it) | Protocol::Dnsaddr(it) => {
            it.to_string()
        }
        Protocol::Ip4(it) => it.to_string(),
        Protocol::Ip6(it) => format!("[{it}]"),
        _ => return None,
    };
    let port = components
        .next_if(|it| matches!(it, Protocol::Tcp(_)))
        .and_then(|it| match it {
            Protocol::Tcp(port) => Some(port),
            _ => None,
        });
    let scheme = match components.next()? {
        Protocol::Http => "http",
        Protocol::Https => "https",
        Protocol::Ws(it) if it == "/" => "ws",
        Protocol::Wss(it) if it == "/" => "wss",
        _ => return None,
    };
    let None = components.next() else { return None };
    let parse_me = match port {
        Some(port) => format!("{scheme}://{host}:{port}"),
        None => format!("{scheme}://{host}"),
    };
    parse_me.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockNode, Reply};
    use std::time::Duration;

    #[test]
    fn test_multiaddr2url() {
        #[track_caller]
        fn do_test(input: &str, expected: &str) {
            let multiaddr = input.parse().unwrap();
            let url = multiaddr2url(&multiaddr).unwrap();
            assert_eq!(url.as_str(), expected);
        }
        do_test("/dns/example.com/http", "http://example.com/");
        do_test("/dns/example.com/tcp/8080/http", "http://example.com:8080/");
        do_test("/ip4/127.0.0.1/wss", "wss://127.0.0.1/");
        do_test("/ip6/::1/tcp/1234/http", "http://[::1]:1234/");
    }

    #[test]
    fn api_info_with_token() {
        let info: ApiInfo = "eyJhbGciOi:/ip4/10.0.0.1/tcp/2345/http".parse().unwrap();
        assert_eq!(info.url.as_str(), "http://10.0.0.1:2345/rpc/v0");
        assert_eq!(info.token.as_deref(), Some("eyJhbGciOi"));
    }

    #[test]
    fn api_info_without_token() {
        let info: ApiInfo = "/ip4/127.0.0.1/tcp/1234/http\n".parse().unwrap();
        assert_eq!(info.url.as_str(), "http://127.0.0.1:1234/rpc/v0");
        assert_eq!(info.token, None);
    }

    #[test]
    fn api_info_malformed() {
        assert!("token:not-a-multiaddr".parse::<ApiInfo>().is_err());
        assert!("no-separator".parse::<ApiInfo>().is_err());
        assert!("token:/ip4/127.0.0.1/tcp/1234/udp".parse::<ApiInfo>().is_err());
    }

    #[test]
    fn api_info_from_repo() {
        let repo = tempfile::tempdir().unwrap();
        std::fs::write(repo.path().join("api"), "/ip4/127.0.0.1/tcp/1234/http").unwrap();
        std::fs::write(repo.path().join("token"), "secret\n").unwrap();
        let info = ApiInfo::from_repo(repo.path()).unwrap();
        assert_eq!(info.url.as_str(), "http://127.0.0.1:1234/rpc/v0");
        assert_eq!(info.token.as_deref(), Some("secret"));
        // the token must not leak through Display
        assert!(!info.to_string().contains("secret"));
    }

    #[tokio::test]
    async fn batch_preserves_request_order() {
        let node = MockNode::builder()
            .random_delay(Duration::from_millis(40))
            .on("Echo", |params| Reply::result(params[0].clone()))
            .spawn()
            .await;
        let lotus = node.lotus(Target::Daemon);
        let requests = (0..32)
            .map(|i| Request::new("Echo", json!([i])))
            .collect::<Vec<_>>();
        let results = lotus.call_many::<u64>(&requests).await;
        assert_eq!(results.len(), 32);
        for (i, result) in results.into_iter().enumerate() {
            assert_eq!(result.unwrap(), i as u64);
        }
        assert_eq!(node.calls("Echo"), 32);
    }

    #[tokio::test]
    async fn one_failure_does_not_poison_the_batch() {
        let node = MockNode::builder()
            .on("Ok", |_| Reply::result(json!("fine")))
            .on("Broken", |_| Reply::Garbage)
            .spawn()
            .await;
        let lotus = node.lotus(Target::Miner);
        let results = lotus
            .send(&[
                Request::new("Ok", json!([])),
                Request::new("Broken", json!([])),
                Request::new("Ok", json!([])),
            ])
            .await;
        assert_eq!(results[0].as_ref().unwrap()["result"], json!("fine"));
        let err = results[1].as_ref().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.target(), Target::Miner);
        assert_eq!(results[2].as_ref().unwrap()["result"], json!("fine"));
    }

    #[tokio::test]
    async fn request_carries_namespace_and_token() {
        let node = MockNode::builder()
            .on("ActorAddress", |_| Reply::result(json!("f01000")))
            .spawn()
            .await;
        let id: String = node
            .lotus(Target::Miner)
            .call("ActorAddress", json!([]))
            .await
            .unwrap();
        assert_eq!(id, "f01000");
        assert_eq!(node.last_authorization().as_deref(), Some("Bearer mock-token"));
    }

    #[tokio::test]
    async fn get_rejects_error_and_empty_responses() {
        let node = MockNode::builder()
            .on("Failing", |_| Reply::error(1, "actor not found"))
            .on("Silent", |_| Reply::Empty)
            .spawn()
            .await;
        let lotus = node.lotus(Target::Markets);

        let err = lotus.get("Failing", json!([])).await.unwrap_err();
        assert!(matches!(err, LotusError::Remote { .. }));
        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert_eq!(err.target(), Target::Markets);

        let err = lotus.get("Silent", json!([])).await.unwrap_err();
        assert!(matches!(err, LotusError::Empty { .. }));
        assert_eq!(err.kind(), ErrorKind::Protocol);

        // unknown methods are reported by the node as JSON-RPC errors
        let err = lotus.get("Nope", json!([])).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
    }

    #[tokio::test]
    async fn call_reports_shape_mismatch_as_semantic() {
        let node = MockNode::builder()
            .on("ChainHead", |_| Reply::result(json!({ "Height": "not a number" })))
            .spawn()
            .await;
        let err = node
            .lotus(Target::Daemon)
            .call::<types::TipSet>("ChainHead", json!([]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Semantic);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let info: ApiInfo = "token:/ip4/127.0.0.1/tcp/1/http".parse().unwrap();
        let err = Lotus::new(Target::Daemon, info)
            .get("ChainHead", json!([]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.target(), Target::Daemon);
    }
}
