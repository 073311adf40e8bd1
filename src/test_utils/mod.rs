// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! An in-process stand-in for a Lotus JSON-RPC endpoint.

use crate::rpc_client::{API_PATH, ApiInfo, JSON_RPC_ID, Lotus, METHOD_NAMESPACE, Target};
use ahash::HashMap;
use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use rand::Rng as _;
use serde_json::{Value, json};
use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::task::JoinHandle;

pub const MOCK_TOKEN: &str = "mock-token";

/// Code CID of the storage miner actor in [`actor_code_table`].
pub const MINER_CODE: &str = "bafk2bzaceajmcp6ekaozqidzapldbf4td2yzfvpk37zarqwqdcxcglse4de7e";
pub const ACCOUNT_CODE: &str = "bafk2bzacedhperq2oyj5hkckeowrcslhqcmuz346c4oj5mvjevor7bxdrrrpa";
pub const EVM_CODE: &str = "bafk2bzacedaqfsyhr232rrm3mxbwqlehryyyttdjnodatdmmlcb5bdinefnio";

/// A `StateActorCodeCIDs` result.
pub fn actor_code_table() -> Value {
    json!({
        "storageminer": { "/": MINER_CODE },
        "account": { "/": ACCOUNT_CODE },
        "evm": { "/": EVM_CODE },
    })
}

/// What the mock answers to a call.
#[derive(Debug, Clone)]
pub enum Reply {
    Result(Value),
    Error(Value),
    /// `401` with an empty body, which is what Lotus does on a bad token.
    Empty,
    /// A body that isn't JSON.
    Garbage,
}

impl Reply {
    pub fn result(value: Value) -> Self {
        Reply::Result(value)
    }

    pub fn error(code: i64, message: &str) -> Self {
        Reply::Error(json!({ "code": code, "message": message }))
    }

    fn into_response(self) -> Response {
        match self {
            Reply::Result(result) => axum::Json(json!({
                "jsonrpc": "2.0",
                "result": result,
                "id": JSON_RPC_ID,
            }))
            .into_response(),
            Reply::Error(error) => axum::Json(json!({
                "jsonrpc": "2.0",
                "error": error,
                "id": JSON_RPC_ID,
            }))
            .into_response(),
            Reply::Empty => StatusCode::UNAUTHORIZED.into_response(),
            Reply::Garbage => (StatusCode::OK, "<html>502 Bad Gateway</html>").into_response(),
        }
    }
}

type Handler = Arc<dyn Fn(&[Value]) -> Reply + Send + Sync>;

#[derive(Default)]
pub struct MockNodeBuilder {
    handlers: HashMap<String, Handler>,
    random_delay: Option<Duration>,
}

impl MockNodeBuilder {
    /// Answers `method` (without the `Filecoin.` prefix) with `handler`,
    /// which is given the positional parameters.
    pub fn on(
        mut self,
        method: &str,
        handler: impl Fn(&[Value]) -> Reply + Send + Sync + 'static,
    ) -> Self {
        self.handlers.insert(method.to_string(), Arc::new(handler));
        self
    }

    /// Delays every answer by up to `max`, so that concurrent calls complete
    /// out of order.
    pub fn random_delay(mut self, max: Duration) -> Self {
        self.random_delay = Some(max);
        self
    }

    pub async fn spawn(self) -> MockNode {
        let shared = Arc::new(Shared {
            handlers: self.handlers,
            random_delay: self.random_delay,
            calls: Mutex::default(),
            authorization: Mutex::default(),
        });
        let app = Router::new()
            .route(API_PATH, post(rpc))
            .with_state(shared.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("couldn't bind mock node");
        let addr = listener.local_addr().expect("mock node has no address");
        let server = tokio::spawn(async move {
            axum::serve(listener, app.into_make_service())
                .await
                .expect("mock node crashed");
        });
        MockNode {
            addr,
            shared,
            server,
        }
    }
}

struct Shared {
    handlers: HashMap<String, Handler>,
    random_delay: Option<Duration>,
    calls: Mutex<HashMap<String, usize>>,
    authorization: Mutex<Option<String>>,
}

async fn rpc(State(shared): State<Arc<Shared>>, headers: HeaderMap, body: Bytes) -> Response {
    let Ok(body) = serde_json::from_slice::<Value>(&body) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    *shared.authorization.lock().unwrap() = headers
        .get(header::AUTHORIZATION)
        .and_then(|it| it.to_str().ok())
        .map(String::from);

    let method = body["method"].as_str().unwrap_or_default();
    let method = method.strip_prefix(METHOD_NAMESPACE).unwrap_or(method);
    *shared
        .calls
        .lock()
        .unwrap()
        .entry(method.to_string())
        .or_default() += 1;

    if let Some(max) = shared.random_delay {
        let millis = rand::thread_rng().gen_range(0..=max.as_millis());
        tokio::time::sleep(Duration::from_millis(millis as u64)).await;
    }

    let params = body["params"].as_array().cloned().unwrap_or_default();
    match shared.handlers.get(method) {
        Some(handler) => handler(&params),
        None => Reply::error(-32601, &format!("method '{METHOD_NAMESPACE}{method}' not found")),
    }
    .into_response()
}

/// A running mock node. The server stops when this is dropped.
pub struct MockNode {
    addr: SocketAddr,
    shared: Arc<Shared>,
    server: JoinHandle<()>,
}

impl MockNode {
    pub fn builder() -> MockNodeBuilder {
        MockNodeBuilder::default()
    }

    pub fn api_info(&self) -> ApiInfo {
        format!(
            "{MOCK_TOKEN}:/ip4/{}/tcp/{}/http",
            self.addr.ip(),
            self.addr.port()
        )
        .parse()
        .expect("mock node address is a valid multiaddr")
    }

    pub fn lotus(&self, target: Target) -> Lotus {
        Lotus::new(target, self.api_info())
    }

    /// How many times `method` was called.
    pub fn calls(&self, method: &str) -> usize {
        self.shared
            .calls
            .lock()
            .unwrap()
            .get(method)
            .copied()
            .unwrap_or_default()
    }

    pub fn total_calls(&self) -> usize {
        self.shared.calls.lock().unwrap().values().sum()
    }

    pub fn last_authorization(&self) -> Option<String> {
        self.shared.authorization.lock().unwrap().clone()
    }
}

impl Drop for MockNode {
    fn drop(&mut self) {
        self.server.abort();
    }
}
