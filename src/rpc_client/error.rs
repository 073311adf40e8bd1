// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::Target;
use serde_json::Value;

/// Where in the exchange a call went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ErrorKind {
    /// The node could not be reached, or did not answer with JSON.
    Transport,
    /// The node answered with a JSON-RPC error, or with nothing at all.
    Protocol,
    /// The node answered, but not with the document we expected.
    Semantic,
}

/// A failed Lotus API call. Every variant names the subsystem it came from.
#[derive(Debug, thiserror::Error)]
pub enum LotusError {
    #[error("{target}: failed to call {method}: {source}")]
    Transport {
        target: Target,
        method: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{target}: {method} did not return JSON: {source}")]
    Decode {
        target: Target,
        method: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{target}: {method} returned an error: {error}")]
    Remote {
        target: Target,
        method: String,
        error: Value,
    },
    #[error("{target}: {method} returned nothing, the API token could be incorrect")]
    Empty { target: Target, method: String },
    #[error("{target}: unexpected {method} result: {reason}")]
    Semantic {
        target: Target,
        method: String,
        reason: String,
    },
}

impl LotusError {
    pub fn target(&self) -> Target {
        match self {
            LotusError::Transport { target, .. }
            | LotusError::Decode { target, .. }
            | LotusError::Remote { target, .. }
            | LotusError::Empty { target, .. }
            | LotusError::Semantic { target, .. } => *target,
        }
    }

    pub fn method(&self) -> &str {
        match self {
            LotusError::Transport { method, .. }
            | LotusError::Decode { method, .. }
            | LotusError::Remote { method, .. }
            | LotusError::Empty { method, .. }
            | LotusError::Semantic { method, .. } => method,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LotusError::Transport { .. } | LotusError::Decode { .. } => ErrorKind::Transport,
            LotusError::Remote { .. } | LotusError::Empty { .. } => ErrorKind::Protocol,
            LotusError::Semantic { .. } => ErrorKind::Semantic,
        }
    }

    /// Builds a semantic error for a result that decoded but lacks something
    /// the caller needs.
    pub fn semantic(target: Target, method: &str, reason: impl Into<String>) -> Self {
        LotusError::Semantic {
            target,
            method: method.to_string(),
            reason: reason.into(),
        }
    }
}
