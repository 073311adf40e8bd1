// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod actors;
mod address;
mod bitfield;
mod cli;
mod cli_shared;
mod collector;
mod deadlines;
mod metrics;
mod power;
mod rpc_client;
#[cfg(test)]
mod test_utils;
mod utils;

/// These items are semver-exempt, and exist for farcaster author use only
// We want to have doctests, but don't want our internals to be public because:
// - We don't want to be concerned with library compat
//   (We want our cargo semver to be _for the command line_).
// - We don't want to mistakenly export items which we never actually use.
#[doc(hidden)]
pub mod doctest_private {
    pub use crate::utils::io::read_toml;
}

pub use cli::main::main as farcaster_main;
