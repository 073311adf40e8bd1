// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use assert_cmd::{Command, cargo::cargo_bin_cmd};
use std::path::Path;
use tempfile::TempDir;

/// No node listens there, so connections are refused right away.
pub const UNREACHABLE_API: &str = "mock-token:/ip4/127.0.0.1/tcp/1/http";

/// The exporter with a config folder in a fresh temporary directory, and
/// every Lotus repository pointed inside it so that the host's nodes are
/// never picked up.
pub fn farcaster(config: &str) -> (Command, TempDir) {
    let temp_dir = tempfile::tempdir().expect("couldn't create temp dir");
    std::fs::write(temp_dir.path().join("config.toml"), config)
        .expect("couldn't write config.toml");
    let mut cmd = cargo_bin_cmd!("lotus-farcaster");
    cmd.env_remove("RUST_LOG")
        .env_remove("FARCASTER_LOG_LEVEL")
        .env("LOTUS_MINER_PATH", repo(temp_dir.path(), "miner"))
        .env("LOTUS_PATH", repo(temp_dir.path(), "daemon"))
        .env("LOTUS_MARKETS_PATH", repo(temp_dir.path(), "markets"))
        .arg("--farcaster-config-folder")
        .arg(temp_dir.path());
    (cmd, temp_dir)
}

fn repo(root: &Path, name: &str) -> String {
    root.join(name).to_string_lossy().into_owned()
}
