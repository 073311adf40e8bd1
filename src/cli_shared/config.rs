// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::rpc_client::ApiInfo;
use crate::utils::io::read_toml;
use ahash::HashMap;
use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const ADDRESSES_FILE_NAME: &str = "addresses.toml";
pub const DEFAULT_CONFIG_FOLDER_NAME: &str = ".lotus-exporter-farcaster";

/// `~/.lotus-exporter-farcaster`, or the relative folder when there is no
/// home directory.
pub fn default_config_folder() -> PathBuf {
    match directories::BaseDirs::new() {
        Some(dirs) => dirs.home_dir().join(DEFAULT_CONFIG_FOLDER_NAME),
        None => PathBuf::from(DEFAULT_CONFIG_FOLDER_NAME),
    }
}

/// Reads `path` as TOML, or returns the default value when it doesn't exist.
fn read_optional_toml<T>(path: &Path) -> anyhow::Result<T>
where
    T: Default + for<'de> Deserialize<'de>,
{
    match std::fs::read_to_string(path) {
        Ok(toml) => read_toml(&toml).with_context(|| format!("malformed {}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e).with_context(|| format!("couldn't read {}", path.display())),
    }
}

/// Collection phases that can be turned off. The chain, miner, power,
/// network and worker phases always run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Collectors {
    pub sectors: bool,
    pub deadlines: bool,
    pub storage: bool,
    pub market: bool,
    pub mpool: bool,
}

impl Default for Collectors {
    fn default() -> Self {
        Self {
            sectors: true,
            deadlines: true,
            storage: true,
            market: true,
            mpool: true,
        }
    }
}

/// `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `<token>:<multiaddr>` of the miner API
    pub miner_api: Option<String>,
    pub daemon_api: Option<String>,
    pub markets_api: Option<String>,
    pub collectors: Collectors,
}

impl Config {
    pub fn load(folder: &Path) -> anyhow::Result<Self> {
        read_optional_toml(&folder.join(CONFIG_FILE_NAME))
    }

    /// Endpoints from the configured API strings, falling back to the node
    /// repositories in `repos`.
    pub fn endpoints(&self, repos: &RepoPaths) -> anyhow::Result<Endpoints> {
        let miner = endpoint(self.miner_api.as_deref(), &repos.miner)
            .context("couldn't find the miner API")?;
        let daemon = endpoint(self.daemon_api.as_deref(), &repos.daemon)
            .context("couldn't find the daemon API")?;
        let markets = match (&self.markets_api, repos.markets.join("api").exists()) {
            (Some(api), _) => Some(
                api.parse()
                    .context("couldn't find the markets API")?,
            ),
            (None, true) => Some(
                ApiInfo::from_repo(&repos.markets).context("couldn't find the markets API")?,
            ),
            (None, false) => None,
        };
        Ok(Endpoints {
            miner,
            daemon,
            markets,
        })
    }
}

fn endpoint(api: Option<&str>, repo: &Path) -> anyhow::Result<ApiInfo> {
    match api {
        Some(api) => api.parse(),
        None => ApiInfo::from_repo(repo),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub miner: ApiInfo,
    pub daemon: ApiInfo,
    /// [`None`] when the markets subsystem runs inside the miner.
    pub markets: Option<ApiInfo>,
}

/// Lotus repositories, holding the `api` and `token` files of each node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoPaths {
    pub miner: PathBuf,
    pub daemon: PathBuf,
    pub markets: PathBuf,
}

impl RepoPaths {
    /// `LOTUS_MINER_PATH`, `LOTUS_PATH` and `LOTUS_MARKETS_PATH`, defaulting to
    /// `~/.lotusminer`, `~/.lotus` and `~/.lotusmarkets`.
    pub fn from_env() -> Self {
        let home = directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().to_path_buf())
            .unwrap_or_default();
        let repo = |var: &str, default: &str| {
            std::env::var_os(var)
                .map(PathBuf::from)
                .unwrap_or_else(|| home.join(default))
        };
        Self {
            miner: repo("LOTUS_MINER_PATH", ".lotusminer"),
            daemon: repo("LOTUS_PATH", ".lotus"),
            markets: repo("LOTUS_MARKETS_PATH", ".lotusmarkets"),
        }
    }
}

/// `addresses.toml`: display names of known addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AddressBook {
    pub aliases: HashMap<String, String>,
}

impl AddressBook {
    pub fn load(folder: &Path) -> anyhow::Result<Self> {
        read_optional_toml(&folder.join(ADDRESSES_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write_repo(dir: &Path, api: &str, token: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join("api"), api).unwrap();
        std::fs::write(dir.join("token"), token).unwrap();
    }

    fn repos(root: &Path) -> RepoPaths {
        RepoPaths {
            miner: root.join("miner"),
            daemon: root.join("daemon"),
            markets: root.join("markets"),
        }
    }

    #[test]
    fn missing_files_are_defaults() {
        let folder = tempfile::tempdir().unwrap();
        assert_eq!(Config::load(folder.path()).unwrap(), Config::default());
        assert!(AddressBook::load(folder.path()).unwrap().aliases.is_empty());
        assert!(Config::default().collectors.sectors);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let folder = tempfile::tempdir().unwrap();
        std::fs::write(folder.path().join(CONFIG_FILE_NAME), "miner_api = [").unwrap();
        assert!(Config::load(folder.path()).is_err());
    }

    #[test]
    fn partial_config() {
        let folder = tempfile::tempdir().unwrap();
        std::fs::write(
            folder.path().join(CONFIG_FILE_NAME),
            r#"
            daemon_api = "token:/ip4/10.0.0.2/tcp/1234/http"

            [collectors]
            deadlines = false
            "#,
        )
        .unwrap();
        let config = Config::load(folder.path()).unwrap();
        assert_eq!(
            config.daemon_api.as_deref(),
            Some("token:/ip4/10.0.0.2/tcp/1234/http")
        );
        assert!(config.miner_api.is_none());
        assert!(!config.collectors.deadlines);
        assert!(config.collectors.market);
    }

    #[test]
    fn aliases() {
        let folder = tempfile::tempdir().unwrap();
        std::fs::write(
            folder.path().join(ADDRESSES_FILE_NAME),
            "[aliases]\nf01234 = \"owner\"\n",
        )
        .unwrap();
        let book = AddressBook::load(folder.path()).unwrap();
        assert_eq!(book.aliases.get("f01234").map(String::as_str), Some("owner"));
    }

    #[test]
    fn endpoints_fall_back_to_repositories() {
        let root = tempfile::tempdir().unwrap();
        let repos = repos(root.path());
        write_repo(&repos.miner, "/ip4/127.0.0.1/tcp/2345/http", "miner-token\n");
        write_repo(&repos.daemon, "/ip4/127.0.0.1/tcp/1234/http", "daemon-token\n");

        let config = Config {
            daemon_api: Some("other:/ip4/10.0.0.2/tcp/1234/http".into()),
            ..Default::default()
        };
        let endpoints = config.endpoints(&repos).unwrap();
        assert_eq!(endpoints.miner.url.as_str(), "http://127.0.0.1:2345/rpc/v0");
        assert_eq!(endpoints.miner.token.as_deref(), Some("miner-token"));
        assert_eq!(endpoints.daemon.token.as_deref(), Some("other"));
        // no markets repository, markets are served by the miner
        assert_eq!(endpoints.markets, None);

        write_repo(&repos.markets, "/ip4/127.0.0.1/tcp/2346/http", "markets-token");
        let endpoints = config.endpoints(&repos).unwrap();
        assert_eq!(
            endpoints.markets.unwrap().url.as_str(),
            "http://127.0.0.1:2346/rpc/v0"
        );
    }

    #[test]
    fn missing_endpoint_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let err = Config::default().endpoints(&repos(root.path())).unwrap_err();
        assert!(err.to_string().contains("miner"));
    }
}
