// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub mod config;
pub mod logger;

use crate::cli_shared::config::{AddressBook, Config};
use std::path::Path;

/// Reads `config.toml` and `addresses.toml` from the configuration folder.
/// Missing files are defaults.
pub fn read_config(folder: &Path) -> anyhow::Result<(Config, AddressBook)> {
    Ok((Config::load(folder)?, AddressBook::load(folder)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_config_default() {
        let folder = tempfile::tempdir().unwrap();
        let (config, addresses) = read_config(folder.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(addresses.aliases.is_empty());
    }

    #[test]
    fn read_config_from_missing_folder() {
        let (config, _) = read_config(Path::new("/nonexistent/farcaster")).unwrap();
        assert_eq!(config, Config::default());
    }
}
