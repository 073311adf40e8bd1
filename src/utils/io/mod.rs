// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use anyhow::Context as _;
use std::{
    convert::Infallible,
    fmt,
    io::{self, Write as _},
    path::{Path, PathBuf},
    str::FromStr,
};

/// Converts a TOML file represented as a string to `S`
///
/// # Example
/// ```
/// use serde::Deserialize;
/// use farcaster::doctest_private::read_toml;
///
/// #[derive(Deserialize)]
/// struct Config {
///     name: String
/// };
///
/// let toml_string = "name = \"farcaster\"\n";
/// let config: Config = read_toml(toml_string).unwrap();
/// assert_eq!(config.name, "farcaster");
/// ```
pub fn read_toml<S>(toml_string: &str) -> anyhow::Result<S>
where
    for<'de> S: serde::de::Deserialize<'de>,
{
    let new_struct: S = toml::from_str(toml_string)?;
    Ok(new_struct)
}

/// Where the rendered metrics go. `-` is stdout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Output {
    #[default]
    Stdout,
    File(PathBuf),
}

impl FromStr for Output {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "-" => Output::Stdout,
            path => Output::File(path.into()),
        })
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Stdout => f.write_str("-"),
            Output::File(path) => path.display().fmt(f),
        }
    }
}

impl Output {
    /// Writes `contents` in one go. A file is written next to its
    /// destination first and renamed over it, so readers such as the
    /// node-exporter textfile collector never see a partial file.
    pub fn write(&self, contents: &str) -> anyhow::Result<()> {
        match self {
            Output::Stdout => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(contents.as_bytes())?;
                stdout.flush()?;
                Ok(())
            }
            Output::File(path) => write_atomically(path, contents.as_bytes()),
        }
    }
}

fn write_atomically(path: &Path, contents: &[u8]) -> anyhow::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("couldn't create a temporary file in {}", dir.display()))?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path)
        .with_context(|| format!("couldn't write {}", path.display()))?;
    Ok(())
}
