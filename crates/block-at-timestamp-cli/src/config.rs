//! Optional TOML configuration for the `bat` binary.

use std::path::Path;

use anyhow::Context;
use block_at_timestamp::SearchOptions;
use serde::{Deserialize, Serialize};
use url::Url;

/// Configuration loaded from a TOML file. Command-line flags take precedence.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct Config {
    /// JSON-RPC endpoint of the node to query.
    pub(crate) rpc_url: Option<Url>,
    /// Search options.
    pub(crate) search: Option<SearchOptions>,
}

impl Config {
    /// Load config from a TOML file.
    pub(crate) fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let string = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {path:?}"))?;
        Self::from_toml_str(&string)
    }

    /// Parse config from TOML string.
    pub(crate) fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        toml_edit::de::from_str(s).with_context(|| format!("Failed to deserialize TOML config:\n{s}"))
    }
}
