//! Look up the block closest to a timestamp.
//!
//! Queries a node through the raw JSON-RPC reader, through an alloy
//! provider, or both, and prints the blocks found as JSON. Without a target,
//! looks for the block one week ago within one day.
//!
//! ```text
//! RPC_URL=http://localhost:8545 bat --seconds-ago 3600 --target-range-seconds 60
//! ```

use std::{
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

use alloy_provider::ProviderBuilder;
use anyhow::Context;
use block_at_timestamp::{Block, BlockSource, SearchOptions, U256, block_at_timestamp};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

use crate::config::Config;

mod config;

const SECONDS_IN_A_DAY: u64 = 60 * 60 * 24;
const SECONDS_IN_A_WEEK: u64 = 7 * SECONDS_IN_A_DAY;

/// Which backend(s) to query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Raw JSON-RPC requests.
    Rpc,
    /// An alloy provider.
    Client,
    /// Both, one after the other.
    Both,
}

#[derive(Parser, Debug)]
#[command(name = "bat")]
#[command(about = "Find the block whose timestamp is closest to a target")]
struct Cli {
    /// JSON-RPC endpoint of the node to query.
    #[arg(long, env = "RPC_URL")]
    rpc_url: Option<Url>,

    /// Target timestamp in seconds since the Unix epoch.
    #[arg(long, value_parser = parse_timestamp, conflicts_with = "seconds_ago")]
    timestamp: Option<U256>,

    /// Target as a number of seconds before now.
    #[arg(long)]
    seconds_ago: Option<u64>,

    /// Acceptable distance in seconds between the target and the block.
    #[arg(long)]
    target_range_seconds: Option<u64>,

    #[arg(long, value_enum, default_value_t = Backend::Both)]
    backend: Backend,

    /// Optional TOML config file.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Log search progress.
    #[arg(long, short)]
    verbose: bool,
}

fn parse_timestamp(s: &str) -> Result<U256, String> {
    s.parse::<U256>().map_err(|e| format!("invalid timestamp {s:?}: {e}"))
}

/// Blocks found per backend.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    rpc_res: Option<Block>,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider_res: Option<Block>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_directive = if cli.verbose {
        "info,block_at_timestamp=debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .init();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let rpc_url = cli
        .rpc_url
        .clone()
        .or(config.rpc_url)
        .context("Missing RPC URL: pass --rpc-url, set RPC_URL or add rpc-url to the config")?;

    let options = SearchOptions::new(
        cli.target_range_seconds
            .or(config.search.map(|s| s.target_range_seconds))
            .unwrap_or(SECONDS_IN_A_DAY),
    );

    let target = match (cli.timestamp, cli.seconds_ago) {
        (Some(timestamp), _) => timestamp,
        (None, seconds_ago) => {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .context("System clock is before the Unix epoch")?
                .as_secs();
            U256::from(now.saturating_sub(seconds_ago.unwrap_or(SECONDS_IN_A_WEEK)))
        }
    };

    info!(
        %rpc_url,
        %target,
        target_range_seconds = options.target_range_seconds,
        backend = ?cli.backend,
        "Looking up block"
    );

    let mut report = Report::default();

    if matches!(cli.backend, Backend::Rpc | Backend::Both) {
        let source = BlockSource::rpc(rpc_url.clone());
        report.rpc_res = Some(block_at_timestamp(&source, target, &options).await?);
    }

    if matches!(cli.backend, Backend::Client | Backend::Both) {
        let provider = ProviderBuilder::new().connect_http(rpc_url);
        let source = BlockSource::from_provider(provider);
        report.provider_res = Some(block_at_timestamp(&source, target, &options).await?);
    }

    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_timestamp_and_seconds_ago_conflict() {
        let result = Cli::try_parse_from([
            "bat",
            "--rpc-url",
            "http://localhost:8545",
            "--timestamp",
            "1700000000",
            "--seconds-ago",
            "60",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "bat",
            "--rpc-url",
            "http://localhost:8545",
            "--timestamp",
            "0x6553f100",
            "--target-range-seconds",
            "30",
            "--backend",
            "rpc",
        ])
        .unwrap();
        assert_eq!(cli.timestamp, Some(U256::from(1_700_000_000u64)));
        assert_eq!(cli.target_range_seconds, Some(30));
        assert_eq!(cli.backend, Backend::Rpc);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_report_skips_missing_backends() {
        let report = Report {
            rpc_res: Some(Block::new(U256::from(1), U256::from(2))),
            provider_res: None,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("rpcRes").is_some());
        assert!(json.get("providerRes").is_none());
    }
}
