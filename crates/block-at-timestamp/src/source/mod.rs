//! Chain readers: the two reads the search needs, over either an alloy
//! provider or a bare JSON-RPC endpoint.

use std::{future::Future, str::FromStr};

use alloy_primitives::U256;
use alloy_provider::{DynProvider, Provider};
use serde_json::Value;
use url::Url;

use crate::{block::Block, error::NetworkError};

mod provider;
mod rpc;

pub use provider::ProviderSource;
pub use rpc::RpcSource;

/// Read access to a chain by block number.
pub trait ChainReader {
    /// Returns the latest block number known to the backend.
    fn current_block_number(&self) -> impl Future<Output = Result<U256, NetworkError>> + Send;

    /// Returns the block with the given number.
    fn block(&self, number: U256) -> impl Future<Output = Result<Block, NetworkError>> + Send;
}

/// A chain reader selected once from the shape of the backend.
#[derive(Debug)]
pub enum BlockSource {
    /// Reads through an alloy provider.
    Client(ProviderSource),
    /// Reads through raw JSON-RPC requests to a single endpoint.
    Rpc(RpcSource),
}

impl BlockSource {
    /// Wraps an alloy provider.
    pub fn from_provider(provider: impl Provider + 'static) -> Self {
        Self::Client(ProviderSource::new(provider))
    }

    /// Talks JSON-RPC to `url` directly.
    pub fn rpc(url: Url) -> Self {
        Self::Rpc(RpcSource::new(url))
    }
}

impl From<DynProvider> for BlockSource {
    fn from(provider: DynProvider) -> Self {
        Self::Client(ProviderSource::from(provider))
    }
}

impl From<Url> for BlockSource {
    fn from(url: Url) -> Self {
        Self::rpc(url)
    }
}

impl FromStr for BlockSource {
    type Err = url::ParseError;

    /// Parses an RPC endpoint URL.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::rpc(s.parse()?))
    }
}

impl ChainReader for BlockSource {
    async fn current_block_number(&self) -> Result<U256, NetworkError> {
        match self {
            Self::Client(source) => source.current_block_number().await,
            Self::Rpc(source) => source.current_block_number().await,
        }
    }

    async fn block(&self, number: U256) -> Result<Block, NetworkError> {
        match self {
            Self::Client(source) => source.block(number).await,
            Self::Rpc(source) => source.block(number).await,
        }
    }
}

/// Parses a JSON-RPC quantity: a `0x` hex string, a decimal string or a JSON number.
pub(crate) fn parse_quantity(value: &Value) -> Result<U256, NetworkError> {
    let invalid = || NetworkError::InvalidQuantity(value.to_string());
    match value {
        Value::String(s) => {
            let s = s.trim();
            let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                Some(hex) if !hex.is_empty() => U256::from_str_radix(hex, 16),
                Some(_) => return Err(invalid()),
                None if !s.is_empty() => U256::from_str_radix(s, 10),
                None => return Err(invalid()),
            };
            parsed.map_err(|_| invalid())
        }
        Value::Number(n) => n.as_u64().map(U256::from).ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity(&json!("0x4b7")).unwrap(), U256::from(1207));
        assert_eq!(parse_quantity(&json!("0X4B7")).unwrap(), U256::from(1207));
        assert_eq!(parse_quantity(&json!("1207")).unwrap(), U256::from(1207));
        assert_eq!(parse_quantity(&json!(1207)).unwrap(), U256::from(1207));
        assert_eq!(parse_quantity(&json!("0x0")).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_parse_quantity_beyond_u64() {
        let parsed = parse_quantity(&json!("0x10000000000000000")).unwrap();
        assert_eq!(parsed, U256::from(u64::MAX) + U256::from(1));
    }

    #[test]
    fn test_parse_quantity_rejects_garbage() {
        for value in [json!(""), json!("0x"), json!("0xzz"), json!(-1), json!(1.5), json!(null), json!({})] {
            assert!(matches!(
                parse_quantity(&value),
                Err(NetworkError::InvalidQuantity(_))
            ));
        }
    }

    #[test]
    fn test_block_source_from_str() {
        let source: BlockSource = "http://localhost:8545".parse().unwrap();
        let BlockSource::Rpc(rpc) = source else {
            panic!("expected an RPC source");
        };
        assert_eq!(rpc.url().as_str(), "http://localhost:8545/");
        assert!("not a url".parse::<BlockSource>().is_err());
    }
}
