use std::fmt;

use alloy_primitives::U256;
use alloy_provider::{DynProvider, Provider};

use super::ChainReader;
use crate::{block::Block, error::NetworkError};

/// Chain reader backed by an alloy provider.
///
/// The provider addresses blocks with `u64`, so numbers beyond that range
/// fail with [`NetworkError::Unaddressable`].
#[derive(Clone)]
pub struct ProviderSource {
    provider: DynProvider,
}

impl fmt::Debug for ProviderSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSource").finish_non_exhaustive()
    }
}

impl ProviderSource {
    /// Wraps any provider, erasing its concrete type.
    pub fn new(provider: impl Provider + 'static) -> Self {
        Self {
            provider: provider.erased(),
        }
    }

    /// Return the underlying provider.
    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }
}

impl From<DynProvider> for ProviderSource {
    fn from(provider: DynProvider) -> Self {
        Self { provider }
    }
}

impl ChainReader for ProviderSource {
    async fn current_block_number(&self) -> Result<U256, NetworkError> {
        Ok(U256::from(self.provider.get_block_number().await?))
    }

    async fn block(&self, number: U256) -> Result<Block, NetworkError> {
        let n = u64::try_from(number).map_err(|_| NetworkError::Unaddressable(number))?;
        let block = self
            .provider
            .get_block_by_number(n.into())
            .await?
            .ok_or(NetworkError::BlockNotFound(number))?;
        Ok(Block::new(number, U256::from(block.header.timestamp)))
    }
}
