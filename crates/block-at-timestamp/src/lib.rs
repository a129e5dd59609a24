//! Find the block closest to a timestamp on chains that can only be read by
//! block number.
//!
//! The search needs two reads, abstracted by [`ChainReader`]: the current
//! block number and a block by number. [`BlockSource`] provides them over an
//! alloy provider or over a bare JSON-RPC endpoint.
//!
//! ## Example
//!
//! ```no_run
//! use block_at_timestamp::{BlockSource, SearchOptions, U256, block_at_timestamp};
//!
//! # async fn example() -> block_at_timestamp::Result<()> {
//! let source: BlockSource = "http://localhost:8545".parse().expect("valid url");
//! let options = SearchOptions::new(60);
//!
//! let block = block_at_timestamp(&source, U256::from(1_700_000_000u64), &options).await?;
//! println!("block {} at {}", block.number, block.timestamp);
//! # Ok(())
//! # }
//! ```

pub mod block;
pub mod error;
pub mod search;
pub mod source;

#[cfg(test)]
mod mock;

// Re-export main types at crate root for convenience.
pub use block::{Block, Offset};
pub use error::{Error, NetworkError, Result};
pub use search::{
    Outcome, RATE_SCALE, SearchEvent, SearchObserver, SearchOptions, TracingObserver,
    block_at_timestamp, block_at_timestamp_with,
};
pub use source::{BlockSource, ChainReader, ProviderSource, RpcSource};

// Re-export alloy types that appear in our public API.
pub use alloy_primitives::U256;
