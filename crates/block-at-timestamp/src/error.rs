//! Error types for block lookups.

use alloy_primitives::U256;
use alloy_transport::TransportError;
use thiserror::Error;

/// Errors returned by a timestamp search.
#[derive(Debug, Error)]
pub enum Error {
    /// The search options are invalid. Raised before any chain read.
    #[error("config error: {0}")]
    Config(String),

    /// A chain read failed. The search is aborted without a partial result.
    #[error(transparent)]
    Network(#[from] NetworkError),
}

impl Error {
    /// Returns `true` if the error was raised by the chain reader.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

/// Errors raised by a [`ChainReader`](crate::ChainReader) when a read does not succeed.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// HTTP request failed before a response was received.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success HTTP status.
    #[error("{method} failed with status {status}: {body}")]
    Status {
        /// JSON-RPC method that was called.
        method: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, if it could be read.
        body: String,
    },

    /// JSON-RPC error returned by the node.
    #[error("RPC error {code}: {message}")]
    Rpc {
        /// Error code.
        code: i64,
        /// Error message.
        message: String,
    },

    /// The response carried no `result`, or a null one.
    #[error("{method} returned no result: {response}")]
    MissingResult {
        /// JSON-RPC method that was called.
        method: &'static str,
        /// Raw response payload.
        response: String,
    },

    /// A quantity field could not be read as an integer.
    #[error("invalid quantity {0}")]
    InvalidQuantity(String),

    /// Failed to decode a response payload.
    #[error("parse error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The backend reported the block as absent.
    #[error("block {0} not found")]
    BlockNotFound(U256),

    /// The backend cannot address a block number this large.
    #[error("block {0} is out of range for the client")]
    Unaddressable(U256),

    /// Transport error from an alloy provider.
    #[error("provider error: {0}")]
    Transport(#[from] TransportError),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
