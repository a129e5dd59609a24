//! Raw JSON-RPC chain reader.

use std::sync::atomic::{AtomicU64, Ordering};

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::trace;
use url::Url;

use super::{ChainReader, parse_quantity};
use crate::{block::Block, error::NetworkError};

/// JSON-RPC request structure.
#[derive(Debug, Clone, Serialize)]
struct JsonRpcRequest<T> {
    jsonrpc: &'static str,
    method: &'static str,
    params: T,
    id: u64,
}

/// JSON-RPC response structure.
#[derive(Debug, Clone, Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

/// JSON-RPC error structure.
#[derive(Debug, Clone, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Execution layer JSON-RPC reader over HTTP.
///
/// Request ids come from a shared atomic counter, so one source can serve
/// concurrent searches.
#[derive(Debug)]
pub struct RpcSource {
    url: Url,
    http_client: reqwest::Client,
    next_id: AtomicU64,
}

impl RpcSource {
    /// Create a new RPC source.
    pub fn new(url: Url) -> Self {
        Self::with_client(url, reqwest::Client::new())
    }

    /// Create a new RPC source with a custom [`reqwest::Client`].
    pub fn with_client(url: Url, http_client: reqwest::Client) -> Self {
        Self {
            url,
            http_client,
            next_id: AtomicU64::new(0),
        }
    }

    /// Return url of the endpoint.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Send a JSON-RPC request and return its non-null `result`.
    async fn request<P: Serialize>(
        &self,
        method: &'static str,
        params: P,
    ) -> Result<Value, NetworkError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        };
        trace!(method, id = request.id, url = %self.url, "Sending JSON-RPC request");

        let response = self
            .http_client
            .post(self.url.clone())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::Status {
                method,
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body = response.text().await?;
        let rpc_response: JsonRpcResponse = serde_json::from_str(&body)?;

        if let Some(error) = rpc_response.error {
            return Err(NetworkError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        match rpc_response.result {
            Some(result) if !result.is_null() => Ok(result),
            _ => Err(NetworkError::MissingResult {
                method,
                response: body,
            }),
        }
    }
}

impl ChainReader for RpcSource {
    async fn current_block_number(&self) -> Result<U256, NetworkError> {
        let result = self.request("eth_blockNumber", json!([])).await?;
        parse_quantity(&result)
    }

    async fn block(&self, number: U256) -> Result<Block, NetworkError> {
        let result = self
            .request("eth_getBlockByNumber", (format!("0x{number:x}"), false))
            .await?;
        let timestamp = result.get("timestamp").ok_or_else(|| {
            NetworkError::InvalidQuantity(format!("missing timestamp in {result}"))
        })?;
        Ok(Block::new(number, parse_quantity(timestamp)?))
    }
}
