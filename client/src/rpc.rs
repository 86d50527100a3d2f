//! JSON-RPC 2.0 transport shared by the Starknet and Ethereum clients.

use crate::config::ClientConfig;
use crate::error::{Result, RoundError};
use crate::retry::RetryStrategy;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error};

/// JSON-RPC request ID type
type RequestId = u64;

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: RequestId,
    method: &'a str,
    params: &'a Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// JSON-RPC client for one endpoint
#[derive(Clone)]
pub struct JsonRpcTransport {
    client: Client,
    url: String,
    retry_strategy: RetryStrategy,
    request_id: Arc<AtomicU64>,
}

impl JsonRpcTransport {
    /// Create a transport for `url` with the timeout and retry settings in `config`
    pub fn new(url: impl Into<String>, config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(RoundError::Network)?;

        Ok(Self {
            client,
            url: url.into(),
            retry_strategy: RetryStrategy::from_config(config),
            request_id: Arc::new(AtomicU64::new(1)),
        })
    }

    /// Endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }

    fn next_request_id(&self) -> RequestId {
        self.request_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Call `method` and return its `result` member
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_request_id(),
            method,
            params: &params,
        };

        debug!("RPC request: {} (id: {})", method, request.id);

        self.retry_strategy
            .retry(|| async {
                let response = self
                    .client
                    .post(&self.url)
                    .json(&request)
                    .send()
                    .await
                    .map_err(RoundError::Network)?;

                let status = response.status();
                if !status.is_success() {
                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    return Err(RoundError::Rpc(format!("HTTP {}: {}", status, error_text)));
                }

                let rpc_response: JsonRpcResponse = response
                    .json()
                    .await
                    .map_err(|e| RoundError::InvalidResponse(e.to_string()))?;

                if let Some(error) = rpc_response.error {
                    error!("RPC error from {}: {} (code: {})", method, error.message, error.code);
                    return Err(RoundError::Rpc(format!(
                        "{} (code: {})",
                        error.message, error.code
                    )));
                }

                rpc_response.result.ok_or_else(|| {
                    RoundError::InvalidResponse(format!("Missing result in {} response", method))
                })
            })
            .await
    }
}
