//! Starknet JSON-RPC reader for round and registry state.

use crate::chain::ChainReader;
use crate::codec::{parse_word, selector_from_name, to_hex};
use crate::config::ClientConfig;
use crate::error::{Result, RoundError};
use crate::rpc::JsonRpcTransport;
use alloy_primitives::U256;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, error, info};

/// Block all reads are pinned to
const BLOCK_ID: &str = "latest";

/// Starknet RPC client
#[derive(Clone)]
pub struct StarknetRpcClient {
    transport: JsonRpcTransport,
}

impl StarknetRpcClient {
    /// Create a client for the configured Starknet endpoint
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            transport: JsonRpcTransport::new(&config.starknet_rpc_url, config)?,
        })
    }

    /// Chain id reported by the node
    pub async fn chain_id(&self) -> Result<String> {
        let result = self.transport.call("starknet_chainId", json!([])).await?;
        result
            .as_str()
            .map(String::from)
            .ok_or_else(|| RoundError::InvalidResponse("chain id is not a string".to_string()))
    }

    /// Health check - verify connection to the Starknet node
    pub async fn health_check(&self) -> Result<bool> {
        debug!("Performing Starknet RPC health check");

        match self.chain_id().await {
            Ok(chain_id) => {
                info!("Starknet RPC health check passed (chain {})", chain_id);
                Ok(true)
            }
            Err(e) => {
                error!("Starknet RPC health check failed: {:?}", e);
                Err(e)
            }
        }
    }
}

fn felt(value: &Value) -> Result<U256> {
    let s = value
        .as_str()
        .ok_or_else(|| RoundError::InvalidResponse(format!("expected felt, got {}", value)))?;
    parse_word(s)
}

#[async_trait]
impl ChainReader for StarknetRpcClient {
    async fn get_storage_at(&self, contract: &str, key: U256) -> Result<U256> {
        debug!("Reading storage {} of {}", to_hex(key), contract);

        let result = self
            .transport
            .call(
                "starknet_getStorageAt",
                json!({
                    "contract_address": contract,
                    "key": to_hex(key),
                    "block_id": BLOCK_ID,
                }),
            )
            .await?;

        felt(&result)
    }

    async fn call_contract(
        &self,
        contract: &str,
        entrypoint: &str,
        calldata: Vec<String>,
    ) -> Result<Vec<String>> {
        debug!("Calling {} on {}", entrypoint, contract);

        let result = self
            .transport
            .call(
                "starknet_call",
                json!({
                    "request": {
                        "contract_address": contract,
                        "entry_point_selector": to_hex(selector_from_name(entrypoint)),
                        "calldata": calldata,
                    },
                    "block_id": BLOCK_ID,
                }),
            )
            .await?;

        let words = result.as_array().ok_or_else(|| {
            RoundError::InvalidResponse(format!("{} returned {} instead of a list", entrypoint, result))
        })?;
        words
            .iter()
            .map(|w| felt(w).map(to_hex))
            .collect()
    }
}
