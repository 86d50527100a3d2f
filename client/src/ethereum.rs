//! Ethereum JSON-RPC storage proof source.

use crate::chain::{StorageProof, StorageProofProvider};
use crate::codec::{parse_word, to_hex};
use crate::config::ClientConfig;
use crate::error::{Result, RoundError};
use crate::rpc::JsonRpcTransport;
use alloy_primitives::U256;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProofResponse {
    storage_proof: Vec<SlotProof>,
}

#[derive(Debug, Deserialize)]
struct SlotProof {
    value: String,
    proof: Vec<String>,
}

/// Ethereum RPC client
#[derive(Clone)]
pub struct EthereumRpcClient {
    transport: JsonRpcTransport,
}

impl EthereumRpcClient {
    /// Create a client for the configured Ethereum endpoint
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let url = config.ethereum_rpc_url.as_deref().ok_or_else(|| {
            RoundError::ClientConfig("No Ethereum RPC URL configured".to_string())
        })?;
        Ok(Self {
            transport: JsonRpcTransport::new(url, config)?,
        })
    }
}

#[async_trait]
impl StorageProofProvider for EthereumRpcClient {
    async fn get_storage_proof(
        &self,
        contract: &str,
        slot: U256,
        block_number: u64,
    ) -> Result<StorageProof> {
        debug!(
            "eth_getProof {} slot {} at block {}",
            contract,
            to_hex(slot),
            block_number
        );

        let result = self
            .transport
            .call(
                "eth_getProof",
                json!([
                    contract,
                    [format!("0x{}", hex::encode(slot.to_be_bytes::<32>()))],
                    to_hex(block_number),
                ]),
            )
            .await?;

        let response: ProofResponse = serde_json::from_value(result)?;
        decode_slot_proof(response)
    }
}

fn decode_slot_proof(response: ProofResponse) -> Result<StorageProof> {
    let slot = response
        .storage_proof
        .into_iter()
        .next()
        .ok_or_else(|| RoundError::InvalidResponse("eth_getProof returned no storage proof".to_string()))?;

    let nodes = slot
        .proof
        .iter()
        .map(|node| hex::decode(node.trim_start_matches("0x")))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(StorageProof {
        value: parse_word(&slot.value)?,
        nodes,
    })
}
