//! Voting strategies and their per-vote parameters.

use crate::chain::{ChainReader, StorageProof, StorageProofProvider};
use crate::codec::{address_to_b256, bytes_to_words, parse_word, split_uint256, to_hex};
use crate::constants::entrypoints::{GET_SNAPSHOT_BLOCK_NUMBER, GET_VOTING_STRATEGY_PARAMS};
use crate::error::{Result, RoundError};
use alloy_primitives::{keccak256, U256};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Chain access available to voting strategies while building parameters
#[derive(Clone)]
pub struct StrategyContext {
    /// Reader for the chain the round lives on
    pub chain: Arc<dyn ChainReader>,
    /// L1 storage proof source, when configured
    pub proofs: Option<Arc<dyn StorageProofProvider>>,
    /// Round (house strategy) contract address
    pub round: String,
}

/// Known voting strategy kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VotingStrategy {
    /// Fixed voting power, no parameters
    Vanilla,
    /// Voting power is an L1 token balance proven with a single storage slot proof
    EthereumBalanceOf,
}

impl VotingStrategy {
    /// Strategy type name
    pub fn strategy_type(&self) -> &'static str {
        match self {
            VotingStrategy::Vanilla => "vanilla",
            VotingStrategy::EthereumBalanceOf => "ethereum_balance_of",
        }
    }

    /// Parameters `voter` must submit for this strategy, registered at
    /// `address` under round-local `index`.
    pub async fn get_params(
        &self,
        address: &str,
        index: u16,
        voter: &str,
        context: &StrategyContext,
    ) -> Result<Vec<String>> {
        match self {
            VotingStrategy::Vanilla => Ok(Vec::new()),
            VotingStrategy::EthereumBalanceOf => {
                balance_of_params(address, index, voter, context).await
            }
        }
    }
}

async fn balance_of_params(
    address: &str,
    index: u16,
    voter: &str,
    context: &StrategyContext,
) -> Result<Vec<String>> {
    let proofs = context.proofs.as_ref().ok_or_else(|| {
        RoundError::ClientConfig(format!(
            "voting strategy {} needs an Ethereum RPC endpoint for storage proofs",
            address
        ))
    })?;

    let (stored, snapshot) = futures::try_join!(
        context.chain.call_contract(
            &context.round,
            GET_VOTING_STRATEGY_PARAMS,
            vec![to_hex(index)],
        ),
        context
            .chain
            .call_contract(&context.round, GET_SNAPSHOT_BLOCK_NUMBER, vec![]),
    )?;

    let [token, slot_index, ..] = stored.as_slice() else {
        return Err(RoundError::InvalidResponse(format!(
            "expected [contract, slot_index] for strategy {}, got {:?}",
            index, stored
        )));
    };
    let block = snapshot
        .first()
        .map(|b| parse_word(b))
        .transpose()?
        .ok_or_else(|| RoundError::InvalidResponse("empty snapshot block number".to_string()))?;
    let block: u64 = block
        .try_into()
        .map_err(|_| RoundError::InvalidResponse(format!("block number {} too large", block)))?;

    let key = mapping_slot_key(voter, parse_word(slot_index)?)?;
    debug!(
        "Fetching storage proof for {} slot {} at block {}",
        token,
        to_hex(key),
        block
    );
    let proof = proofs.get_storage_proof(token, key, block).await?;

    Ok(encode_storage_proof(key, &proof))
}

/// Storage key of `voter`'s entry in a Solidity mapping at `slot_index`:
/// `keccak256(pad32(voter) ++ pad32(slot_index))`.
pub fn mapping_slot_key(voter: &str, slot_index: U256) -> Result<U256> {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(address_to_b256(voter)?.as_slice());
    buf[32..].copy_from_slice(&slot_index.to_be_bytes::<32>());
    Ok(U256::from_be_bytes(keccak256(buf).0))
}

/// `[key_low, key_high, n, ...byte_lengths, n, ...word_counts, total_words, ...words]`
pub fn encode_storage_proof(key: U256, proof: &StorageProof) -> Vec<String> {
    let (key_low, key_high) = split_uint256(key);
    let node_words: Vec<Vec<u64>> = proof.nodes.iter().map(|n| bytes_to_words(n)).collect();
    let total_words: usize = node_words.iter().map(Vec::len).sum();

    let mut params = vec![to_hex(key_low), to_hex(key_high), to_hex(proof.nodes.len())];
    params.extend(proof.nodes.iter().map(|n| to_hex(n.len())));
    params.push(to_hex(node_words.len()));
    params.extend(node_words.iter().map(|w| to_hex(w.len())));
    params.push(to_hex(total_words));
    params.extend(node_words.iter().flatten().map(|w| to_hex(*w)));
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct StoredParams(HashMap<&'static str, Vec<String>>);

    #[async_trait]
    impl ChainReader for StoredParams {
        async fn get_storage_at(&self, _contract: &str, _key: U256) -> Result<U256> {
            Ok(U256::ZERO)
        }

        async fn call_contract(
            &self,
            _contract: &str,
            entrypoint: &str,
            _calldata: Vec<String>,
        ) -> Result<Vec<String>> {
            self.0
                .get(entrypoint)
                .cloned()
                .ok_or_else(|| RoundError::Rpc(format!("no {}", entrypoint)))
        }
    }

    struct FixedProof;

    #[async_trait]
    impl StorageProofProvider for FixedProof {
        async fn get_storage_proof(
            &self,
            contract: &str,
            _slot: U256,
            block_number: u64,
        ) -> Result<StorageProof> {
            assert_eq!(contract, "0x1f9840a85d5af5bf1d1762f925bdaddc4201f984");
            assert_eq!(block_number, 100);
            Ok(StorageProof {
                value: U256::from(5u64),
                nodes: vec![vec![1, 2, 3, 4, 5, 6, 7, 8, 9], vec![0xff]],
            })
        }
    }

    fn context(proofs: Option<Arc<dyn StorageProofProvider>>) -> StrategyContext {
        let mut stored = HashMap::new();
        stored.insert(
            GET_VOTING_STRATEGY_PARAMS,
            vec![
                "0x1f9840a85d5af5bf1d1762f925bdaddc4201f984".to_string(),
                "0x4".to_string(),
            ],
        );
        stored.insert(GET_SNAPSHOT_BLOCK_NUMBER, vec!["0x64".to_string()]);
        StrategyContext {
            chain: Arc::new(StoredParams(stored)),
            proofs,
            round: "0x500".to_string(),
        }
    }

    #[tokio::test]
    async fn test_vanilla_has_no_params() {
        let params = VotingStrategy::Vanilla
            .get_params("0x301", 0, "0xabc", &context(None))
            .await
            .unwrap();
        assert!(params.is_empty());
    }

    #[tokio::test]
    async fn test_balance_of_params() {
        let voter = "0x000000000000000000000000000000000000dead";
        let params = VotingStrategy::EthereumBalanceOf
            .get_params("0x302", 1, voter, &context(Some(Arc::new(FixedProof))))
            .await
            .unwrap();

        let key = mapping_slot_key(voter, U256::from(4u64)).unwrap();
        let (low, high) = split_uint256(key);
        assert_eq!(params[0], to_hex(low));
        assert_eq!(params[1], to_hex(high));
        assert_eq!(
            &params[2..],
            &[
                "0x2",
                "0x9",
                "0x1",
                "0x2",
                "0x2",
                "0x1",
                "0x3",
                "0x807060504030201",
                "0x9",
                "0xff"
            ]
        );
    }

    #[tokio::test]
    async fn test_balance_of_requires_proof_provider() {
        let result = VotingStrategy::EthereumBalanceOf
            .get_params("0x302", 1, "0xabc", &context(None))
            .await;
        assert!(matches!(result, Err(RoundError::ClientConfig(_))));
    }

    #[test]
    fn test_mapping_slot_key_matches_solidity_layout() {
        let voter = "0x00000000000000000000000000000000000000aa";
        let mut buf = [0u8; 64];
        buf[31] = 0xaa;
        buf[63] = 0x02;
        let expected = U256::from_be_bytes(keccak256(buf).0);
        assert_eq!(mapping_slot_key(voter, U256::from(2u64)).unwrap(), expected);
    }
}
