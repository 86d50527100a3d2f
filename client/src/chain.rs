//! Interfaces to the chain-read and submission collaborators.
//!
//! The encoder only reads chain state; it never writes. Concrete JSON-RPC
//! implementations live in [`crate::starknet`] and [`crate::ethereum`].

use crate::codec::{selector_from_name, to_hex};
use crate::error::{Result, RoundError};
use crate::types::{Call, FeeEstimate, TransactionHash};
use alloy_primitives::U256;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use starknet_crypto::{pedersen_hash, FieldElement};

/// Read access to the chain the rounds live on
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Value stored at `key` in `contract`'s storage
    async fn get_storage_at(&self, contract: &str, key: U256) -> Result<U256>;

    /// Result of a read-only call to `entrypoint` on `contract`
    async fn call_contract(
        &self,
        contract: &str,
        entrypoint: &str,
        calldata: Vec<String>,
    ) -> Result<Vec<String>>;
}

/// Merkle-Patricia storage proof for a single L1 slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageProof {
    /// Slot value at the proven block
    pub value: U256,
    /// RLP-encoded trie nodes, root first
    pub nodes: Vec<Vec<u8>>,
}

/// Source of L1 storage proofs
#[async_trait]
pub trait StorageProofProvider: Send + Sync {
    /// Proof of `slot` in `contract` at `block_number`
    async fn get_storage_proof(
        &self,
        contract: &str,
        slot: U256,
        block_number: u64,
    ) -> Result<StorageProof>;
}

/// Fee estimation and execution of prepared calls, usually backed by a wallet
#[async_trait]
pub trait CallExecutor: Send + Sync {
    /// Estimate the fee for `call`
    async fn estimate_fee(&self, call: &Call) -> Result<FeeEstimate>;

    /// Execute `call`, paying at most `fee`
    async fn execute(&self, call: &Call, fee: &FeeEstimate) -> Result<TransactionHash>;
}

/// Storage address of a contract storage variable.
///
/// `pedersen(...pedersen(sn_keccak(name), key_0)..., key_n)`, reduced modulo
/// `2^251 - 256`. Every key must be a field element.
pub fn storage_var_address(name: &str, keys: &[U256]) -> Result<U256> {
    let address = keys
        .iter()
        .try_fold(to_field_element(selector_from_name(name))?, |address, key| {
            Ok::<_, RoundError>(pedersen_hash(&address, &to_field_element(*key)?))
        })?;

    let address = U256::from_be_bytes(address.to_bytes_be());
    let bound = (U256::from(1u8) << 251) - U256::from(256u16);
    Ok(if address >= bound { address - bound } else { address })
}

fn to_field_element(value: U256) -> Result<FieldElement> {
    FieldElement::from_bytes_be(&value.to_be_bytes::<32>())
        .map_err(|_| RoundError::InvalidFieldElement(to_hex(value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_var_without_keys_is_selector() {
        assert_eq!(
            storage_var_address("_voting_strategies", &[]).unwrap(),
            selector_from_name("_voting_strategies")
        );
    }

    #[test]
    fn test_storage_var_known_slot() {
        let slot = storage_var_address("_voting_strategies", &[U256::from(5u64)]).unwrap();
        assert_eq!(
            to_hex(slot),
            "0x54fc700e6f594f35ba8477f7fb2b836734a5329448d526cc4505d61f1608597"
        );
    }

    #[test]
    fn test_storage_var_keys_are_distinct() {
        let a = storage_var_address("_voting_strategies", &[U256::from(1u64)]).unwrap();
        let b = storage_var_address("_voting_strategies", &[U256::from(2u64)]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_storage_var_rejects_key_outside_field() {
        assert!(matches!(
            storage_var_address("_voting_strategies", &[U256::MAX]),
            Err(RoundError::InvalidFieldElement(_))
        ));
    }
}
