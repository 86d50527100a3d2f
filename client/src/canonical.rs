//! Canonical flattening of vote data.
//!
//! The vote calldata and the signed vote message must agree word for word:
//! the on-chain verifier rebuilds the signed hashes from the submitted
//! calldata. Both paths flatten through the functions in this module.

use crate::codec::{parse_word, split_uint256};
use crate::error::Result;
use crate::types::ProposalVote;
use alloy_primitives::{keccak256, B256, U256};

/// Flatten votes into `[proposal_id, power_low, power_high]*`, in order.
pub fn vote_words(votes: &[ProposalVote]) -> Vec<U256> {
    votes
        .iter()
        .flat_map(|vote| {
            let (low, high) = split_uint256(vote.voting_power);
            [U256::from(vote.proposal_id), U256::from(low), U256::from(high)]
        })
        .collect()
}

/// Strategy indices as words, in order.
pub fn strategy_index_words(indices: &[u16]) -> Vec<U256> {
    indices.iter().map(|index| U256::from(*index)).collect()
}

/// Concatenate per-strategy parameter lists in their original order.
pub fn flatten_params(params: &[Vec<String>]) -> Vec<String> {
    params.iter().flatten().cloned().collect()
}

/// Flattened strategy parameters parsed as words.
pub fn param_words(params: &[Vec<String>]) -> Result<Vec<U256>> {
    params.iter().flatten().map(|p| parse_word(p)).collect()
}

/// keccak-256 over the 32-byte big-endian encoding of each word.
pub fn hash_words(words: &[U256]) -> B256 {
    let mut buf = Vec::with_capacity(words.len() * 32);
    for word in words {
        buf.extend_from_slice(&word.to_be_bytes::<32>());
    }
    keccak256(buf)
}

/// Hash of the flattened vote list.
pub fn proposal_votes_hash(votes: &[ProposalVote]) -> B256 {
    hash_words(&vote_words(votes))
}

/// Hash of the strategy index list.
pub fn voting_strategies_hash(indices: &[u16]) -> B256 {
    hash_words(&strategy_index_words(indices))
}

/// Hash of the flattened strategy parameter lists.
pub fn voting_strategy_params_hash(params: &[Vec<String>]) -> Result<B256> {
    Ok(hash_words(&param_words(params)?))
}
