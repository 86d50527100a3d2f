//! Calldata encoding for round entrypoints.
//!
//! Every array is length-prefixed and every caller-supplied ordering is kept
//! as is. Nothing here sorts or deduplicates.

use crate::canonical::{flatten_params, param_words, strategy_index_words, vote_words};
use crate::codec::{string_to_word_sequence, to_hex};
use crate::error::{Result, RoundError};
use crate::types::{Calldata, ProposalVote};
use alloy_primitives::U256;
use tracing::debug;

/// `[proposer, byte_length, word_count, ...words]`
pub fn encode_propose(proposer: &str, metadata_uri: &str) -> Calldata {
    let sequence = string_to_word_sequence(metadata_uri);

    let mut calldata = Vec::with_capacity(3 + sequence.word_count());
    calldata.push(proposer.to_string());
    calldata.push(to_hex(sequence.byte_length));
    calldata.push(to_hex(sequence.word_count()));
    calldata.extend(sequence.words.iter().map(|w| to_hex(*w)));

    debug!(
        "Encoded propose calldata: {} bytes in {} words",
        sequence.byte_length,
        sequence.word_count()
    );
    calldata
}

/// `[proposer, proposal_id]`
pub fn encode_cancel(proposer: &str, proposal_id: U256) -> Calldata {
    vec![proposer.to_string(), to_hex(proposal_id)]
}

/// `[voter, vote_count, {id, power_low, power_high}*, strategy_count,
/// index*, param_count, param*]`
///
/// `strategy_params[i]` belongs to `strategy_indices[i]`.
pub fn encode_vote(
    voter: &str,
    votes: &[ProposalVote],
    strategy_indices: &[u16],
    strategy_params: &[Vec<String>],
) -> Result<Calldata> {
    if strategy_params.len() != strategy_indices.len() {
        return Err(RoundError::StrategyParamsLengthMismatch {
            indices: strategy_indices.len(),
            params: strategy_params.len(),
        });
    }

    // Parameters must be words the signed-message hash can also read.
    param_words(strategy_params)?;
    let params = flatten_params(strategy_params);

    let mut calldata = vec![voter.to_string(), to_hex(votes.len())];
    calldata.extend(vote_words(votes).into_iter().map(to_hex));
    calldata.push(to_hex(strategy_indices.len()));
    calldata.extend(strategy_index_words(strategy_indices).into_iter().map(to_hex));
    calldata.push(to_hex(params.len()));
    calldata.extend(params);

    debug!(
        "Encoded vote calldata: {} vote(s), {} strategy(ies), {} words",
        votes.len(),
        strategy_indices.len(),
        calldata.len()
    );
    Ok(calldata)
}
