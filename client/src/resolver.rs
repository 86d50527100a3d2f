//! Voting strategy resolution.
//!
//! A vote names its strategies by round-local index. Turning an index into a
//! strategy address takes two reads: the round's `_voting_strategies` storage
//! maps the index to a strategy hash, and the strategy registry contract maps
//! the hash to an address. Each hop runs for all indices at once and the
//! results come back in index order, whatever order the reads finish in.

use crate::chain::{storage_var_address, ChainReader, StorageProofProvider};
use crate::codec::{normalize_address, to_hex};
use crate::constants::entrypoints::GET_VOTING_STRATEGY;
use crate::constants::VOTING_STRATEGIES_STORAGE_VAR;
use crate::error::{Result, RoundError};
use crate::strategies::{StrategyContext, StrategyRegistry};
use alloy_primitives::U256;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, info};

/// Resolves voting strategy addresses and parameters for a round
#[derive(Clone)]
pub struct VotingStrategyResolver {
    chain: Arc<dyn ChainReader>,
    proofs: Option<Arc<dyn StorageProofProvider>>,
    registry: Arc<StrategyRegistry>,
    strategy_registry_contract: String,
}

impl VotingStrategyResolver {
    /// Create a resolver reading through `chain`
    pub fn new(
        chain: Arc<dyn ChainReader>,
        proofs: Option<Arc<dyn StorageProofProvider>>,
        registry: Arc<StrategyRegistry>,
        strategy_registry_contract: impl Into<String>,
    ) -> Self {
        Self {
            chain,
            proofs,
            registry,
            strategy_registry_contract: strategy_registry_contract.into(),
        }
    }

    /// Addresses of the strategies at `indices` on `round`, in index order.
    pub async fn resolve_addresses(&self, round: &str, indices: &[u16]) -> Result<Vec<String>> {
        info!(
            "Resolving {} voting strategy address(es) for round {}",
            indices.len(),
            round
        );

        let slots = indices
            .iter()
            .map(|index| storage_var_address(VOTING_STRATEGIES_STORAGE_VAR, &[U256::from(*index)]))
            .collect::<Result<Vec<_>>>()?;

        let hashes = try_join_all(
            slots
                .into_iter()
                .map(|slot| self.chain.get_storage_at(round, slot)),
        )
        .await?;

        let results = try_join_all(hashes.iter().map(|hash| {
            self.chain.call_contract(
                &self.strategy_registry_contract,
                GET_VOTING_STRATEGY,
                vec![to_hex(*hash)],
            )
        }))
        .await?;

        let addresses = results
            .into_iter()
            .zip(indices)
            .map(|(result, index)| {
                let address = result.first().ok_or_else(|| {
                    RoundError::InvalidResponse(format!(
                        "registry returned no address for strategy index {}",
                        index
                    ))
                })?;
                normalize_address(address)
            })
            .collect::<Result<Vec<_>>>()?;

        debug!("Resolved voting strategies: {:?}", addresses);
        Ok(addresses)
    }

    /// Parameters for each strategy in `addresses` (paired with `indices`),
    /// in input order.
    pub async fn resolve_params(
        &self,
        round: &str,
        addresses: &[String],
        indices: &[u16],
        voter: &str,
    ) -> Result<Vec<Vec<String>>> {
        if addresses.len() != indices.len() {
            return Err(RoundError::StrategyParamsLengthMismatch {
                indices: indices.len(),
                params: addresses.len(),
            });
        }

        // Fail on unknown strategies before any network traffic.
        let strategies = addresses
            .iter()
            .map(|address| self.registry.voting_strategy(address))
            .collect::<Result<Vec<_>>>()?;

        let context = StrategyContext {
            chain: self.chain.clone(),
            proofs: self.proofs.clone(),
            round: round.to_string(),
        };

        let params = try_join_all(
            strategies
                .iter()
                .zip(addresses)
                .zip(indices)
                .map(|((strategy, address), index)| {
                    strategy.get_params(address, *index, voter, &context)
                }),
        )
        .await?;

        debug!(
            "Resolved {} parameter word(s) across {} strategy(ies)",
            params.iter().map(Vec::len).sum::<usize>(),
            params.len()
        );
        Ok(params)
    }

    /// Addresses and parameters for `indices` in one pass.
    pub async fn resolve(
        &self,
        round: &str,
        indices: &[u16],
        voter: &str,
    ) -> Result<Vec<Vec<String>>> {
        let addresses = self.resolve_addresses(round, indices).await?;
        self.resolve_params(round, &addresses, indices, voter).await
    }
}
