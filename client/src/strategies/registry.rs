//! Address → strategy lookup tables.

use super::{AuthStrategy, VotingStrategy};
use crate::codec::normalize_address;
use crate::config::ClientConfig;
use crate::constants::Deployment;
use crate::error::{Result, RoundError};
use std::collections::HashMap;
use tracing::debug;

/// Strategy implementations keyed by normalized address.
///
/// Built once per client and shared read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrategyRegistry {
    auth: HashMap<String, AuthStrategy>,
    voting: HashMap<String, VotingStrategy>,
}

impl StrategyRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the default strategies of a deployment
    pub fn for_deployment(deployment: &Deployment) -> Result<Self> {
        Self::new()
            .with_auth_strategy(deployment.vanilla_auth, AuthStrategy::Vanilla)?
            .with_auth_strategy(deployment.ethereum_sig_auth, AuthStrategy::EthereumSig)?
            .with_voting_strategy(deployment.vanilla_voting, VotingStrategy::Vanilla)?
            .with_voting_strategy(
                deployment.ethereum_balance_of_voting,
                VotingStrategy::EthereumBalanceOf,
            )
    }

    /// Deployment defaults for the configured network, overridden by the
    /// strategies registered in the config.
    ///
    /// Networks without a published deployment start empty. Overrides are
    /// applied in address order.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let mut registry = match config.network.deployment() {
            Some(deployment) => Self::for_deployment(deployment)?,
            None => Self::new(),
        };

        let mut auth: Vec<_> = config.auth_strategies.iter().collect();
        auth.sort_by(|a, b| a.0.cmp(b.0));
        for (address, strategy) in auth {
            registry = registry.with_auth_strategy(address, *strategy)?;
        }

        let mut voting: Vec<_> = config.voting_strategies.iter().collect();
        voting.sort_by(|a, b| a.0.cmp(b.0));
        for (address, strategy) in voting {
            registry = registry.with_voting_strategy(address, *strategy)?;
        }

        debug!(
            "Strategy registry: {} auth, {} voting",
            registry.auth.len(),
            registry.voting.len()
        );
        Ok(registry)
    }

    /// Register an auth strategy, replacing any previous one at the address
    pub fn with_auth_strategy(mut self, address: &str, strategy: AuthStrategy) -> Result<Self> {
        self.auth.insert(normalize_address(address)?, strategy);
        Ok(self)
    }

    /// Register a voting strategy, replacing any previous one at the address
    pub fn with_voting_strategy(
        mut self,
        address: &str,
        strategy: VotingStrategy,
    ) -> Result<Self> {
        self.voting.insert(normalize_address(address)?, strategy);
        Ok(self)
    }

    /// Auth strategy registered at `address`
    pub fn auth_strategy(&self, address: &str) -> Result<AuthStrategy> {
        normalize_address(address)
            .ok()
            .and_then(|key| self.auth.get(&key).copied())
            .ok_or_else(|| RoundError::UnknownAuthStrategy(address.to_string()))
    }

    /// Voting strategy registered at `address`
    pub fn voting_strategy(&self, address: &str) -> Result<VotingStrategy> {
        normalize_address(address)
            .ok()
            .and_then(|key| self.voting.get(&key).copied())
            .ok_or_else(|| RoundError::UnknownVotingStrategy(address.to_string()))
    }
}
