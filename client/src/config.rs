//! Client configuration.
//!
//! Selects the network deployment, the JSON-RPC endpoints used for chain
//! reads, transport retry behavior, and any caller-supplied strategy
//! registrations. Protocol constants live in [`crate::constants`] and are not
//! configurable.

use crate::codec::normalize_address;
use crate::constants::{Deployment, DEVNET_DEPLOYMENT};
use crate::error::{Result, RoundError};
use crate::strategies::{AuthStrategy, VotingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Network type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Production deployment
    Mainnet,
    /// Public test deployment
    Goerli,
    /// Local development deployment
    Devnet,
}

impl Network {
    /// Protocol deployment shipped for this network, if its addresses are
    /// published
    pub fn deployment(&self) -> Option<&'static Deployment> {
        match self {
            Network::Devnet => Some(&DEVNET_DEPLOYMENT),
            Network::Mainnet | Network::Goerli => None,
        }
    }

    /// Ethereum chain id used in the typed message domain
    pub fn ethereum_chain_id(&self) -> u64 {
        match self {
            Network::Mainnet => 1,
            Network::Goerli => 5,
            Network::Devnet => 1337,
        }
    }

    /// Default Starknet JSON-RPC URL
    pub fn default_starknet_rpc_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://starknet-mainnet.public.blastapi.io",
            Network::Goerli => "https://starknet-testnet.public.blastapi.io",
            Network::Devnet => "http://127.0.0.1:5050/rpc",
        }
    }

    /// Default Ethereum JSON-RPC URL, when a public one exists
    pub fn default_ethereum_rpc_url(&self) -> Option<&'static str> {
        match self {
            Network::Devnet => Some("http://127.0.0.1:8545"),
            _ => None,
        }
    }
}

/// Configuration for [`crate::RoundClient`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Network to connect to
    pub network: Network,

    /// Starknet JSON-RPC endpoint for round and registry reads
    pub starknet_rpc_url: String,

    /// Ethereum JSON-RPC endpoint for storage proofs
    pub ethereum_rpc_url: Option<String>,

    /// Chain id placed in the typed message domain
    pub chain_id: u64,

    /// Strategy registry contract, replacing the deployment's
    pub strategy_registry: Option<String>,

    /// HTTP request timeout
    pub request_timeout: Duration,

    /// Maximum number of retries for failed requests
    pub max_retries: usize,

    /// Initial retry delay (in milliseconds)
    pub retry_initial_delay_ms: u64,

    /// Maximum retry delay (in milliseconds)
    pub retry_max_delay_ms: u64,

    /// Retry backoff multiplier
    pub retry_multiplier: f64,

    /// Auth strategies registered on top of the deployment defaults
    pub auth_strategies: HashMap<String, AuthStrategy>,

    /// Voting strategies registered on top of the deployment defaults
    pub voting_strategies: HashMap<String, VotingStrategy>,
}

impl ClientConfig {
    /// Create a new configuration for the specified network
    pub fn new(network: Network) -> Self {
        Self {
            network,
            starknet_rpc_url: network.default_starknet_rpc_url().to_string(),
            ethereum_rpc_url: network.default_ethereum_rpc_url().map(String::from),
            chain_id: network.ethereum_chain_id(),
            strategy_registry: None,
            request_timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_initial_delay_ms: 100,
            retry_max_delay_ms: 5000,
            retry_multiplier: 2.0,
            auth_strategies: HashMap::new(),
            voting_strategies: HashMap::new(),
        }
    }

    /// Create configuration for mainnet
    pub fn mainnet() -> Self {
        Self::new(Network::Mainnet)
    }

    /// Create configuration for goerli
    pub fn goerli() -> Self {
        Self::new(Network::Goerli)
    }

    /// Create configuration for a local devnet
    pub fn devnet() -> Self {
        Self::new(Network::Devnet)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            RoundError::ClientConfig(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    ///
    /// Fields the file leaves out take the defaults of the network it names.
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)?;

        let mut config = Self::new(file.network.unwrap_or(Network::Devnet));
        if let Some(url) = file.starknet_rpc_url {
            config.starknet_rpc_url = url;
        }
        if file.ethereum_rpc_url.is_some() {
            config.ethereum_rpc_url = file.ethereum_rpc_url;
        }
        if let Some(chain_id) = file.chain_id {
            config.chain_id = chain_id;
        }
        if file.strategy_registry.is_some() {
            config.strategy_registry = file.strategy_registry;
        }
        if let Some(secs) = file.request_timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(max_retries) = file.max_retries {
            config.max_retries = max_retries;
        }
        if let Some(delay) = file.retry_initial_delay_ms {
            config.retry_initial_delay_ms = delay;
        }
        if let Some(delay) = file.retry_max_delay_ms {
            config.retry_max_delay_ms = delay;
        }
        if let Some(multiplier) = file.retry_multiplier {
            config.retry_multiplier = multiplier;
        }
        config.auth_strategies.extend(file.auth_strategies);
        config.voting_strategies.extend(file.voting_strategies);

        config.validate()?;
        Ok(config)
    }

    /// Set the Starknet RPC endpoint
    pub fn with_starknet_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.starknet_rpc_url = url.into();
        self
    }

    /// Set the Ethereum RPC endpoint
    pub fn with_ethereum_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.ethereum_rpc_url = Some(url.into());
        self
    }

    /// Set the typed message chain id
    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// Set the strategy registry contract
    pub fn with_strategy_registry(mut self, address: impl Into<String>) -> Self {
        self.strategy_registry = Some(address.into());
        self
    }

    /// Set request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set maximum retries
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set retry delays
    pub fn with_retry_config(
        mut self,
        initial_delay_ms: u64,
        max_delay_ms: u64,
        multiplier: f64,
    ) -> Self {
        self.retry_initial_delay_ms = initial_delay_ms;
        self.retry_max_delay_ms = max_delay_ms;
        self.retry_multiplier = multiplier;
        self
    }

    /// Register an auth strategy at `address`
    pub fn with_auth_strategy(mut self, address: impl Into<String>, strategy: AuthStrategy) -> Self {
        self.auth_strategies.insert(address.into(), strategy);
        self
    }

    /// Register a voting strategy at `address`
    pub fn with_voting_strategy(
        mut self,
        address: impl Into<String>,
        strategy: VotingStrategy,
    ) -> Self {
        self.voting_strategies.insert(address.into(), strategy);
        self
    }

    /// Strategy registry contract the resolver queries
    pub fn strategy_registry_address(&self) -> Result<String> {
        match (&self.strategy_registry, self.network.deployment()) {
            (Some(address), _) => normalize_address(address),
            (None, Some(deployment)) => Ok(deployment.strategy_registry.to_string()),
            (None, None) => Err(RoundError::ClientConfig(format!(
                "No published deployment for {:?}; set strategy_registry",
                self.network
            ))),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.starknet_rpc_url).map_err(|e| {
            RoundError::ClientConfig(format!(
                "Invalid Starknet RPC URL {:?}: {}",
                self.starknet_rpc_url, e
            ))
        })?;
        if let Some(url) = &self.ethereum_rpc_url {
            Url::parse(url).map_err(|e| {
                RoundError::ClientConfig(format!("Invalid Ethereum RPC URL {:?}: {}", url, e))
            })?;
        }
        if self.max_retries == 0 {
            return Err(RoundError::ClientConfig(
                "Max retries must be greater than 0".to_string(),
            ));
        }
        if self.retry_initial_delay_ms == 0 {
            return Err(RoundError::ClientConfig(
                "Retry initial delay must be greater than 0".to_string(),
            ));
        }
        if self.retry_multiplier <= 1.0 {
            return Err(RoundError::ClientConfig(
                "Retry multiplier must be greater than 1.0".to_string(),
            ));
        }
        self.strategy_registry_address()?;
        check_unique_addresses("Auth", self.auth_strategies.keys())?;
        check_unique_addresses("Voting", self.voting_strategies.keys())?;

        Ok(())
    }
}

/// Every address must parse, and no two may normalize to the same key.
fn check_unique_addresses<'a>(kind: &str, addresses: impl Iterator<Item = &'a String>) -> Result<()> {
    let mut seen = HashSet::new();
    for address in addresses {
        if !seen.insert(normalize_address(address)?) {
            return Err(RoundError::ClientConfig(format!(
                "{} strategy address {} is registered more than once",
                kind, address
            )));
        }
    }
    Ok(())
}

/// On-disk config layout
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    network: Option<Network>,
    starknet_rpc_url: Option<String>,
    ethereum_rpc_url: Option<String>,
    chain_id: Option<u64>,
    strategy_registry: Option<String>,
    request_timeout_secs: Option<u64>,
    max_retries: Option<usize>,
    retry_initial_delay_ms: Option<u64>,
    retry_max_delay_ms: Option<u64>,
    retry_multiplier: Option<f64>,
    #[serde(default)]
    auth_strategies: HashMap<String, AuthStrategy>,
    #[serde(default)]
    voting_strategies: HashMap<String, VotingStrategy>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::devnet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_chain_ids() {
        assert_eq!(Network::Mainnet.ethereum_chain_id(), 1);
        assert_eq!(Network::Goerli.ethereum_chain_id(), 5);
    }

    #[test]
    fn test_only_devnet_ships_a_deployment() {
        assert_eq!(Network::Devnet.deployment(), Some(&DEVNET_DEPLOYMENT));
        assert!(Network::Mainnet.deployment().is_none());
        assert!(Network::Goerli.deployment().is_none());
    }

    #[test]
    fn test_mainnet_requires_registry_address() {
        let config = ClientConfig::mainnet();
        assert_eq!(config.network, Network::Mainnet);
        assert_eq!(config.chain_id, 1);
        assert!(config.ethereum_rpc_url.is_none());
        assert!(matches!(config.validate(), Err(RoundError::ClientConfig(_))));

        let config = config.with_strategy_registry("0x0ABC");
        assert!(config.validate().is_ok());
        assert_eq!(
            config.strategy_registry_address().unwrap(),
            format!("0x{:0>64}", "abc")
        );
    }

    #[test]
    fn test_devnet_registry_address() {
        assert_eq!(
            ClientConfig::devnet().strategy_registry_address().unwrap(),
            DEVNET_DEPLOYMENT.strategy_registry
        );
    }

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::goerli()
            .with_strategy_registry("0x100")
            .with_starknet_rpc_url("http://localhost:9545")
            .with_ethereum_rpc_url("http://localhost:8545")
            .with_chain_id(11155111)
            .with_request_timeout(Duration::from_secs(60))
            .with_max_retries(5)
            .with_retry_config(200, 10000, 2.5)
            .with_auth_strategy("0xabc", AuthStrategy::Vanilla);

        assert_eq!(config.starknet_rpc_url, "http://localhost:9545");
        assert_eq!(config.ethereum_rpc_url.as_deref(), Some("http://localhost:8545"));
        assert_eq!(config.chain_id, 11155111);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.retry_multiplier, 2.5);
        assert_eq!(config.auth_strategies.len(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ClientConfig::devnet();
        assert!(config.validate().is_ok());

        config.max_retries = 0;
        assert!(config.validate().is_err());

        config.max_retries = 3;
        config.retry_multiplier = 0.5;
        assert!(config.validate().is_err());

        config.retry_multiplier = 2.0;
        config.starknet_rpc_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_override_address() {
        let config = ClientConfig::devnet().with_voting_strategy("zzz", VotingStrategy::Vanilla);
        assert!(matches!(config.validate(), Err(RoundError::InvalidAddress(_))));
    }

    #[test]
    fn test_duplicate_override_addresses_rejected() {
        let config = ClientConfig::devnet()
            .with_voting_strategy("0x201", VotingStrategy::Vanilla)
            .with_voting_strategy("0x0201", VotingStrategy::EthereumBalanceOf);
        assert!(matches!(config.validate(), Err(RoundError::ClientConfig(_))));

        // The same address may carry both an auth and a voting strategy.
        let config = ClientConfig::devnet()
            .with_auth_strategy("0x201", AuthStrategy::Vanilla)
            .with_voting_strategy("0x0201", VotingStrategy::Vanilla);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_rejects_duplicate_addresses() {
        let result = ClientConfig::from_toml(
            r#"
            [auth_strategies]
            "0xabc" = "vanilla"
            "0xABC" = "ethereum_sig"
            "#,
        );
        assert!(matches!(result, Err(RoundError::ClientConfig(_))));
    }

    #[test]
    fn test_from_toml() {
        let config = ClientConfig::from_toml(
            r#"
            network = "goerli"
            starknet_rpc_url = "http://localhost:9545"
            strategy_registry = "0x100"
            max_retries = 7
            request_timeout_secs = 10

            [auth_strategies]
            "0x123" = "vanilla"

            [voting_strategies]
            "0x456" = "ethereum_balance_of"
            "#,
        )
        .unwrap();

        assert_eq!(config.network, Network::Goerli);
        assert_eq!(config.chain_id, 5);
        assert_eq!(config.max_retries, 7);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.auth_strategies["0x123"], AuthStrategy::Vanilla);
        assert_eq!(
            config.voting_strategies["0x456"],
            VotingStrategy::EthereumBalanceOf
        );
        // Unset fields fall back to the network defaults.
        assert_eq!(config.retry_initial_delay_ms, 100);
    }

    #[test]
    fn test_from_toml_rejects_bad_syntax() {
        assert!(matches!(
            ClientConfig::from_toml("network = "),
            Err(RoundError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_from_toml_rejects_unknown_fields() {
        assert!(matches!(
            ClientConfig::from_toml("max_retry = 3"),
            Err(RoundError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.network, Network::Devnet);
        assert!(config.validate().is_ok());
    }
}
