//! House Round Client
//!
//! Client-side encoder for funding-round governance actions. It validates a
//! round's configuration, turns proposals, votes and cancellations into the
//! exact calldata the round contracts expect, routes them through the right
//! auth strategy, and builds the typed messages users sign for gasless
//! actions.
//!
//! # Features
//!
//! - **Round validation**: timing, winner count and award distribution checks
//! - **Calldata encoding**: propose, vote and cancel layouts with 128-bit limb
//!   splitting and 8-byte string packing
//! - **Strategy resolution**: concurrent two-hop lookup of voting strategies and
//!   their per-voter parameters, including L1 storage proofs
//! - **Auth dispatch**: vanilla and Ethereum-signature auth strategies
//! - **Typed messages**: signable messages whose hashes match the submitted calldata
//! - **Retry Logic**: Exponential backoff for transient JSON-RPC errors
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use house_round_client::{ClientConfig, Envelope, ProposeMessage, RoundClient};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = RoundClient::new(Arc::new(ClientConfig::devnet()))?;
//!
//! let envelope = Envelope::vanilla(
//!     "0xabc123",
//!     ProposeMessage {
//!         auth_strategy: "0x201".to_string(),
//!         round: "0x500".to_string(),
//!         metadata_uri: "ipfs://Qm123".to_string(),
//!     },
//! );
//! let call = client.propose(&envelope)?;
//! println!("{}", serde_json::to_string_pretty(&call)?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Vote
//!
//! ```rust,no_run
//! use house_round_client::{ClientConfig, Envelope, ProposalVote, RoundClient, VoteMessage};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = RoundClient::new(Arc::new(ClientConfig::devnet()))?;
//!
//! let envelope = Envelope::vanilla(
//!     "0xabc123",
//!     VoteMessage {
//!         auth_strategy: "0x201".to_string(),
//!         round: "0x500".to_string(),
//!         votes: vec![ProposalVote::new(1, 10u64)],
//!         voting_strategy_ids: vec![0],
//!     },
//! );
//! let call = client.vote(&envelope).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod calldata;
pub mod canonical;
pub mod chain;
pub mod codec;
pub mod config;
pub mod constants;
pub mod error;
pub mod ethereum;
pub mod resolver;
pub mod retry;
pub mod rpc;
pub mod starknet;
pub mod strategies;
pub mod typed_data;
pub mod types;
pub mod validator;

pub use chain::{CallExecutor, ChainReader, StorageProof, StorageProofProvider};
pub use config::{ClientConfig, Network};
pub use error::{ConfigurationError, Result, RoundError};
pub use ethereum::EthereumRpcClient;
pub use resolver::VotingStrategyResolver;
pub use retry::RetryStrategy;
pub use starknet::StarknetRpcClient;
pub use strategies::{AuthStrategy, StrategyRegistry, VotingStrategy};
pub use typed_data::{TypedDataDomain, TypedMessage};
pub use types::{
    Action, AssetType, Award, Call, CancelProposalMessage, Envelope, EthSignature, FeeEstimate,
    ProposalVote, ProposeMessage, RoundConfig, RoundMessage, SignedEnvelope, TransactionHash,
    VanillaEnvelope, VoteMessage,
};

use alloy_primitives::U256;
use constants::entrypoints;
use std::sync::Arc;
use tracing::{debug, info};

/// Entry point for encoding round actions.
///
/// Holds the strategy registry and the chain readers used to resolve voting
/// strategy parameters. Encoding itself never writes to the chain; the
/// returned [`Call`] is submitted by the caller, optionally through
/// [`RoundClient::submit`].
#[derive(Clone)]
pub struct RoundClient {
    config: Arc<ClientConfig>,
    registry: Arc<StrategyRegistry>,
    resolver: VotingStrategyResolver,
}

impl std::fmt::Debug for RoundClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundClient")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl RoundClient {
    /// Create a client reading through the configured JSON-RPC endpoints
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use house_round_client::{ClientConfig, RoundClient};
    /// use std::sync::Arc;
    ///
    /// let client = RoundClient::new(Arc::new(ClientConfig::devnet())).unwrap();
    /// ```
    pub fn new(config: Arc<ClientConfig>) -> Result<Self> {
        config.validate()?;

        let chain: Arc<dyn ChainReader> = Arc::new(StarknetRpcClient::new(&config)?);
        let proofs: Option<Arc<dyn StorageProofProvider>> = match config.ethereum_rpc_url {
            Some(_) => Some(Arc::new(EthereumRpcClient::new(&config)?)),
            None => None,
        };

        Self::with_chain(config, chain, proofs)
    }

    /// Create a client reading through caller-supplied collaborators
    pub fn with_chain(
        config: Arc<ClientConfig>,
        chain: Arc<dyn ChainReader>,
        proofs: Option<Arc<dyn StorageProofProvider>>,
    ) -> Result<Self> {
        config.validate()?;

        info!(
            "Initializing round client for network: {:?}",
            config.network
        );

        let registry = Arc::new(StrategyRegistry::from_config(&config)?);
        let resolver = VotingStrategyResolver::new(
            chain,
            proofs,
            registry.clone(),
            config.strategy_registry_address()?,
        );

        Ok(Self {
            config,
            registry,
            resolver,
        })
    }

    /// Check a round configuration against the protocol minimums
    pub fn validate_round(&self, round: &RoundConfig, awards: &[Award]) -> Result<()> {
        validator::validate(round, awards)?;
        Ok(())
    }

    /// Call that submits a proposal
    pub fn propose(&self, envelope: &Envelope<ProposeMessage>) -> Result<Call> {
        info!("Encoding proposal by {}", envelope.address());

        if let Envelope::Signed(signed) = envelope {
            let typed = self.propose_typed_message(&signed.address, &signed.message, signed.salt)?;
            typed_data::verify_signer(&typed, &signed.signature, &signed.address)?;
        }

        let message = envelope.message();
        let calldata = calldata::encode_propose(envelope.address(), &message.metadata_uri);
        strategies::dispatch(&self.registry, envelope, entrypoints::PROPOSE, calldata)
    }

    /// Call that cancels a proposal
    pub fn cancel_proposal(&self, envelope: &Envelope<CancelProposalMessage>) -> Result<Call> {
        info!(
            "Encoding cancellation of proposal {} by {}",
            envelope.message().proposal_id,
            envelope.address()
        );

        if let Envelope::Signed(signed) = envelope {
            let typed = self.cancel_typed_message(&signed.address, &signed.message, signed.salt)?;
            typed_data::verify_signer(&typed, &signed.signature, &signed.address)?;
        }

        let calldata = calldata::encode_cancel(envelope.address(), envelope.message().proposal_id);
        strategies::dispatch(
            &self.registry,
            envelope,
            entrypoints::CANCEL_PROPOSAL,
            calldata,
        )
    }

    /// Call that casts votes, with strategy parameters resolved from chain state
    pub async fn vote(&self, envelope: &Envelope<VoteMessage>) -> Result<Call> {
        let message = envelope.message();
        info!(
            "Encoding {} vote(s) by {} on round {}",
            message.votes.len(),
            envelope.address(),
            message.round
        );

        // Unknown auth strategies fail before any chain reads.
        self.registry.auth_strategy(&message.auth_strategy)?;

        let params = self
            .resolver
            .resolve(&message.round, &message.voting_strategy_ids, envelope.address())
            .await?;

        if let Envelope::Signed(signed) = envelope {
            let typed = typed_data::build_vote_message(
                self.domain(),
                &signed.address,
                message,
                &params,
                signed.salt,
            )?;
            typed_data::verify_signer(&typed, &signed.signature, &signed.address)?;
        }

        let calldata = calldata::encode_vote(
            envelope.address(),
            &message.votes,
            &message.voting_strategy_ids,
            &params,
        )?;
        strategies::dispatch(&self.registry, envelope, entrypoints::VOTE, calldata)
    }

    /// Typed message a proposer signs for a gasless proposal
    pub fn propose_typed_message(
        &self,
        proposer: &str,
        message: &ProposeMessage,
        salt: U256,
    ) -> Result<TypedMessage> {
        typed_data::build_propose_message(self.domain(), proposer, message, salt)
    }

    /// Typed message a voter signs for gasless votes.
    ///
    /// Resolves the voter's strategy parameters, so the hash matches the
    /// calldata [`RoundClient::vote`] will produce.
    pub async fn vote_typed_message(
        &self,
        voter: &str,
        message: &VoteMessage,
        salt: U256,
    ) -> Result<TypedMessage> {
        let params = self
            .resolver
            .resolve(&message.round, &message.voting_strategy_ids, voter)
            .await?;
        typed_data::build_vote_message(self.domain(), voter, message, &params, salt)
    }

    /// Typed message a proposer signs for a gasless cancellation
    pub fn cancel_typed_message(
        &self,
        proposer: &str,
        message: &CancelProposalMessage,
        salt: U256,
    ) -> Result<TypedMessage> {
        typed_data::build_cancel_proposal_message(self.domain(), proposer, message, salt)
    }

    /// Estimate the fee for `call` and execute it through `executor`
    pub async fn submit(
        &self,
        call: &Call,
        executor: &dyn CallExecutor,
    ) -> Result<TransactionHash> {
        info!(
            "Submitting {} on {}",
            call.entrypoint, call.contract_address
        );

        let fee = executor.estimate_fee(call).await?;
        debug!("Estimated fee: {}", fee.overall_fee);

        let hash = executor.execute(call, &fee).await?;
        info!("Call submitted: {}", hash);
        Ok(hash)
    }

    fn domain(&self) -> TypedDataDomain {
        TypedDataDomain::new(self.config.chain_id)
    }

    /// Strategy registry
    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    /// Voting strategy resolver
    pub fn resolver(&self) -> &VotingStrategyResolver {
        &self.resolver
    }

    /// Get configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}
