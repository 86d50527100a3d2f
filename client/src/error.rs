//! Error types for the round client.
//!
//! Validation failures, strategy resolution failures, transport failures and
//! encoding invariant violations each have their own variants so callers can
//! render a precise message instead of a generic failure.

use alloy_primitives::U256;
use thiserror::Error;

/// Round configuration rejected by the validator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Proposal period starts before the minimum lead time has elapsed
    #[error("Proposal period must start at least {min_lead_secs}s from now (start: {start}, now: {now})")]
    TooSoon {
        /// Requested proposal period start
        start: u64,
        /// Time the validation ran at
        now: u64,
        /// Required lead time in seconds
        min_lead_secs: u64,
    },

    /// Proposal period shorter than the protocol minimum
    #[error("Proposal period of {0}s is shorter than the protocol minimum")]
    ProposalPeriodTooShort(u64),

    /// Vote period shorter than the protocol minimum
    #[error("Vote period of {0}s is shorter than the protocol minimum")]
    VotePeriodTooShort(u64),

    /// Award list is neither a single shared award nor one per winner
    #[error("Expected 1 or {winners} awards, got {awards}")]
    AwardCountMismatch {
        /// Number of awards supplied
        awards: usize,
        /// Configured winner count
        winners: u16,
    },

    /// A unique token cannot be split between several winners
    #[error("A single ERC721 award cannot be split across {0} winners")]
    CannotSplitUniqueAsset(u16),

    /// Shared award amount does not divide evenly between winners
    #[error("Award amount {amount} cannot be split evenly across {winners} winners")]
    UnequalSplit {
        /// Shared award amount
        amount: U256,
        /// Configured winner count
        winners: u16,
    },

    /// Winner count above the protocol maximum
    #[error("Winner count {0} exceeds the protocol maximum")]
    WinnerCountTooHigh(u16),
}

/// Main error type for round client operations
#[derive(Error, Debug)]
pub enum RoundError {
    /// Round configuration failed validation
    #[error("Invalid round configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    /// No auth strategy registered for the address
    #[error("Unknown auth strategy: {0}")]
    UnknownAuthStrategy(String),

    /// No voting strategy registered for the address
    #[error("Unknown voting strategy: {0}")]
    UnknownVotingStrategy(String),

    /// Strategy indices and strategy parameter lists differ in length
    #[error("Got {params} strategy parameter lists for {indices} strategy indices")]
    StrategyParamsLengthMismatch {
        /// Number of strategy indices
        indices: usize,
        /// Number of parameter lists
        params: usize,
    },

    /// HTTP transport error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON-RPC endpoint returned an error
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Response could not be interpreted
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Max retries exceeded
    #[error("Max retries ({0}) exceeded")]
    MaxRetriesExceeded(usize),

    /// Value is not a valid field element
    #[error("Invalid field element: {0}")]
    InvalidFieldElement(String),

    /// Value is not a valid address
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Signature is malformed or does not recover
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// Internal invariant broken by a caller bypassing the typed API
    #[error("Encoding invariant violated: {0}")]
    EncodingInvariantViolation(String),

    /// Invalid client configuration
    #[error("Invalid client configuration: {0}")]
    ClientConfig(String),

    /// Call submission failed in the executor
    #[error("Call submission failed: {0}")]
    Submission(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Config file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// URL parse error
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Hex decode error
    #[error("Hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),
}

/// Result type alias for round client operations
pub type Result<T> = std::result::Result<T, RoundError>;

/// Bookkeeping for a retried transport request
#[derive(Debug, Clone, Default)]
pub struct RetryContext {
    /// Number of attempts made
    pub attempts: usize,
    /// Last error encountered
    pub last_error: String,
    /// Total time spent backing off (in milliseconds)
    pub total_time_ms: u64,
}

impl RetryContext {
    /// Create a new retry context
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failed attempt and the delay before the next one
    pub fn record_attempt(&mut self, error: &str, duration_ms: u64) {
        self.attempts += 1;
        self.last_error = error.to_string();
        self.total_time_ms += duration_ms;
    }
}
