//! Protocol constants and the devnet deployment table.

/// Minimum time between round validation and the proposal period start (seconds)
pub const MIN_LEAD_TIME: u64 = 2 * 60 * 60;

/// Minimum proposal period length (seconds)
pub const MIN_PROPOSAL_DURATION: u64 = 4 * 60 * 60;

/// Minimum vote period length (seconds)
pub const MIN_VOTE_DURATION: u64 = 4 * 60 * 60;

/// Maximum number of winners a round may have
pub const MAX_WINNER_COUNT: u16 = 256;

/// Bytes packed into each word of an encoded string
pub const STRING_WORD_BYTES: usize = 8;

/// Entrypoint names on the round (house strategy) contract
pub mod entrypoints {
    /// Submit a proposal
    pub const PROPOSE: &str = "propose";
    /// Cast votes
    pub const VOTE: &str = "vote";
    /// Cancel a proposal
    pub const CANCEL_PROPOSAL: &str = "cancel_proposal";
    /// Auth strategy entrypoint wrapping every round action
    pub const AUTHENTICATE: &str = "authenticate";
    /// Strategy registry lookup from strategy hash to address
    pub const GET_VOTING_STRATEGY: &str = "get_voting_strategy";
    /// Stored parameters of a voting strategy attached to a round
    pub const GET_VOTING_STRATEGY_PARAMS: &str = "get_voting_strategy_params";
    /// L1 block the round snapshots voting power at
    pub const GET_SNAPSHOT_BLOCK_NUMBER: &str = "get_snapshot_block_number";
}

/// Storage variable on the round contract mapping strategy index to strategy hash
pub const VOTING_STRATEGIES_STORAGE_VAR: &str = "_voting_strategies";

/// Typed message domain and schema constants
pub mod typed_data {
    /// Domain name
    pub const DOMAIN_NAME: &str = "house-round";
    /// Domain version
    pub const DOMAIN_VERSION: &str = "1";
    /// Domain type name
    pub const DOMAIN_TYPE: &str = "EIP712Domain";
    /// Propose primary type
    pub const PROPOSE_TYPE: &str = "Propose";
    /// Vote primary type
    pub const VOTE_TYPE: &str = "Vote";
    /// Cancel proposal primary type
    pub const CANCEL_PROPOSAL_TYPE: &str = "CancelProposal";
}

/// Addresses of a protocol deployment on one network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deployment {
    /// Strategy registry contract
    pub strategy_registry: &'static str,
    /// Vanilla (direct) auth strategy
    pub vanilla_auth: &'static str,
    /// Ethereum signature auth strategy
    pub ethereum_sig_auth: &'static str,
    /// Vanilla voting strategy
    pub vanilla_voting: &'static str,
    /// Ethereum balance-of (single slot proof) voting strategy
    pub ethereum_balance_of_voting: &'static str,
}

/// Local devnet deployment
pub const DEVNET_DEPLOYMENT: Deployment = Deployment {
    strategy_registry: "0x0000000000000000000000000000000000000000000000000000000000000100",
    vanilla_auth: "0x0000000000000000000000000000000000000000000000000000000000000201",
    ethereum_sig_auth: "0x0000000000000000000000000000000000000000000000000000000000000202",
    vanilla_voting: "0x0000000000000000000000000000000000000000000000000000000000000301",
    ethereum_balance_of_voting: "0x0000000000000000000000000000000000000000000000000000000000000302",
};
