//! Common types used across the round client.
//!
//! Round configuration, awards, votes, the action envelopes that carry a
//! user's intent through the pipeline, and the call object handed to the
//! submission collaborator.

use crate::error::{Result, RoundError};
use alloy_primitives::ruint::UintTryFrom;
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Account or contract address, as supplied by the caller
pub type Address = String;

/// Ordered calldata words
pub type Calldata = Vec<String>;

/// Transaction hash returned by the submission collaborator
pub type TransactionHash = String;

/// Timing and winner configuration of a timed round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundConfig {
    /// Unix timestamp the proposal period opens at
    pub proposal_period_start_timestamp: u64,
    /// Proposal period length in seconds
    pub proposal_period_duration: u64,
    /// Vote period length in seconds
    pub vote_period_duration: u64,
    /// Number of winning proposals
    pub winner_count: u16,
}

/// Award asset kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AssetType {
    /// Native chain currency
    Native,
    /// Fungible token
    Erc20,
    /// Unique token
    Erc721,
    /// Semi-fungible token
    Erc1155,
}

impl AssetType {
    /// Whether one award of this type can be divided between several winners
    pub fn is_divisible(&self) -> bool {
        !matches!(self, AssetType::Erc721)
    }
}

/// A round award
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Award {
    /// Asset kind
    pub asset_type: AssetType,
    /// Amount in the asset's base unit
    pub amount: U256,
}

/// Voting power allocated to one proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalVote {
    /// Proposal being voted for
    pub proposal_id: u32,
    /// Voting power allocated to it
    pub voting_power: U256,
}

/// Round action carried by an envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Submit a proposal
    Propose,
    /// Cast votes
    Vote,
    /// Cancel a proposal
    CancelProposal,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Propose => write!(f, "PROPOSE"),
            Action::Vote => write!(f, "VOTE"),
            Action::CancelProposal => write!(f, "CANCEL_PROPOSAL"),
        }
    }
}

/// Message payload of an envelope
pub trait RoundMessage {
    /// Action this message performs
    const ACTION: Action;

    /// Auth strategy the action is routed through
    fn auth_strategy(&self) -> &str;

    /// Round (house strategy) contract the action targets
    fn round(&self) -> &str;
}

/// Proposal submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposeMessage {
    /// Auth strategy address
    pub auth_strategy: Address,
    /// Round contract address
    pub round: Address,
    /// Proposal metadata URI
    pub metadata_uri: String,
}

/// Vote submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteMessage {
    /// Auth strategy address
    pub auth_strategy: Address,
    /// Round contract address
    pub round: Address,
    /// Votes in submission order
    pub votes: Vec<ProposalVote>,
    /// Round-local indices of the voting strategies the voter uses
    pub voting_strategy_ids: Vec<u16>,
}

/// Proposal cancellation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelProposalMessage {
    /// Auth strategy address
    pub auth_strategy: Address,
    /// Round contract address
    pub round: Address,
    /// Proposal to cancel
    pub proposal_id: U256,
}

macro_rules! impl_round_message {
    ($ty:ty, $action:expr) => {
        impl RoundMessage for $ty {
            const ACTION: Action = $action;

            fn auth_strategy(&self) -> &str {
                &self.auth_strategy
            }

            fn round(&self) -> &str {
                &self.round
            }
        }
    };
}

impl_round_message!(ProposeMessage, Action::Propose);
impl_round_message!(VoteMessage, Action::Vote);
impl_round_message!(CancelProposalMessage, Action::CancelProposal);

/// Recoverable secp256k1 signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthSignature {
    /// `r` component
    pub r: U256,
    /// `s` component
    pub s: U256,
    /// Recovery byte (27/28 or 0/1)
    pub v: u8,
}

impl EthSignature {
    /// Parse a 65-byte `r || s || v` hex signature
    pub fn from_hex(signature: &str) -> Result<Self> {
        let digits = signature.strip_prefix("0x").unwrap_or(signature);
        let bytes = hex::decode(digits)?;
        let bytes: [u8; 65] = bytes.try_into().map_err(|b: Vec<u8>| {
            RoundError::InvalidSignature(format!("expected 65 bytes, got {}", b.len()))
        })?;
        Ok(Self::from_bytes(&bytes))
    }

    /// Build from raw `r || s || v` bytes
    pub fn from_bytes(bytes: &[u8; 65]) -> Self {
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Self {
            r: U256::from_be_bytes(r),
            s: U256::from_be_bytes(s),
            v: bytes[64],
        }
    }

    /// Raw `r || s || v` bytes
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(&self.r.to_be_bytes::<32>());
        out[32..64].copy_from_slice(&self.s.to_be_bytes::<32>());
        out[64] = self.v;
        out
    }

    /// Recovery id normalized to 0/1
    pub fn recovery_id(&self) -> u8 {
        if self.v >= 27 {
            self.v - 27
        } else {
            self.v
        }
    }
}

/// Envelope for a directly authorized action; carries no signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VanillaEnvelope<M> {
    /// Acting account
    pub address: Address,
    /// Action payload
    pub message: M,
}

/// Envelope for an action authorized by an off-chain signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedEnvelope<M> {
    /// Signing account
    pub address: Address,
    /// Signature over the typed message digest
    pub signature: EthSignature,
    /// Salt included in the signed message
    pub salt: U256,
    /// Action payload
    pub message: M,
}

/// An action on its way through the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Envelope<M> {
    /// Directly authorized
    Vanilla(VanillaEnvelope<M>),
    /// Signature authorized
    Signed(SignedEnvelope<M>),
}

impl<M: RoundMessage> Envelope<M> {
    /// Directly authorized envelope
    pub fn vanilla(address: impl Into<Address>, message: M) -> Self {
        Envelope::Vanilla(VanillaEnvelope {
            address: address.into(),
            message,
        })
    }

    /// Signature authorized envelope
    pub fn signed(
        address: impl Into<Address>,
        signature: EthSignature,
        salt: U256,
        message: M,
    ) -> Self {
        Envelope::Signed(SignedEnvelope {
            address: address.into(),
            signature,
            salt,
            message,
        })
    }

    /// Acting account
    pub fn address(&self) -> &str {
        match self {
            Envelope::Vanilla(e) => &e.address,
            Envelope::Signed(e) => &e.address,
        }
    }

    /// Action payload
    pub fn message(&self) -> &M {
        match self {
            Envelope::Vanilla(e) => &e.message,
            Envelope::Signed(e) => &e.message,
        }
    }

    /// Action performed
    pub fn action(&self) -> Action {
        M::ACTION
    }

    /// Signature, present only for signed envelopes
    pub fn signature(&self) -> Option<&EthSignature> {
        match self {
            Envelope::Vanilla(_) => None,
            Envelope::Signed(e) => Some(&e.signature),
        }
    }
}

/// A contract call ready for fee estimation and execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    /// Contract to call
    pub contract_address: Address,
    /// Entrypoint name
    pub entrypoint: String,
    /// Ordered calldata
    pub calldata: Calldata,
}

/// Fee estimate returned by the submission collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeEstimate {
    /// Estimated overall fee in the fee token's base unit
    pub overall_fee: U256,
}

impl ProposalVote {
    /// Vote with power given as a plain integer
    pub fn new<T>(proposal_id: u32, voting_power: T) -> Self
    where
        U256: UintTryFrom<T>,
    {
        Self {
            proposal_id,
            voting_power: U256::from(voting_power),
        }
    }
}

impl Award {
    /// Award of `amount` units of `asset_type`
    pub fn new<T>(asset_type: AssetType, amount: T) -> Self
    where
        U256: UintTryFrom<T>,
    {
        Self {
            asset_type,
            amount: U256::from(amount),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn propose_message() -> ProposeMessage {
        ProposeMessage {
            auth_strategy: "0x201".to_string(),
            round: "0x500".to_string(),
            metadata_uri: "ipfs://Qm123".to_string(),
        }
    }

    #[test]
    fn test_action_display() {
        assert_eq!(Action::Propose.to_string(), "PROPOSE");
        assert_eq!(Action::CancelProposal.to_string(), "CANCEL_PROPOSAL");
    }

    #[test]
    fn test_asset_divisibility() {
        assert!(AssetType::Erc20.is_divisible());
        assert!(AssetType::Erc1155.is_divisible());
        assert!(!AssetType::Erc721.is_divisible());
    }

    #[test]
    fn test_vanilla_envelope_has_no_signature() {
        let envelope = Envelope::vanilla("0xabc", propose_message());
        assert_eq!(envelope.address(), "0xabc");
        assert_eq!(envelope.action(), Action::Propose);
        assert!(envelope.signature().is_none());
    }

    #[test]
    fn test_signed_envelope_carries_signature() {
        let signature = EthSignature {
            r: U256::from(1u64),
            s: U256::from(2u64),
            v: 27,
        };
        let envelope = Envelope::signed("0xabc", signature, U256::from(9u64), propose_message());
        assert_eq!(envelope.signature(), Some(&signature));
    }

    #[test]
    fn test_signature_hex_roundtrip() {
        let mut bytes = [0u8; 65];
        bytes[31] = 0x11;
        bytes[63] = 0x22;
        bytes[64] = 28;
        let sig = EthSignature::from_hex(&format!("0x{}", hex::encode(bytes))).unwrap();
        assert_eq!(sig.r, U256::from(0x11u64));
        assert_eq!(sig.s, U256::from(0x22u64));
        assert_eq!(sig.recovery_id(), 1);
        assert_eq!(sig.to_bytes(), bytes);
    }

    #[test]
    fn test_signature_wrong_length() {
        let result = EthSignature::from_hex("0x1234");
        assert!(matches!(result, Err(RoundError::InvalidSignature(_))));
    }

    #[test]
    fn test_call_serializes_camel_case() {
        let call = Call {
            contract_address: "0x1".to_string(),
            entrypoint: "authenticate".to_string(),
            calldata: vec!["0x2".to_string()],
        };
        let json = serde_json::to_value(&call).unwrap();
        assert_eq!(json["contractAddress"], "0x1");
        assert_eq!(json["calldata"][0], "0x2");
    }
}
