//! Typed messages for signature-authorized actions.
//!
//! A user signs the digest of a typed message off-chain; the signature auth
//! strategy recomputes that digest from the submitted calldata and recovers
//! the signer. The vote hashes are produced by [`crate::canonical`], the same
//! flattening the calldata encoder uses, so both sides hash identical words.
//!
//! Hashing goes through the EIP-712 structs declared below. [`TypedMessage`]
//! carries the same values in the JSON shape wallets expect for
//! `eth_signTypedData_v4`.

use crate::canonical::{proposal_votes_hash, voting_strategies_hash, voting_strategy_params_hash};
use crate::codec::{address_to_b256, parse_word};
use crate::constants::typed_data::{
    CANCEL_PROPOSAL_TYPE, DOMAIN_NAME, DOMAIN_TYPE, DOMAIN_VERSION, PROPOSE_TYPE, VOTE_TYPE,
};
use crate::error::{Result, RoundError};
use crate::types::{CancelProposalMessage, EthSignature, ProposeMessage, VoteMessage};
use alloy_primitives::{keccak256, Address as EthAddress, B256, U256};
use alloy_sol_types::{sol, Eip712Domain, SolStruct};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

sol! {
    struct Propose {
        bytes32 authStrategy;
        bytes32 houseStrategy;
        address proposerAddress;
        string metadataUri;
        uint256 salt;
    }

    struct Vote {
        bytes32 authStrategy;
        bytes32 houseStrategy;
        address voterAddress;
        bytes32 proposalVotesHash;
        bytes32 votingStrategiesHash;
        bytes32 votingStrategyParamsHash;
        uint256 salt;
    }

    struct CancelProposal {
        bytes32 authStrategy;
        bytes32 houseStrategy;
        address proposerAddress;
        uint256 proposalId;
        uint256 salt;
    }
}

const DOMAIN_FIELDS: &[(&str, &str)] = &[
    ("name", "string"),
    ("version", "string"),
    ("chainId", "uint256"),
];

const PROPOSE_FIELDS: &[(&str, &str)] = &[
    ("authStrategy", "bytes32"),
    ("houseStrategy", "bytes32"),
    ("proposerAddress", "address"),
    ("metadataUri", "string"),
    ("salt", "uint256"),
];

const VOTE_FIELDS: &[(&str, &str)] = &[
    ("authStrategy", "bytes32"),
    ("houseStrategy", "bytes32"),
    ("voterAddress", "address"),
    ("proposalVotesHash", "bytes32"),
    ("votingStrategiesHash", "bytes32"),
    ("votingStrategyParamsHash", "bytes32"),
    ("salt", "uint256"),
];

const CANCEL_PROPOSAL_FIELDS: &[(&str, &str)] = &[
    ("authStrategy", "bytes32"),
    ("houseStrategy", "bytes32"),
    ("proposerAddress", "address"),
    ("proposalId", "uint256"),
    ("salt", "uint256"),
];

/// Typed message domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedDataDomain {
    /// Protocol name
    pub name: String,
    /// Protocol version
    pub version: String,
    /// Chain the signature is valid on
    pub chain_id: u64,
}

impl TypedDataDomain {
    /// Protocol domain for `chain_id`
    pub fn new(chain_id: u64) -> Self {
        Self {
            name: DOMAIN_NAME.to_string(),
            version: DOMAIN_VERSION.to_string(),
            chain_id,
        }
    }

    fn to_eip712(&self) -> Eip712Domain {
        Eip712Domain::new(
            Some(self.name.clone().into()),
            Some(self.version.clone().into()),
            Some(U256::from(self.chain_id)),
            None,
            None,
        )
    }
}

/// One field of a type schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypedField {
    /// Field name
    pub name: String,
    /// Field type
    #[serde(rename = "type")]
    pub kind: String,
}

/// A typed field value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// `bytes32`
    Bytes32(B256),
    /// `address`
    Address(EthAddress),
    /// `string`
    String(String),
    /// `uint256`
    Uint256(U256),
}

/// A message ready to be signed, in wallet `signTypedData` shape.
///
/// The hashes are computed once, when the message is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedMessage {
    domain: TypedDataDomain,
    types: BTreeMap<String, Vec<TypedField>>,
    primary_type: String,
    message: BTreeMap<String, FieldValue>,
    #[serde(skip)]
    encoded_type: String,
    #[serde(skip)]
    domain_separator: B256,
    #[serde(skip)]
    message_hash: B256,
    #[serde(skip)]
    digest: B256,
}

impl TypedMessage {
    fn new<S: SolStruct>(
        domain: TypedDataDomain,
        primary_type: &str,
        fields: &[(&str, &str)],
        payload: &S,
        values: Vec<(&str, FieldValue)>,
    ) -> Self {
        let eip712 = domain.to_eip712();

        let mut types = BTreeMap::new();
        types.insert(DOMAIN_TYPE.to_string(), schema(DOMAIN_FIELDS));
        types.insert(primary_type.to_string(), schema(fields));

        let digest = payload.eip712_signing_hash(&eip712);
        debug!("{} typed message digest: {}", primary_type, digest);

        Self {
            types,
            primary_type: primary_type.to_string(),
            message: values
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
            encoded_type: S::eip712_encode_type().into_owned(),
            domain_separator: eip712.separator(),
            message_hash: payload.eip712_hash_struct(),
            digest,
            domain,
        }
    }

    /// Signing domain
    pub fn domain(&self) -> &TypedDataDomain {
        &self.domain
    }

    /// Type schemas, including the domain type
    pub fn types(&self) -> &BTreeMap<String, Vec<TypedField>> {
        &self.types
    }

    /// Name of the schema [`TypedMessage::message`] follows
    pub fn primary_type(&self) -> &str {
        &self.primary_type
    }

    /// Field values by name
    pub fn message(&self) -> &BTreeMap<String, FieldValue> {
        &self.message
    }

    /// `Name(type1 field1,type2 field2,...)` of the primary type
    pub fn encode_type(&self) -> &str {
        &self.encoded_type
    }

    /// Hash of the domain
    pub fn domain_separator(&self) -> B256 {
        self.domain_separator
    }

    /// Hash of the primary message
    pub fn message_hash(&self) -> B256 {
        self.message_hash
    }

    /// Digest the user signs
    pub fn digest(&self) -> B256 {
        self.digest
    }
}

fn schema(fields: &[(&str, &str)]) -> Vec<TypedField> {
    fields
        .iter()
        .map(|(name, kind)| TypedField {
            name: name.to_string(),
            kind: kind.to_string(),
        })
        .collect()
}

/// Parse an Ethereum address given as hex.
pub fn parse_eth_address(address: &str) -> Result<EthAddress> {
    let value = parse_word(address).map_err(|_| RoundError::InvalidAddress(address.to_string()))?;
    if value >> 160 != U256::ZERO {
        return Err(RoundError::InvalidAddress(address.to_string()));
    }
    Ok(EthAddress::from_word(B256::from(value.to_be_bytes::<32>())))
}

/// Typed message for a proposal by `proposer`.
pub fn build_propose_message(
    domain: TypedDataDomain,
    proposer: &str,
    message: &ProposeMessage,
    salt: U256,
) -> Result<TypedMessage> {
    let payload = Propose {
        authStrategy: address_to_b256(&message.auth_strategy)?,
        houseStrategy: address_to_b256(&message.round)?,
        proposerAddress: parse_eth_address(proposer)?,
        metadataUri: message.metadata_uri.clone(),
        salt,
    };

    let values = vec![
        ("authStrategy", FieldValue::Bytes32(payload.authStrategy)),
        ("houseStrategy", FieldValue::Bytes32(payload.houseStrategy)),
        ("proposerAddress", FieldValue::Address(payload.proposerAddress)),
        ("metadataUri", FieldValue::String(payload.metadataUri.clone())),
        ("salt", FieldValue::Uint256(payload.salt)),
    ];
    Ok(TypedMessage::new(domain, PROPOSE_TYPE, PROPOSE_FIELDS, &payload, values))
}

/// Typed message for votes by `voter`, with the strategy parameters the vote
/// calldata will carry.
pub fn build_vote_message(
    domain: TypedDataDomain,
    voter: &str,
    message: &VoteMessage,
    strategy_params: &[Vec<String>],
    salt: U256,
) -> Result<TypedMessage> {
    if strategy_params.len() != message.voting_strategy_ids.len() {
        return Err(RoundError::StrategyParamsLengthMismatch {
            indices: message.voting_strategy_ids.len(),
            params: strategy_params.len(),
        });
    }

    let payload = Vote {
        authStrategy: address_to_b256(&message.auth_strategy)?,
        houseStrategy: address_to_b256(&message.round)?,
        voterAddress: parse_eth_address(voter)?,
        proposalVotesHash: proposal_votes_hash(&message.votes),
        votingStrategiesHash: voting_strategies_hash(&message.voting_strategy_ids),
        votingStrategyParamsHash: voting_strategy_params_hash(strategy_params)?,
        salt,
    };

    let values = vec![
        ("authStrategy", FieldValue::Bytes32(payload.authStrategy)),
        ("houseStrategy", FieldValue::Bytes32(payload.houseStrategy)),
        ("voterAddress", FieldValue::Address(payload.voterAddress)),
        ("proposalVotesHash", FieldValue::Bytes32(payload.proposalVotesHash)),
        ("votingStrategiesHash", FieldValue::Bytes32(payload.votingStrategiesHash)),
        (
            "votingStrategyParamsHash",
            FieldValue::Bytes32(payload.votingStrategyParamsHash),
        ),
        ("salt", FieldValue::Uint256(payload.salt)),
    ];
    Ok(TypedMessage::new(domain, VOTE_TYPE, VOTE_FIELDS, &payload, values))
}

/// Typed message cancelling a proposal by `proposer`.
pub fn build_cancel_proposal_message(
    domain: TypedDataDomain,
    proposer: &str,
    message: &CancelProposalMessage,
    salt: U256,
) -> Result<TypedMessage> {
    let payload = CancelProposal {
        authStrategy: address_to_b256(&message.auth_strategy)?,
        houseStrategy: address_to_b256(&message.round)?,
        proposerAddress: parse_eth_address(proposer)?,
        proposalId: message.proposal_id,
        salt,
    };

    let values = vec![
        ("authStrategy", FieldValue::Bytes32(payload.authStrategy)),
        ("houseStrategy", FieldValue::Bytes32(payload.houseStrategy)),
        ("proposerAddress", FieldValue::Address(payload.proposerAddress)),
        ("proposalId", FieldValue::Uint256(payload.proposalId)),
        ("salt", FieldValue::Uint256(payload.salt)),
    ];
    Ok(TypedMessage::new(
        domain,
        CANCEL_PROPOSAL_TYPE,
        CANCEL_PROPOSAL_FIELDS,
        &payload,
        values,
    ))
}

/// Recover the Ethereum address that produced `signature` over `digest`.
pub fn recover_signer(digest: B256, signature: &EthSignature) -> Result<EthAddress> {
    let bytes = signature.to_bytes();
    let sig = Signature::from_slice(&bytes[..64])
        .map_err(|e| RoundError::InvalidSignature(e.to_string()))?;
    let recovery_id = RecoveryId::from_byte(signature.recovery_id()).ok_or_else(|| {
        RoundError::InvalidSignature(format!("bad recovery byte {}", signature.v))
    })?;

    let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &sig, recovery_id)
        .map_err(|e| RoundError::InvalidSignature(e.to_string()))?;
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Ok(EthAddress::from_slice(&hash[12..]))
}

/// Check that `signature` over `message` was produced by `signer`.
pub fn verify_signer(message: &TypedMessage, signature: &EthSignature, signer: &str) -> Result<()> {
    let expected = parse_eth_address(signer)?;
    let recovered = recover_signer(message.digest(), signature)?;
    if recovered != expected {
        return Err(RoundError::InvalidSignature(format!(
            "signed by {}, expected {}",
            recovered, expected
        )));
    }
    Ok(())
}
