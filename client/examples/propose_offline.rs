//! Example: Encode a proposal without touching the network
//!
//! Builds a direct proposal and a signature-authorized proposal for a local
//! devnet round and prints the resulting calls.

use alloy_primitives::{keccak256, Address as EthAddress, U256};
use house_round_client::constants::DEVNET_DEPLOYMENT;
use house_round_client::{ClientConfig, Envelope, EthSignature, ProposeMessage, RoundClient};
use k256::ecdsa::SigningKey;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("house_round_client=info")),
        )
        .init();

    let client = RoundClient::new(Arc::new(ClientConfig::devnet()))?;

    let message = ProposeMessage {
        auth_strategy: DEVNET_DEPLOYMENT.vanilla_auth.to_string(),
        round: "0x500".to_string(),
        metadata_uri: "ipfs://Qm123".to_string(),
    };
    let call = client.propose(&Envelope::vanilla("0xabc123", message.clone()))?;
    println!("Direct proposal:\n{}\n", serde_json::to_string_pretty(&call)?);

    // Gasless proposal: the proposer signs a typed message instead of sending
    // the transaction themselves.
    let key = SigningKey::from_slice(&[0x42; 32])?;
    let point = key.verifying_key().to_encoded_point(false);
    let proposer = EthAddress::from_slice(&keccak256(&point.as_bytes()[1..])[12..]).to_string();

    let message = ProposeMessage {
        auth_strategy: DEVNET_DEPLOYMENT.ethereum_sig_auth.to_string(),
        ..message
    };
    let salt = U256::from(chrono::Utc::now().timestamp_millis().max(0) as u64);
    let typed = client.propose_typed_message(&proposer, &message, salt)?;
    println!("Typed message:\n{}\n", serde_json::to_string_pretty(&typed)?);

    let (signature, recovery_id) = key.sign_prehash_recoverable(typed.digest().as_slice())?;
    let mut bytes = [0u8; 65];
    bytes[..64].copy_from_slice(&signature.to_bytes());
    bytes[64] = recovery_id.to_byte() + 27;

    let envelope = Envelope::signed(proposer, EthSignature::from_bytes(&bytes), salt, message);
    let call = client.propose(&envelope)?;
    println!("Signed proposal:\n{}", serde_json::to_string_pretty(&call)?);

    Ok(())
}
