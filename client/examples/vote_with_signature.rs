//! Example: Resolve voting strategies and encode a signed vote
//!
//! Needs a devnet with a deployed round. Set `ROUND_ADDRESS` to the round
//! contract and optionally `STRATEGY_IDS` to a comma-separated index list.

use alloy_primitives::{keccak256, Address as EthAddress, U256};
use anyhow::Context;
use house_round_client::constants::DEVNET_DEPLOYMENT;
use house_round_client::{
    ClientConfig, Envelope, EthSignature, ProposalVote, RoundClient, StarknetRpcClient,
    VoteMessage,
};
use k256::ecdsa::SigningKey;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("house_round_client=debug")),
        )
        .init();

    let round = std::env::var("ROUND_ADDRESS").context("ROUND_ADDRESS is not set")?;
    let strategy_ids = std::env::var("STRATEGY_IDS")
        .unwrap_or_else(|_| "0".to_string())
        .split(',')
        .map(|s| s.trim().parse::<u16>())
        .collect::<Result<Vec<_>, _>>()
        .context("STRATEGY_IDS must be comma-separated integers")?;

    let config = Arc::new(ClientConfig::devnet());
    StarknetRpcClient::new(&config)?
        .health_check()
        .await
        .context("devnet is not reachable")?;

    let client = RoundClient::new(config)?;

    let key = SigningKey::from_slice(&[0x42; 32])?;
    let point = key.verifying_key().to_encoded_point(false);
    let voter = EthAddress::from_slice(&keccak256(&point.as_bytes()[1..])[12..]).to_string();

    let message = VoteMessage {
        auth_strategy: DEVNET_DEPLOYMENT.ethereum_sig_auth.to_string(),
        round,
        votes: vec![ProposalVote::new(1, 1u64)],
        voting_strategy_ids: strategy_ids,
    };
    let salt = U256::from(chrono::Utc::now().timestamp_millis().max(0) as u64);

    let typed = client.vote_typed_message(&voter, &message, salt).await?;
    let (signature, recovery_id) = key.sign_prehash_recoverable(typed.digest().as_slice())?;
    let mut bytes = [0u8; 65];
    bytes[..64].copy_from_slice(&signature.to_bytes());
    bytes[64] = recovery_id.to_byte() + 27;

    let envelope = Envelope::signed(voter, EthSignature::from_bytes(&bytes), salt, message);
    let call = client.vote(&envelope).await?;
    println!("{}", serde_json::to_string_pretty(&call)?);

    Ok(())
}
