//! Integration tests for the round client
//!
//! These tests use mock servers to simulate Starknet and Ethereum JSON-RPC
//! responses.

use alloy_primitives::{keccak256, Address as EthAddress, U256};
use assert_matches::assert_matches;
use house_round_client::chain::storage_var_address;
use house_round_client::codec::{selector_from_name, to_hex};
use house_round_client::constants::DEVNET_DEPLOYMENT;
use house_round_client::strategies::voting::mapping_slot_key;
use house_round_client::{
    ClientConfig, Envelope, EthSignature, ProposalVote, ProposeMessage, RoundClient, RoundError,
    VoteMessage,
};
use k256::ecdsa::SigningKey;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::{
    matchers::{body_partial_json, method},
    Mock, MockServer, ResponseTemplate,
};

const ROUND: &str = "0x500";
const VOTER: &str = "0x000000000000000000000000000000000000dead";
const TOKEN: &str = "0x1f9840a85d5af5bf1d1762f925bdaddc4201f984";

/// Helper to create test config pointing at mock servers
fn create_test_config(starknet_url: String, ethereum_url: Option<String>) -> Arc<ClientConfig> {
    let mut config = ClientConfig::devnet()
        .with_starknet_rpc_url(starknet_url)
        .with_request_timeout(Duration::from_secs(5))
        .with_max_retries(3)
        .with_retry_config(10, 50, 2.0);
    config.ethereum_rpc_url = ethereum_url;
    Arc::new(config)
}

fn rpc_result(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": result,
    }))
}

fn selector(entrypoint: &str) -> String {
    to_hex(selector_from_name(entrypoint))
}

/// Round `ROUND` stores strategy hash `hash` at `index`.
async fn mount_strategy_hash(server: &MockServer, index: u16, hash: &str) {
    let slot = storage_var_address("_voting_strategies", &[U256::from(index)]).unwrap();
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "starknet_getStorageAt",
            "params": { "contract_address": ROUND, "key": to_hex(slot) }
        })))
        .respond_with(rpc_result(json!(hash)))
        .mount(server)
        .await;
}

/// Registry maps strategy hash `hash` to `address`.
async fn mount_registry_entry(server: &MockServer, hash: &str, address: &str) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "starknet_call",
            "params": { "request": {
                "entry_point_selector": selector("get_voting_strategy"),
                "calldata": [hash]
            }}
        })))
        .respond_with(rpc_result(json!([address])))
        .mount(server)
        .await;
}

fn vote_message(auth_strategy: &str, indices: Vec<u16>) -> VoteMessage {
    VoteMessage {
        auth_strategy: auth_strategy.to_string(),
        round: ROUND.to_string(),
        votes: vec![ProposalVote::new(1, 10u64), ProposalVote::new(7, 5u64)],
        voting_strategy_ids: indices,
    }
}

#[tokio::test]
async fn test_client_creation_and_validation() {
    assert!(RoundClient::new(Arc::new(ClientConfig::devnet())).is_ok());

    let invalid = ClientConfig::devnet().with_starknet_rpc_url("not a url");
    assert_matches!(
        RoundClient::new(Arc::new(invalid)),
        Err(RoundError::ClientConfig(_))
    );
}

#[tokio::test]
async fn test_propose_fixture() {
    let client = RoundClient::new(create_test_config("http://127.0.0.1:1".to_string(), None))
        .unwrap();

    let envelope = Envelope::vanilla(
        "0xabc123",
        ProposeMessage {
            auth_strategy: DEVNET_DEPLOYMENT.vanilla_auth.to_string(),
            round: ROUND.to_string(),
            metadata_uri: "ipfs://Qm123".to_string(),
        },
    );
    let call = client.propose(&envelope).unwrap();

    assert_eq!(call.contract_address, DEVNET_DEPLOYMENT.vanilla_auth);
    assert_eq!(call.entrypoint, "authenticate");
    assert_eq!(
        call.calldata,
        vec![
            ROUND.to_string(),
            selector("propose"),
            "0x5".to_string(),
            "0xabc123".to_string(),
            "0xc".to_string(),
            "0x2".to_string(),
            "0x512f2f3a73667069".to_string(),
            "0x3332316d".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_propose_unknown_auth_strategy() {
    let client = RoundClient::new(create_test_config("http://127.0.0.1:1".to_string(), None))
        .unwrap();

    let envelope = Envelope::vanilla(
        "0xabc123",
        ProposeMessage {
            auth_strategy: "0xdeadbeef9".to_string(),
            round: ROUND.to_string(),
            metadata_uri: "ipfs://Qm123".to_string(),
        },
    );
    assert_matches!(
        client.propose(&envelope),
        Err(RoundError::UnknownAuthStrategy(addr)) if addr == "0xdeadbeef9"
    );
}

#[tokio::test]
async fn test_vanilla_vote_end_to_end() {
    let starknet = MockServer::start().await;
    mount_strategy_hash(&starknet, 0, "0xaaa").await;
    mount_registry_entry(&starknet, "0xaaa", DEVNET_DEPLOYMENT.vanilla_voting).await;

    let client = RoundClient::new(create_test_config(starknet.uri(), None)).unwrap();
    let envelope = Envelope::vanilla(VOTER, vote_message(DEVNET_DEPLOYMENT.vanilla_auth, vec![0]));
    let call = client.vote(&envelope).await.unwrap();

    assert_eq!(call.contract_address, DEVNET_DEPLOYMENT.vanilla_auth);
    assert_eq!(call.calldata[0], ROUND);
    assert_eq!(call.calldata[1], selector("vote"));
    assert_eq!(
        &call.calldata[2..],
        &[
            "0xb", VOTER, "0x2", "0x1", "0xa", "0x0", "0x7", "0x5", "0x0", "0x1", "0x0", "0x0"
        ]
    );
}

#[tokio::test]
async fn test_balance_of_vote_end_to_end() {
    let starknet = MockServer::start().await;
    let ethereum = MockServer::start().await;

    mount_strategy_hash(&starknet, 1, "0xbbb").await;
    mount_registry_entry(&starknet, "0xbbb", DEVNET_DEPLOYMENT.ethereum_balance_of_voting).await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "starknet_call",
            "params": { "request": {
                "contract_address": ROUND,
                "entry_point_selector": selector("get_voting_strategy_params"),
                "calldata": ["0x1"]
            }}
        })))
        .respond_with(rpc_result(json!([TOKEN, "0x3"])))
        .mount(&starknet)
        .await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "starknet_call",
            "params": { "request": {
                "contract_address": ROUND,
                "entry_point_selector": selector("get_snapshot_block_number")
            }}
        })))
        .respond_with(rpc_result(json!(["0x64"])))
        .mount(&starknet)
        .await;

    let key = mapping_slot_key(VOTER, U256::from(3u64)).unwrap();
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "eth_getProof",
            "params": [TOKEN, [format!("0x{}", hex::encode(key.to_be_bytes::<32>()))], "0x64"]
        })))
        .respond_with(rpc_result(json!({
            "address": TOKEN,
            "storageProof": [{
                "key": to_hex(key),
                "value": "0x2a",
                "proof": ["0x0102030405060708090a"]
            }]
        })))
        .expect(1)
        .mount(&ethereum)
        .await;

    let client = RoundClient::new(create_test_config(starknet.uri(), Some(ethereum.uri()))).unwrap();
    let envelope = Envelope::vanilla(VOTER, vote_message(DEVNET_DEPLOYMENT.vanilla_auth, vec![1]));
    let call = client.vote(&envelope).await.unwrap();

    // [round, selector, len, voter, vote_count, 2 x 3 vote words, strategy_count, index, ...]
    assert_eq!(call.calldata[11], "0x1");
    assert_eq!(call.calldata[12], "0x1");
    assert_eq!(call.calldata[13], "0x9");
    assert_eq!(call.calldata[14], to_hex(key & U256::from(u128::MAX)));
    assert_eq!(call.calldata[15], to_hex(key >> 128));
    assert_eq!(
        &call.calldata[16..],
        &["0x1", "0xa", "0x1", "0x2", "0x2", "0x807060504030201", "0xa09"]
    );
}

#[tokio::test]
async fn test_unknown_voting_strategy() {
    let starknet = MockServer::start().await;
    mount_strategy_hash(&starknet, 0, "0xccc").await;
    mount_registry_entry(&starknet, "0xccc", "0xdeadbeef9").await;

    let client = RoundClient::new(create_test_config(starknet.uri(), None)).unwrap();
    let envelope = Envelope::vanilla(VOTER, vote_message(DEVNET_DEPLOYMENT.vanilla_auth, vec![0]));

    assert_matches!(
        client.vote(&envelope).await,
        Err(RoundError::UnknownVotingStrategy(_))
    );
}

#[tokio::test]
async fn test_rpc_error_is_not_retried() {
    let starknet = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": 20, "message": "Contract not found" }
        })))
        .expect(1)
        .mount(&starknet)
        .await;

    let client = RoundClient::new(create_test_config(starknet.uri(), None)).unwrap();
    let envelope = Envelope::vanilla(VOTER, vote_message(DEVNET_DEPLOYMENT.vanilla_auth, vec![0]));

    assert_matches!(
        client.vote(&envelope).await,
        Err(RoundError::Rpc(msg)) if msg.contains("Contract not found")
    );
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let starknet = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&starknet)
        .await;
    mount_strategy_hash(&starknet, 0, "0xaaa").await;
    mount_registry_entry(&starknet, "0xaaa", DEVNET_DEPLOYMENT.vanilla_voting).await;

    let client = RoundClient::new(create_test_config(starknet.uri(), None)).unwrap();
    let envelope = Envelope::vanilla(VOTER, vote_message(DEVNET_DEPLOYMENT.vanilla_auth, vec![0]));

    assert!(client.vote(&envelope).await.is_ok());
}

#[tokio::test]
async fn test_max_retries_exceeded() {
    let starknet = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .expect(4) // Initial + 3 retries
        .mount(&starknet)
        .await;

    let client = RoundClient::new(create_test_config(starknet.uri(), None)).unwrap();
    let envelope = Envelope::vanilla(VOTER, vote_message(DEVNET_DEPLOYMENT.vanilla_auth, vec![0]));

    assert_matches!(
        client.vote(&envelope).await,
        Err(RoundError::MaxRetriesExceeded(3))
    );
}

#[tokio::test]
async fn test_signed_vote_end_to_end() {
    let starknet = MockServer::start().await;
    mount_strategy_hash(&starknet, 0, "0xaaa").await;
    mount_registry_entry(&starknet, "0xaaa", DEVNET_DEPLOYMENT.vanilla_voting).await;

    let client = RoundClient::new(create_test_config(starknet.uri(), None)).unwrap();

    let key = SigningKey::from_slice(&[3u8; 32]).unwrap();
    let point = key.verifying_key().to_encoded_point(false);
    let voter = EthAddress::from_slice(&keccak256(&point.as_bytes()[1..])[12..]).to_string();

    let message = vote_message(DEVNET_DEPLOYMENT.ethereum_sig_auth, vec![0]);
    let salt = U256::from(12345u64);
    let typed = client.vote_typed_message(&voter, &message, salt).await.unwrap();

    let (sig, recid) = key
        .sign_prehash_recoverable(typed.digest().as_slice())
        .unwrap();
    let mut bytes = [0u8; 65];
    bytes[..64].copy_from_slice(&sig.to_bytes());
    bytes[64] = recid.to_byte() + 27;
    let signature = EthSignature::from_bytes(&bytes);

    let envelope = Envelope::signed(voter.clone(), signature, salt, message.clone());
    let call = client.vote(&envelope).await.unwrap();
    assert_eq!(call.contract_address, DEVNET_DEPLOYMENT.ethereum_sig_auth);
    assert_eq!(call.calldata[4], to_hex(signature.v));
    assert_eq!(call.calldata[5], "0x3039");

    // Same signature over a different salt does not verify
    let forged = Envelope::signed(voter, signature, U256::from(1u64), message);
    assert_matches!(
        client.vote(&forged).await,
        Err(RoundError::InvalidSignature(_))
    );
}
