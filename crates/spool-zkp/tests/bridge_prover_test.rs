//! DelegatedBridgeProver over HttpBridgeClient and a wiremock bridge.

use chrono::{Duration, Utc};
use serde_json::json;
use spool_bridge_client::{BridgeConfig, HttpBridgeClient};
use spool_core::{ProofInputs, ProofType};
use spool_zkp::{DelegatedBridgeProver, ProverConfig, ProverError, ZkProver};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const POOL: &str = "0x1111111111111111111111111111111111111111";

fn prover(server: &MockServer) -> DelegatedBridgeProver<HttpBridgeClient> {
    let mut bridge = BridgeConfig::new(server.uri().parse().unwrap(), "test-token");
    bridge.timeout_secs = 5;
    let mut config = ProverConfig::default();
    config.verifiers.insert(ProofType::Unshield, POOL.into());
    DelegatedBridgeProver::new(config, HttpBridgeClient::new(bridge).unwrap()).unwrap()
}

fn inputs(pairs: &[(&str, serde_json::Value)]) -> ProofInputs {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

async fn mount_transaction(server: &MockServer, endpoint: &str, expected_body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(endpoint))
        .and(body_partial_json(expected_body))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "transaction": { "to": POOL, "data": "0xdeadbeef", "chainId": 137 } }
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn unshield_proof_wraps_bridge_transaction() {
    let server = MockServer::start().await;
    mount_transaction(
        &server,
        "/api/v1/unshield",
        json!({
            "network": "polygon",
            "walletId": "w-7",
            "token": "USDC",
            "amount": "2500",
            "recipient": "0xabc"
        }),
    )
    .await;
    let p = prover(&server);

    let private = inputs(&[("walletId", json!("w-7")), ("amount", json!(2500))]);
    let public = inputs(&[
        ("network", json!("Polygon")),
        ("token", json!("USDC")),
        ("recipient", json!("0xabc")),
    ]);
    let proof = p.generate_proof(ProofType::Unshield, &private, &public).await.unwrap();

    assert_eq!(proof.verifier_address, POOL);
    assert_eq!(proof.public_inputs, public);
    assert_eq!(proof.metadata_str("provider"), Some("delegated-bridge"));
    assert_eq!(proof.metadata_str("operation"), Some("unshield"));
    assert_eq!(proof.metadata_str("network"), Some("polygon"));
    assert_eq!(proof.expires_at - proof.created_at, Duration::days(90));

    let tx: serde_json::Value = serde_json::from_slice(&proof.proof).unwrap();
    assert_eq!(tx["to"], POOL);
    assert_eq!(tx["chainId"], 137);

    assert!(p.verify_proof(&proof).await.unwrap());
}

#[tokio::test]
async fn unmapped_type_never_reaches_the_bridge() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let result = prover(&server)
        .generate_proof(ProofType::KycTier, &ProofInputs::new(), &ProofInputs::new())
        .await;
    assert!(matches!(
        result,
        Err(ProverError::UnmappedProofType {
            provider: "delegated-bridge",
            ..
        })
    ));
}

#[tokio::test]
async fn missing_fields_are_invalid_inputs() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let partial = inputs(&[
        ("network", json!("polygon")),
        ("wallet_id", json!("w-1")),
        ("token", json!("USDC")),
        ("amount", json!("10")),
    ]);
    let result = prover(&server)
        .generate_proof(ProofType::Transfer, &partial, &ProofInputs::new())
        .await;
    match result {
        Err(ProverError::InvalidInputs { proof_type, reason }) => {
            assert_eq!(proof_type, ProofType::Transfer);
            assert!(reason.contains("recipient"));
        }
        other => panic!("expected InvalidInputs, got {other:?}"),
    }
}

#[tokio::test]
async fn bridge_outage_is_bridge_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/shield"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let shield = inputs(&[
        ("network", json!("polygon")),
        ("wallet_id", json!("w-1")),
        ("token", json!("USDC")),
        ("amount", json!("10")),
    ]);
    let result = prover(&server)
        .generate_proof(ProofType::Shield, &shield, &ProofInputs::new())
        .await;
    assert!(matches!(result, Err(ProverError::Bridge(_))));
}

#[tokio::test]
async fn verify_checks_freshness_tag_and_shape() {
    let server = MockServer::start().await;
    mount_transaction(&server, "/api/v1/shield", json!({ "walletId": "w-1" })).await;
    let p = prover(&server);
    let shield = inputs(&[
        ("network", json!("polygon")),
        ("wallet_id", json!("w-1")),
        ("token", json!("USDC")),
        ("amount", json!("10")),
    ]);
    let proof = p.generate_proof(ProofType::Shield, &shield, &ProofInputs::new()).await.unwrap();
    assert!(p.verify_proof(&proof).await.unwrap());

    let mut expired = proof.clone();
    expired.created_at = Utc::now() - Duration::days(100);
    expired.expires_at = expired.created_at + Duration::days(90);
    assert!(!p.verify_proof(&expired).await.unwrap());

    let mut untagged = proof.clone();
    untagged.metadata.insert("provider".into(), json!("local-circuit"));
    assert!(!p.verify_proof(&untagged).await.unwrap());

    let mut garbled = proof.clone();
    garbled.proof = b"not json".to_vec();
    assert!(!p.verify_proof(&garbled).await.unwrap());

    let mut relabelled = proof.clone();
    relabelled.proof_type = ProofType::Transfer;
    assert!(!p.verify_proof(&relabelled).await.unwrap());

    let mut unmapped = proof.clone();
    unmapped.proof_type = ProofType::KycTier;
    assert!(!p.verify_proof(&unmapped).await.unwrap());

    let mut bad_to = proof.clone();
    bad_to.proof = serde_json::to_vec(&json!({ "to": "pool", "data": "0x" })).unwrap();
    assert!(!p.verify_proof(&bad_to).await.unwrap());
}
