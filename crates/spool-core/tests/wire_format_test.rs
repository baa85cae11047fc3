//! # Wire Format Vectors
//!
//! Fixed JSON shapes for the records other services read: hashes and
//! commitments as canonical `0x` hex, networks as bare strings, proof bytes
//! as base64. A change here breaks consumers, not just tests.

use chrono::{TimeZone, Utc};
use serde_json::json;
use spool_core::{
    path_indices_from_leaf_index, Commitment, Hash32, MerklePath, MerkleRoot, NetworkId,
    ProofInputs, ProofType, ValidationError, ZkProof,
};

fn hex32(b: u8) -> String {
    format!("0x{}", format!("{b:02x}").repeat(32))
}

#[test]
fn merkle_path_json_shape() {
    let path = MerklePath {
        commitment: Commitment::parse(&"AB".repeat(32)).unwrap(),
        root: Hash32::from_bytes([0x01; 32]),
        network: NetworkId::new(" Polygon "),
        leaf_index: 6,
        siblings: vec![Hash32::from_bytes([0x02; 32]), Hash32::from_bytes([0x03; 32])],
        path_indices: path_indices_from_leaf_index(6, 2),
    };
    assert_eq!(
        serde_json::to_value(&path).unwrap(),
        json!({
            "commitment": hex32(0xab),
            "root": hex32(0x01),
            "network": "polygon",
            "leaf_index": 6,
            "siblings": [hex32(0x02), hex32(0x03)],
            "path_indices": [0, 1]
        })
    );
}

#[test]
fn merkle_root_json_shape() {
    let root = MerkleRoot {
        root: Hash32::from_bytes([0xff; 32]),
        network: NetworkId::new("ethereum"),
        leaf_count: 3,
        tree_depth: 32,
        block_number: 19_000_000,
        synced_at: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
    };
    let value = serde_json::to_value(&root).unwrap();
    assert_eq!(value["root"], hex32(0xff));
    assert_eq!(value["network"], "ethereum");
    assert_eq!(value["synced_at"], "2026-01-02T03:04:05Z");
}

#[test]
fn inbound_path_with_unprefixed_uppercase_hex_is_canonicalized() {
    let inbound = json!({
        "commitment": "CD".repeat(32),
        "root": "0x".to_string() + &"EF".repeat(32),
        "network": "polygon",
        "leaf_index": 0,
        "siblings": [],
        "path_indices": []
    });
    let path: MerklePath = serde_json::from_value(inbound).unwrap();
    assert_eq!(path.commitment.canonical(), hex32(0xcd));
    assert_eq!(path.root.to_prefixed_hex(), hex32(0xef));
}

#[test]
fn malformed_commitment_is_rejected_on_deserialize() {
    let result: Result<Commitment, _> = serde_json::from_value(json!("0x1234"));
    assert!(result.is_err());
    assert!(matches!(
        Commitment::parse("0x1234"),
        Err(ValidationError::InvalidCommitment { .. })
    ));
}

#[test]
fn zk_proof_json_shape() {
    let created_at = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
    let proof = ZkProof {
        proof_type: ProofType::SanctionsClearance,
        proof: b"proof".to_vec(),
        public_inputs: ProofInputs::from([("list_root".to_string(), json!(hex32(0x09)))]),
        verifier_address: String::new(),
        created_at,
        expires_at: created_at + chrono::Duration::days(90),
        metadata: ProofInputs::new(),
    };
    let value = serde_json::to_value(&proof).unwrap();
    assert_eq!(value["proof_type"], "sanctions-clearance");
    assert_eq!(value["proof"], "cHJvb2Y=");
    assert_eq!(value["expires_at"], "2026-05-30T00:00:00Z");
}
