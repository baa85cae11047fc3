//! Request and response types for the bridge API.
//!
//! Field names are camelCase on the wire. Response types use
//! `#[serde(default)]` for resilience against schema evolution on the
//! bridge side; `deny_unknown_fields` is intentionally not used.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use spool_core::Hash32;

// -- Merkle ------------------------------------------------------------------

/// `GET /api/v1/merkle/{network}/root`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeMerkleRoot {
    pub root: Hash32,
    #[serde(default)]
    pub leaf_count: u64,
    #[serde(default)]
    pub block_number: u64,
    #[serde(default)]
    pub tree_depth: Option<u32>,
}

/// `GET /api/v1/merkle/{network}/proof/{commitment}`
///
/// Taken verbatim: the bridge holds the real tree, so its path bits are
/// authoritative even when they disagree with `leaf_index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeMerkleProof {
    pub root: Hash32,
    pub leaf_index: u64,
    #[serde(alias = "pathElements")]
    pub siblings: Vec<Hash32>,
    #[serde(alias = "indices")]
    pub path_indices: Vec<u8>,
}

// -- Transactions --------------------------------------------------------------

/// `POST /api/v1/shield`: move public tokens into the pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShieldRequest {
    pub network: String,
    pub wallet_id: String,
    pub token: String,
    /// Base-unit amount as a decimal string.
    pub amount: String,
}

/// `POST /api/v1/unshield`: withdraw to a public address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnshieldRequest {
    pub network: String,
    pub wallet_id: String,
    pub token: String,
    pub amount: String,
    /// Public recipient address.
    pub recipient: String,
}

/// `POST /api/v1/transfer`: private transfer to another shielded address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub network: String,
    pub wallet_id: String,
    pub token: String,
    pub amount: String,
    /// Shielded recipient address.
    pub recipient: String,
}

/// A submittable transaction built by the bridge.
///
/// Unmodeled fields are kept in `extra` so the payload round-trips
/// unchanged into the proof blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPayload {
    pub to: String,
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BuiltTransaction {
    pub transaction: TransactionPayload,
}

// -- Wallets & health ----------------------------------------------------------

/// `POST /api/v1/wallets`
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWalletRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub id: String,
    /// Shielded receiving address.
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    pub token: String,
    pub amount: String,
}

/// `GET /api/v1/wallets/{id}/balance`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletBalance {
    #[serde(default)]
    pub wallet_id: Option<String>,
    #[serde(default)]
    pub balances: Vec<TokenBalance>,
}

/// `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self.status.to_ascii_lowercase().as_str(), "ok" | "healthy" | "up")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merkle_proof_accepts_alias_field_names() {
        let json = format!(
            r#"{{"root":"0x{r}","leafIndex":5,"pathElements":["0x{s}"],"indices":[1]}}"#,
            r = "aa".repeat(32),
            s = "bb".repeat(32)
        );
        let proof: BridgeMerkleProof = serde_json::from_str(&json).unwrap();
        assert_eq!(proof.leaf_index, 5);
        assert_eq!(proof.siblings, vec![Hash32::from_bytes([0xbb; 32])]);
        assert_eq!(proof.path_indices, vec![1]);
    }

    #[test]
    fn transaction_payload_keeps_unknown_fields() {
        let json = r#"{"to":"0x1234","data":"0xdeadbeef","nonce":7}"#;
        let tx: TransactionPayload = serde_json::from_str(json).unwrap();
        assert_eq!(tx.extra.get("nonce"), Some(&serde_json::json!(7)));
        let back = serde_json::to_value(&tx).unwrap();
        assert_eq!(back["nonce"], 7);
        assert!(back.get("value").is_none());
    }

    #[test]
    fn requests_serialize_camel_case() {
        let req = ShieldRequest {
            network: "polygon".into(),
            wallet_id: "w1".into(),
            token: "0xtoken".into(),
            amount: "100".into(),
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["walletId"], "w1");
    }

    #[test]
    fn health_status_accepts_common_spellings() {
        let h: HealthStatus = serde_json::from_str(r#"{"status":"OK"}"#).unwrap();
        assert!(h.is_ok());
        let h: HealthStatus = serde_json::from_str(r#"{"status":"degraded"}"#).unwrap();
        assert!(!h.is_ok());
    }
}
