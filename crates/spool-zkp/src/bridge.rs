//! # Delegated Bridge Prover
//!
//! Hands pool operations to the bridge, which builds the transaction and
//! its proof in one step. The returned proof blob is the JSON of the
//! bridge's [`TransactionPayload`].
//!
//! ## Input Fields
//!
//! Read from the merged private and public inputs. Strings or numbers
//! are accepted; numbers are rendered in decimal.
//!
//! | Field | Aliases | Operations |
//! |-------|---------|------------|
//! | `network` | | all |
//! | `wallet_id` | `walletId` | all |
//! | `token` | | all |
//! | `amount` | | all |
//! | `recipient` | | unshield, transfer |

use chrono::Utc;
use spool_bridge_client::{
    BridgeClient, ShieldRequest, TransactionPayload, TransferRequest, UnshieldRequest,
};
use spool_core::{ProofInputs, ProofType, ZkProof};

use crate::config::{BridgeOperation, ProverConfig};
use crate::error::ProverError;
use crate::traits::{merge_inputs, ZkProver};

/// Bridge-backed prover, generic over the client for testing.
#[derive(Debug)]
pub struct DelegatedBridgeProver<B> {
    config: ProverConfig,
    bridge: B,
}

impl<B: BridgeClient> DelegatedBridgeProver<B> {
    pub const NAME: &'static str = "delegated-bridge";

    pub fn new(config: ProverConfig, bridge: B) -> Result<Self, ProverError> {
        config.validate()?;
        Ok(Self { config, bridge })
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    fn operation_for(&self, proof_type: ProofType) -> Result<BridgeOperation, ProverError> {
        self.config
            .bridge
            .operations
            .get(&proof_type)
            .copied()
            .ok_or(ProverError::UnmappedProofType {
                proof_type,
                provider: Self::NAME,
            })
    }

    async fn build(
        &self,
        proof_type: ProofType,
        operation: BridgeOperation,
        inputs: &ProofInputs,
    ) -> Result<TransactionPayload, ProverError> {
        let field = |names: &[&str]| text_input(proof_type, inputs, names);
        let network = field(&["network"])?.to_ascii_lowercase();
        let wallet_id = field(&["wallet_id", "walletId"])?;
        let token = field(&["token"])?;
        let amount = field(&["amount"])?;

        let payload = match operation {
            BridgeOperation::Shield => {
                let req = ShieldRequest {
                    network,
                    wallet_id,
                    token,
                    amount,
                };
                self.bridge.shield(&req).await?
            }
            BridgeOperation::Unshield => {
                let req = UnshieldRequest {
                    network,
                    wallet_id,
                    token,
                    amount,
                    recipient: field(&["recipient"])?,
                };
                self.bridge.unshield(&req).await?
            }
            BridgeOperation::Transfer => {
                let req = TransferRequest {
                    network,
                    wallet_id,
                    token,
                    amount,
                    recipient: field(&["recipient"])?,
                };
                self.bridge.transfer(&req).await?
            }
        };
        Ok(payload)
    }
}

/// First of `names` present in `inputs`, as non-empty text.
fn text_input(proof_type: ProofType, inputs: &ProofInputs, names: &[&str]) -> Result<String, ProverError> {
    let invalid = |reason: String| ProverError::InvalidInputs { proof_type, reason };
    let (name, value) = names
        .iter()
        .find_map(|n| inputs.get(*n).map(|v| (*n, v)))
        .ok_or_else(|| invalid(format!("missing field {:?}", names[0])))?;
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        _ => Err(invalid(format!("field {name:?} must be a non-empty string or number"))),
    }
}

fn is_hex_address(s: &str) -> bool {
    s.len() == 42 && s.starts_with("0x") && s[2..].chars().all(|c| c.is_ascii_hexdigit())
}

fn is_hex_data(s: &str) -> bool {
    s.strip_prefix("0x")
        .is_some_and(|h| h.len() % 2 == 0 && h.chars().all(|c| c.is_ascii_hexdigit()))
}

impl<B: BridgeClient> ZkProver for DelegatedBridgeProver<B> {
    fn provider_name(&self) -> &'static str {
        Self::NAME
    }

    fn supports_proof_type(&self, proof_type: ProofType) -> bool {
        self.config.bridge.operations.contains_key(&proof_type)
    }

    fn verifier_address(&self, proof_type: ProofType) -> &str {
        self.config.verifier_for(proof_type)
    }

    async fn generate_proof(
        &self,
        proof_type: ProofType,
        private_inputs: &ProofInputs,
        public_inputs: &ProofInputs,
    ) -> Result<ZkProof, ProverError> {
        let operation = self.operation_for(proof_type)?;
        let inputs = merge_inputs(private_inputs, public_inputs);
        let payload = self.build(proof_type, operation, &inputs).await?;
        let proof = serde_json::to_vec(&payload)?;

        let network = text_input(proof_type, &inputs, &["network"])?.to_ascii_lowercase();
        let created_at = Utc::now();
        tracing::info!(%proof_type, %operation, %network, to = %payload.to, "bridge proof generated");

        Ok(ZkProof {
            proof_type,
            proof,
            public_inputs: public_inputs.clone(),
            verifier_address: self.verifier_address(proof_type).to_string(),
            created_at,
            expires_at: created_at + self.config.validity(),
            metadata: ProofInputs::from([
                ("provider".to_string(), Self::NAME.into()),
                ("operation".to_string(), operation.as_str().into()),
                ("network".to_string(), network.into()),
            ]),
        })
    }

    /// Structural check only: the bridge built and proved the transaction
    /// and is trusted for it. The blob must be a transaction with hex `to`
    /// and `data`, tagged by this provider with the operation configured
    /// for its proof type; nothing is re-proved here.
    async fn verify_proof(&self, proof: &ZkProof) -> Result<bool, ProverError> {
        if proof.is_expired() {
            tracing::debug!(proof_type = %proof.proof_type, expires_at = %proof.expires_at, "proof expired");
            return Ok(false);
        }
        if proof.metadata_str("provider") != Some(Self::NAME) {
            return Ok(false);
        }
        let Ok(expected) = self.operation_for(proof.proof_type) else {
            return Ok(false);
        };
        if proof.metadata_str("operation") != Some(expected.as_str()) {
            tracing::debug!(
                proof_type = %proof.proof_type,
                expected = %expected,
                operation = ?proof.metadata_str("operation"),
                "proof operation does not match its type"
            );
            return Ok(false);
        }
        let Ok(serde_json::Value::Object(tx)) = serde_json::from_slice(&proof.proof) else {
            return Ok(false);
        };
        let hex_field = |key: &str, check: fn(&str) -> bool| {
            tx.get(key).and_then(|v| v.as_str()).is_some_and(check)
        };
        Ok(hex_field("to", is_hex_address) && hex_field("data", is_hex_data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn inputs(pairs: &[(&str, serde_json::Value)]) -> ProofInputs {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn text_input_accepts_aliases_and_numbers() {
        let i = inputs(&[("walletId", json!("w-1")), ("amount", json!(1500))]);
        assert_eq!(text_input(ProofType::Shield, &i, &["wallet_id", "walletId"]).unwrap(), "w-1");
        assert_eq!(text_input(ProofType::Shield, &i, &["amount"]).unwrap(), "1500");
    }

    #[test]
    fn text_input_rejects_missing_and_blank() {
        let i = inputs(&[("token", json!("  ")), ("amount", json!(null))]);
        for name in ["token", "amount", "network"] {
            assert!(matches!(
                text_input(ProofType::Transfer, &i, &[name]),
                Err(ProverError::InvalidInputs { .. })
            ));
        }
    }

    #[test]
    fn hex_checks() {
        assert!(is_hex_address(&format!("0x{}", "aB".repeat(20))));
        assert!(!is_hex_address("0x1234"));
        assert!(is_hex_data("0x"));
        assert!(is_hex_data("0xdeadbeef"));
        assert!(!is_hex_data("0xabc"));
        assert!(!is_hex_data("deadbeef"));
    }
}
