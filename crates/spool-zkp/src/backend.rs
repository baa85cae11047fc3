//! Prover backend selected once at startup.

use spool_bridge_client::{BridgeConfig, HttpBridgeClient};
use spool_core::{ProofInputs, ProofType, ZkProof};

use crate::bridge::DelegatedBridgeProver;
use crate::config::{ProverBackendKind, ProverConfig};
use crate::error::ProverError;
use crate::local::LocalCircuitProver;
use crate::traits::ZkProver;

#[derive(Debug)]
pub enum ProverBackend {
    Local(LocalCircuitProver),
    Bridge(DelegatedBridgeProver<HttpBridgeClient>),
}

impl ProverBackend {
    /// Build the backend named by `config.backend`. The bridge backend
    /// needs `bridge`.
    pub fn from_config(config: ProverConfig, bridge: Option<BridgeConfig>) -> Result<Self, ProverError> {
        let kind = config.backend;
        let backend = match kind {
            ProverBackendKind::Local => Self::Local(LocalCircuitProver::new(config)?),
            ProverBackendKind::Bridge => {
                let bridge = bridge.ok_or_else(|| {
                    ProverError::Config(spool_core::ConfigError::Invalid {
                        var: "backend".into(),
                        reason: "bridge prover requires bridge configuration".into(),
                    })
                })?;
                Self::Bridge(DelegatedBridgeProver::new(config, HttpBridgeClient::new(bridge)?)?)
            }
        };
        let supported: Vec<&str> = ProofType::ALL
            .into_iter()
            .filter(|t| backend.supports_proof_type(*t))
            .map(|t| t.as_str())
            .collect();
        tracing::info!(backend = backend.provider_name(), ?supported, "prover backend ready");
        Ok(backend)
    }

    /// Load every configuration the selected backend needs from the
    /// environment and build it.
    pub fn from_env() -> Result<Self, ProverError> {
        let config = ProverConfig::from_env()?;
        let bridge = match config.backend {
            ProverBackendKind::Local => None,
            ProverBackendKind::Bridge => Some(BridgeConfig::from_env()?),
        };
        Self::from_config(config, bridge)
    }
}

impl ZkProver for ProverBackend {
    fn provider_name(&self) -> &'static str {
        match self {
            Self::Local(p) => p.provider_name(),
            Self::Bridge(p) => p.provider_name(),
        }
    }

    fn supports_proof_type(&self, proof_type: ProofType) -> bool {
        match self {
            Self::Local(p) => p.supports_proof_type(proof_type),
            Self::Bridge(p) => p.supports_proof_type(proof_type),
        }
    }

    fn verifier_address(&self, proof_type: ProofType) -> &str {
        match self {
            Self::Local(p) => p.verifier_address(proof_type),
            Self::Bridge(p) => p.verifier_address(proof_type),
        }
    }

    async fn generate_proof(
        &self,
        proof_type: ProofType,
        private_inputs: &ProofInputs,
        public_inputs: &ProofInputs,
    ) -> Result<ZkProof, ProverError> {
        match self {
            Self::Local(p) => p.generate_proof(proof_type, private_inputs, public_inputs).await,
            Self::Bridge(p) => p.generate_proof(proof_type, private_inputs, public_inputs).await,
        }
    }

    async fn verify_proof(&self, proof: &ZkProof) -> Result<bool, ProverError> {
        match self {
            Self::Local(p) => p.verify_proof(proof).await,
            Self::Bridge(p) => p.verify_proof(proof).await,
        }
    }
}
