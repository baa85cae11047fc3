//! # Local Circuit Prover
//!
//! Drives an external prover binary over circuit artifacts on disk.
//!
//! ## Artifact Layout
//!
//! ```text
//! <circuits_dir>/<circuit>/circuit.zkey            proving key
//! <circuits_dir>/<circuit>/verification_key.json   verification key
//! ```
//!
//! ## Prover CLI
//!
//! ```text
//! <prover_binary> prove  <proving_key> <input.json> <proof.json> <public.json>
//! <prover_binary> verify <verification_key> <public.json> <proof.json>
//! ```
//!
//! Exit status 0 means success (for `verify`: the proof is valid). All
//! files live in a per-call [`Scratch`] directory.
//!
//! `verify` is handed the proof's `public_inputs` as `public.json`, so a
//! proof whose declared inputs were altered after proving is rejected by
//! the prover. The signals `prove` wrote are kept in
//! `metadata.public_signals` for callers and play no part in verification.

use std::ffi::OsStr;
use std::path::PathBuf;

use chrono::Utc;
use spool_core::{ProofInputs, ProofType, ZkProof};
use spool_crypto::{ExecOutcome, ExternalExecutor};

use crate::config::ProverConfig;
use crate::error::ProverError;
use crate::scratch::Scratch;
use crate::traits::{merge_inputs, ZkProver};

const PROVING_KEY: &str = "circuit.zkey";
const VERIFICATION_KEY: &str = "verification_key.json";
const INPUT_FILE: &str = "input.json";
const PROOF_FILE: &str = "proof.json";
const PUBLIC_FILE: &str = "public.json";

/// Subprocess-backed prover over local circuit artifacts.
#[derive(Debug)]
pub struct LocalCircuitProver {
    config: ProverConfig,
    executor: ExternalExecutor,
}

impl LocalCircuitProver {
    pub const NAME: &'static str = "local-circuit";

    pub fn new(config: ProverConfig) -> Result<Self, ProverError> {
        config.validate()?;
        Ok(Self {
            config,
            executor: ExternalExecutor::new(),
        })
    }

    pub fn config(&self) -> &ProverConfig {
        &self.config
    }

    fn circuit_for(&self, proof_type: ProofType) -> Result<&str, ProverError> {
        self.config
            .circuits
            .get(&proof_type)
            .map(String::as_str)
            .ok_or(ProverError::UnmappedProofType {
                proof_type,
                provider: Self::NAME,
            })
    }

    /// Path of `artifact` for `circuit`, or `CircuitArtifactMissing`.
    async fn artifact(&self, circuit: &str, artifact: &str) -> Result<PathBuf, ProverError> {
        let path = self.config.circuits_dir.join(circuit).join(artifact);
        match tokio::fs::try_exists(&path).await {
            Ok(true) => Ok(path),
            _ => Err(ProverError::CircuitArtifactMissing {
                circuit: circuit.to_string(),
                path,
            }),
        }
    }

    async fn run(
        &self,
        proof_type: ProofType,
        operation: &'static str,
        args: &[&OsStr],
    ) -> Result<ExecOutcome, ProverError> {
        let outcome = self
            .executor
            .run(&self.config.prover_binary, args, self.config.timeout())
            .await;
        match outcome {
            ExecOutcome::TimedOut => {
                tracing::warn!(%proof_type, operation, timeout_secs = self.config.timeout_secs, "prover timed out");
                Err(ProverError::ProverTimeout {
                    proof_type,
                    operation,
                    timeout_secs: self.config.timeout_secs,
                })
            }
            other => Ok(other),
        }
    }
}

impl ZkProver for LocalCircuitProver {
    fn provider_name(&self) -> &'static str {
        Self::NAME
    }

    fn supports_proof_type(&self, proof_type: ProofType) -> bool {
        self.config.circuits.contains_key(&proof_type)
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
        let circuit = self.circuit_for(proof_type)?;
        let proving_key = self.artifact(circuit, PROVING_KEY).await?;

        let scratch = Scratch::new(self.config.scratch_dir.as_deref())?;
        let input = scratch
            .write_json(INPUT_FILE, &merge_inputs(private_inputs, public_inputs))
            .await?;
        let proof_out = scratch.file(PROOF_FILE);
        let public_out = scratch.file(PUBLIC_FILE);

        let args = [
            OsStr::new("prove"),
            proving_key.as_os_str(),
            input.as_os_str(),
            proof_out.as_os_str(),
            public_out.as_os_str(),
        ];
        if let ExecOutcome::Failed { code, stderr } = self.run(proof_type, "prove", &args).await? {
            tracing::warn!(%proof_type, circuit, ?code, "prover failed");
            return Err(ProverError::ProverExecution {
                proof_type,
                operation: "prove",
                code,
                stderr,
            });
        }

        let proof = scratch.read_bytes(PROOF_FILE).await?;
        let public_signals: serde_json::Value = serde_json::from_slice(&scratch.read_bytes(PUBLIC_FILE).await?)?;

        let created_at = Utc::now();
        let metadata = ProofInputs::from([
            ("public_signals".to_string(), public_signals),
            ("circuit".to_string(), circuit.into()),
            ("provider".to_string(), Self::NAME.into()),
        ]);
        tracing::info!(%proof_type, circuit, proof_bytes = proof.len(), "proof generated");

        Ok(ZkProof {
            proof_type,
            proof,
            public_inputs: public_inputs.clone(),
            verifier_address: self.verifier_address(proof_type).to_string(),
            created_at,
            expires_at: created_at + self.config.validity(),
            metadata,
        })
    }

    async fn verify_proof(&self, proof: &ZkProof) -> Result<bool, ProverError> {
        if proof.is_expired() {
            tracing::debug!(proof_type = %proof.proof_type, expires_at = %proof.expires_at, "proof expired");
            return Ok(false);
        }
        let circuit = self.circuit_for(proof.proof_type)?;
        let verification_key = self.artifact(circuit, VERIFICATION_KEY).await?;

        let scratch = Scratch::new(self.config.scratch_dir.as_deref())?;
        let proof_file = scratch.write_bytes(PROOF_FILE, &proof.proof).await?;
        // The declared inputs are what the proof is checked against;
        // `metadata.public_signals` is informational and never read here.
        let public_file = scratch.write_json(PUBLIC_FILE, &proof.public_inputs).await?;

        let args = [
            OsStr::new("verify"),
            verification_key.as_os_str(),
            public_file.as_os_str(),
            proof_file.as_os_str(),
        ];
        match self.run(proof.proof_type, "verify", &args).await? {
            ExecOutcome::Completed { .. } => Ok(true),
            ExecOutcome::Failed { code: Some(code), stderr } => {
                tracing::debug!(proof_type = %proof.proof_type, code, stderr = %stderr.trim(), "proof rejected");
                Ok(false)
            }
            ExecOutcome::Failed { code: None, stderr } => Err(ProverError::ProverExecution {
                proof_type: proof.proof_type,
                operation: "verify",
                code: None,
                stderr,
            }),
            ExecOutcome::TimedOut => Err(ProverError::ProverTimeout {
                proof_type: proof.proof_type,
                operation: "verify",
                timeout_secs: self.config.timeout_secs,
            }),
        }
    }
}
