//! Prover error types.
//!
//! Configuration problems (`UnmappedProofType`, `CircuitArtifactMissing`)
//! are raised before any subprocess or network call. A proof that simply
//! fails to verify is `Ok(false)`, never an error.

use std::path::PathBuf;

use spool_bridge_client::BridgeError;
use spool_core::{ConfigError, ProofType};

#[derive(Debug, thiserror::Error)]
pub enum ProverError {
    /// No circuit or bridge operation is configured for this proof type.
    #[error("proof type {proof_type} is not mapped for the {provider} prover")]
    UnmappedProofType {
        proof_type: ProofType,
        provider: &'static str,
    },

    /// Proving or verification key absent from the circuits directory.
    #[error("circuit artifact missing for {circuit}: {}", path.display())]
    CircuitArtifactMissing { circuit: String, path: PathBuf },

    #[error("{operation} for {proof_type} timed out after {timeout_secs}s")]
    ProverTimeout {
        proof_type: ProofType,
        operation: &'static str,
        timeout_secs: u64,
    },

    /// The prover exited nonzero, was killed, or could not be started.
    #[error("{operation} for {proof_type} failed (exit code {code:?}): {stderr}")]
    ProverExecution {
        proof_type: ProofType,
        operation: &'static str,
        code: Option<i32>,
        stderr: String,
    },

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// Inputs cannot be turned into a prover or bridge request.
    #[error("invalid inputs for {proof_type}: {reason}")]
    InvalidInputs { proof_type: ProofType, reason: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ProverError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// True for errors caused by deployment configuration rather than by
    /// the request or a collaborator.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnmappedProofType { .. } | Self::CircuitArtifactMissing { .. } | Self::Config(_)
        )
    }
}
