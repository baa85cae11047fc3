//! # Tree Provider Errors
//!
//! Validation variants are raised before any I/O. `Bridge` and `Rpc` are
//! infrastructure failures and are never retried here; the caller owns
//! retry policy. A path that fails to verify is `Ok(false)`, not an error.

use spool_bridge_client::BridgeError;
use spool_core::{ConfigError, ValidationError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeError {
    /// The network is not configured for this provider.
    #[error("unsupported network {network:?} (supported: {supported:?})")]
    UnsupportedNetwork {
        network: String,
        supported: Vec<String>,
    },

    /// The commitment is not 32 bytes of hex.
    #[error("invalid commitment {input:?}: {reason}")]
    InvalidCommitment { input: String, reason: String },

    /// The commitment is not a leaf of the tree.
    #[error("commitment {commitment} not found in {network} tree")]
    CommitmentNotFound { network: String, commitment: String },

    /// The in-process synthetic tree has no free leaf slots.
    #[error("{network} tree is full ({capacity} leaves)")]
    TreeFull { network: String, capacity: u64 },

    /// Bridge transport or envelope failure.
    #[error("bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// JSON-RPC transport failure, RPC `error` member, or undecodable result.
    #[error("RPC error on {network}: {reason}")]
    Rpc { network: String, reason: String },

    /// The provider could not be constructed from its configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<ValidationError> for TreeError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::UnsupportedNetwork { network, supported } => {
                Self::UnsupportedNetwork { network, supported }
            }
            ValidationError::InvalidCommitment { input, reason }
            | ValidationError::MalformedHash { input, reason } => {
                Self::InvalidCommitment { input, reason }
            }
        }
    }
}

impl TreeError {
    pub(crate) fn rpc(network: &str, reason: impl Into<String>) -> Self {
        Self::Rpc {
            network: network.to_string(),
            reason: reason.into(),
        }
    }

    /// True for failures raised before any I/O.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedNetwork { .. } | Self::InvalidCommitment { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_matching_variants() {
        let err: TreeError = ValidationError::UnsupportedNetwork {
            network: "solana".into(),
            supported: vec!["polygon".into()],
        }
        .into();
        assert!(matches!(err, TreeError::UnsupportedNetwork { .. }));
        assert!(err.is_validation());

        let err: TreeError = ValidationError::InvalidCommitment {
            input: "0x12".into(),
            reason: "short".into(),
        }
        .into();
        assert!(matches!(err, TreeError::InvalidCommitment { .. }));
    }

    #[test]
    fn not_found_display_names_network_and_commitment() {
        let err = TreeError::CommitmentNotFound {
            network: "polygon".into(),
            commitment: "0x99".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("polygon"));
        assert!(msg.contains("0x99"));
        assert!(!err.is_validation());
    }
}
