//! # Validation Errors
//!
//! Input-validation failures raised synchronously before any I/O. Transport
//! and subprocess failures live in the crates that perform that I/O
//! (`spool-merkle::TreeError`, `spool-zkp::ProverError`,
//! `spool-bridge-client::BridgeError`) and wrap these where relevant.

use thiserror::Error;

/// Error raised when caller-supplied input does not satisfy the data model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The network is not in the provider's supported set.
    #[error("unsupported network {network:?} (supported: {supported:?})")]
    UnsupportedNetwork {
        /// The network as supplied by the caller.
        network: String,
        /// The configured supported networks.
        supported: Vec<String>,
    },

    /// The commitment is not 32 bytes of hex.
    #[error("invalid commitment {input:?}: {reason}")]
    InvalidCommitment {
        /// The rejected input, truncated for logging.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A non-commitment 32-byte value (root, sibling) is malformed.
    #[error("malformed 32-byte hash {input:?}: {reason}")]
    MalformedHash {
        /// The rejected input, truncated for logging.
        input: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Truncate user input before echoing it back in an error message.
pub(crate) fn excerpt(input: &str) -> String {
    const MAX: usize = 80;
    if input.len() <= MAX {
        input.to_string()
    } else {
        let mut end = MAX;
        while !input.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &input[..end])
    }
}
