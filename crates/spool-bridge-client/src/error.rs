//! Bridge client error types.

use spool_core::ConfigError;

/// Errors from bridge calls.
///
/// The bridge is trusted for its answers but not for its availability:
/// transport failures and non-2xx statuses are both `Unavailable`, while a
/// reachable bridge that answers `success: false` or an unreadable body is
/// `Protocol`.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Connection failure, timeout, or non-2xx status.
    #[error("bridge unavailable calling {endpoint}: {reason}")]
    Unavailable { endpoint: String, reason: String },
    /// The bridge answered, but not with a usable success envelope.
    #[error("bridge protocol error from {endpoint}: {message}")]
    Protocol { endpoint: String, message: String },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl BridgeError {
    /// The endpoint label, when the error came from a call.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::Unavailable { endpoint, .. } | Self::Protocol { endpoint, .. } => Some(endpoint),
            Self::Config(_) => None,
        }
    }
}
