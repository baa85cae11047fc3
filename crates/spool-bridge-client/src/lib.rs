//! # spool-bridge-client — Typed Client for the Delegated Bridge
//!
//! The delegated bridge is an external service that holds the real
//! commitment tree and builds shield/unshield/transfer transactions on this
//! core's behalf. Its answers are trusted; its availability is not.
//!
//! ## Architecture
//!
//! [`BridgeClient`] is the seam consumed by `spool-merkle`'s bridge-backed
//! tree provider and `spool-zkp`'s bridge-backed prover. [`HttpBridgeClient`]
//! is the production implementation; tests substitute in-memory fakes.
//!
//! ## Error Mapping
//!
//! | Condition | Error |
//! |-----------|-------|
//! | connection refused, timeout, non-2xx | [`BridgeError::Unavailable`] |
//! | `success: false`, missing `data`, unreadable body | [`BridgeError::Protocol`] |

pub mod client;
pub mod config;
pub(crate) mod envelope;
pub mod error;
pub mod types;

pub use client::HttpBridgeClient;
pub use config::BridgeConfig;
pub use error::BridgeError;
pub use types::{
    BridgeMerkleProof, BridgeMerkleRoot, CreateWalletRequest, HealthStatus, ShieldRequest,
    TokenBalance, TransactionPayload, TransferRequest, UnshieldRequest, Wallet, WalletBalance,
};

use std::future::Future;

use spool_core::Commitment;

/// Operations the shielded-pool core needs from the bridge.
///
/// `network` arguments are already-normalized network ids.
pub trait BridgeClient: Send + Sync {
    /// Current tree root for `network`.
    fn merkle_root(
        &self,
        network: &str,
    ) -> impl Future<Output = Result<BridgeMerkleRoot, BridgeError>> + Send;

    /// Inclusion path for `commitment`.
    fn merkle_proof(
        &self,
        network: &str,
        commitment: &Commitment,
    ) -> impl Future<Output = Result<BridgeMerkleProof, BridgeError>> + Send;

    /// Ask the bridge to re-index `network` from chain.
    fn rescan(&self, network: &str) -> impl Future<Output = Result<(), BridgeError>> + Send;

    fn shield(
        &self,
        req: &ShieldRequest,
    ) -> impl Future<Output = Result<TransactionPayload, BridgeError>> + Send;

    fn unshield(
        &self,
        req: &UnshieldRequest,
    ) -> impl Future<Output = Result<TransactionPayload, BridgeError>> + Send;

    fn transfer(
        &self,
        req: &TransferRequest,
    ) -> impl Future<Output = Result<TransactionPayload, BridgeError>> + Send;

    fn health(&self) -> impl Future<Output = Result<HealthStatus, BridgeError>> + Send;
}
