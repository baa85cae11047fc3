//! # spool-zkp — Zero-Knowledge Prover
//!
//! Generates and verifies proofs that a private pool transition (or a
//! compliance attestation) is valid.
//!
//! ## Backends
//!
//! | Prover | Proof bytes | `verify_proof` |
//! |--------|-------------|----------------|
//! | [`LocalCircuitProver`] | prover's `proof.json` | runs the prover's `verify` |
//! | [`DelegatedBridgeProver`] | bridge transaction JSON | structural check, trusts the bridge |
//!
//! [`ProverBackend`] picks one at startup from [`ProverConfig::backend`].
//!
//! ## Invariants
//!
//! - An unmapped [`ProofType`](spool_core::ProofType) fails before any
//!   subprocess or network call.
//! - Expired proofs never verify.
//! - Local prover scratch files are removed on every exit path, including
//!   timeouts.

pub mod backend;
pub mod bridge;
pub mod config;
pub mod error;
pub mod local;
pub(crate) mod scratch;
pub mod traits;

pub use backend::ProverBackend;
pub use bridge::DelegatedBridgeProver;
pub use config::{
    BridgeOperation, BridgeProverConfig, ProverBackendKind, ProverConfig, DEFAULT_PROVER_TIMEOUT_SECS,
};
pub use error::ProverError;
pub use local::LocalCircuitProver;
pub use traits::ZkProver;
