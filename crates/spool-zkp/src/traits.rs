//! # Prover Trait (Sealed)
//!
//! Generates and checks proofs for the fixed set of [`ProofType`]s. Each
//! backend maps a type through configuration to a concrete circuit or
//! bridge operation; an unmapped type fails with
//! [`ProverError::UnmappedProofType`] before any subprocess or network call.
//!
//! ## Sealed Trait
//!
//! Only provers defined in this crate can implement [`ZkProver`].
//!
//! ## Freshness
//!
//! Every generated proof carries `expires_at = created_at + validity`.
//! `verify_proof` answers `false` for an expired proof without looking at
//! its bytes.

use std::future::Future;

use spool_core::{ProofInputs, ProofType, ZkProof};

use crate::error::ProverError;

/// Private module that seals [`ZkProver`].
mod private {
    pub trait Sealed {}
    impl Sealed for crate::local::LocalCircuitProver {}
    impl<B: spool_bridge_client::BridgeClient> Sealed for crate::bridge::DelegatedBridgeProver<B> {}
    impl Sealed for crate::backend::ProverBackend {}
}

pub trait ZkProver: private::Sealed + Send + Sync {
    /// Stable backend name, also recorded in `metadata.provider`.
    fn provider_name(&self) -> &'static str;

    /// Whether `proof_type` is mapped for this backend.
    fn supports_proof_type(&self, proof_type: ProofType) -> bool;

    /// Configured on-chain verifier for `proof_type`; empty when none.
    fn verifier_address(&self, proof_type: ProofType) -> &str;

    /// Produce a proof over `private_inputs` and `public_inputs`.
    ///
    /// `public_inputs` are copied into the returned [`ZkProof`].
    fn generate_proof(
        &self,
        proof_type: ProofType,
        private_inputs: &ProofInputs,
        public_inputs: &ProofInputs,
    ) -> impl Future<Output = Result<ZkProof, ProverError>> + Send;

    /// `Ok(false)` for an expired or invalid proof; errors only when the
    /// check itself could not run.
    fn verify_proof(&self, proof: &ZkProof) -> impl Future<Output = Result<bool, ProverError>> + Send;
}

/// Private and public inputs as one map. Public values win on a name
/// collision.
pub(crate) fn merge_inputs(private_inputs: &ProofInputs, public_inputs: &ProofInputs) -> ProofInputs {
    let mut merged = private_inputs.clone();
    merged.extend(public_inputs.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}
