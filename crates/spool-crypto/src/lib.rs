//! # spool-crypto — Hashing for the Commitment Tree
//!
//! - **Pair hash** ([`PairHasher`]): combines two children into a parent.
//!   Poseidon through an external helper when one is configured and
//!   answers its probe, domain-separated SHA-256 otherwise.
//! - **External executor** ([`ExternalExecutor`]): runs a helper binary
//!   with a deadline and reports a typed [`ExecOutcome`]. Shared with the
//!   local circuit prover in `spool-zkp`.
//!
//! ## Crate Policy
//!
//! - Depends only on `spool-core` internally.
//! - Hash degradation is the only silent recovery in the workspace; it is
//!   always logged.

pub mod exec;
pub mod pair_hash;

pub use exec::{ExecOutcome, ExternalExecutor};
pub use pair_hash::{sha256_node, PairHashAlgorithm, PairHasher, PairHasherConfig};
