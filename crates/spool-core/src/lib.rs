//! # spool-core — Foundational Types for the Shielded-Pool Core
//!
//! This crate is the bedrock of the workspace. It defines the value objects
//! that flow between the commitment tree providers and the proof backends.
//! Every other crate in the workspace depends on `spool-core`; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtypes for 32-byte values.** [`Hash32`] and [`Commitment`] are
//!    validated on construction. Any text form (with or without `0x`, any
//!    case) is canonicalized to lowercase `0x`-prefixed hex before it is used
//!    as a key or compared.
//!
//! 2. **Immutable records.** [`MerkleRoot`], [`MerklePath`] and [`ZkProof`]
//!    are built once per query and never mutated. A newer root supersedes an
//!    older one; nothing edits it in place.
//!
//! 3. **Constant-time comparison.** Root equality goes through
//!    [`Hash32::ct_eq`], never through a short-circuiting byte compare.
//!
//! 4. **Closed proof-type set.** [`ProofType`] is a single enum; adding a
//!    circuit forces every configuration table to handle it.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `spool-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod cache;
pub mod commitment;
pub mod config;
pub mod error;
pub mod hash;
pub mod merkle;
pub mod network;
pub mod proof;

// Re-export primary types for ergonomic imports.
pub use cache::TtlCache;
pub use commitment::{normalize_commitment, Commitment};
pub use config::ConfigError;
pub use error::ValidationError;
pub use hash::Hash32;
pub use merkle::{
    leaf_index_from_path_indices, path_indices_from_leaf_index, MerklePath, MerkleRoot,
    DEFAULT_TREE_DEPTH,
};
pub use network::{NetworkId, SupportedNetworks};
pub use proof::{ProofInputs, ProofType, ZkProof, DEFAULT_PROOF_VALIDITY_DAYS};
