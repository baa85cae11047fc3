//! # spool-merkle — Commitment Tree Providers
//!
//! Answers, per network: what is the current root, what is this
//! commitment's inclusion path, does this path verify, and resync now.
//!
//! ## Backends
//!
//! | Provider | Source of truth | Path bits |
//! |----------|-----------------|-----------|
//! | [`SyntheticProvider`] | in-process seeded leaves | from leaf index |
//! | [`ChainRpcProvider`] | pool contract via `eth_call` | from leaf index |
//! | [`DelegatedBridgeProvider`] | bridge service | verbatim from bridge |
//!
//! [`TreeBackend`] picks one at startup from [`TreeConfig::backend`].
//!
//! ## Invariants
//!
//! - Network and commitment are validated before any I/O.
//! - `verify` recomputes the root locally and compares in constant time.
//!   Malformed or mismatched paths are `Ok(false)`; only failing to fetch
//!   the root is an error.
//! - Roots are cached per network for `root_ttl_secs` (default 30 s).
//!   Concurrent cache misses each fetch; nothing serializes them.
//! - No retries. This crate never mutates a tree; the synthetic
//!   provider's `insert` seeds demo data only.

pub mod backend;
pub mod bridge;
pub mod chain_rpc;
pub mod config;
pub mod error;
pub mod notify;
pub mod provider;
pub mod synthetic;

pub use backend::TreeBackend;
pub use bridge::DelegatedBridgeProvider;
pub use chain_rpc::ChainRpcProvider;
pub use config::{ChainEndpoint, ChainRpcConfig, TreeBackendKind, TreeConfig};
pub use error::TreeError;
pub use notify::RootNotifier;
pub use provider::{recompute_root, CommitmentTreeProvider};
pub use synthetic::SyntheticProvider;
