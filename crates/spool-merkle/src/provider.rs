//! # Commitment Tree Provider Trait (Sealed)
//!
//! The capability set shared by every tree backend: current root, inclusion
//! path, local verification, and forced resync.
//!
//! ## Sealed Trait
//!
//! Only providers defined in this crate can implement
//! [`CommitmentTreeProvider`]. A provider's answers decide whether a spend
//! is accepted, so new backends go through this crate.
//!
//! ## Verification
//!
//! [`CommitmentTreeProvider::verify`] never trusts the provider for the
//! hashing: it folds the path locally with the configured
//! [`PairHasher`](spool_crypto::PairHasher), starting from the commitment,
//! for levels `0..depth`:
//!
//! - bit `0`: `current = combine(i, current, sibling)`
//! - bit `1`: `current = combine(i, sibling, current)`
//!
//! and compares the result to `get_root(path.network)` in constant time.
//! A malformed path is `Ok(false)` with no hashing; only failing to obtain
//! the root is an error. A root served from cache may be up to one TTL
//! stale.

use std::future::Future;

use chrono::Utc;
use spool_core::{Commitment, Hash32, MerklePath, MerkleRoot, NetworkId, SupportedNetworks, TtlCache};
use spool_crypto::PairHasher;
use tokio::sync::broadcast;

use crate::config::TreeConfig;
use crate::error::TreeError;
use crate::notify::RootNotifier;

/// Private module that seals [`CommitmentTreeProvider`].
mod private {
    pub trait Sealed {}
    impl Sealed for crate::synthetic::SyntheticProvider {}
    impl Sealed for crate::chain_rpc::ChainRpcProvider {}
    impl<B: spool_bridge_client::BridgeClient> Sealed for crate::bridge::DelegatedBridgeProvider<B> {}
    impl Sealed for crate::backend::TreeBackend {}
}

/// Root, path, verify and sync over one or more networks.
///
/// `network` arguments are case-insensitive; `commitment` arguments accept
/// 64 hex digits with or without `0x` in any case. Both are validated before
/// any I/O.
pub trait CommitmentTreeProvider: private::Sealed + Send + Sync {
    /// Stable backend name for logs and metadata.
    fn provider_name(&self) -> &'static str;

    /// Depth every path from this provider has.
    fn tree_depth(&self) -> u32;

    fn supports_network(&self, network: &str) -> bool;

    /// Freshest known root, possibly from cache.
    fn get_root(&self, network: &str) -> impl Future<Output = Result<MerkleRoot, TreeError>> + Send;

    /// Inclusion path for `commitment`, or [`TreeError::CommitmentNotFound`].
    fn get_path(
        &self,
        commitment: &str,
        network: &str,
    ) -> impl Future<Output = Result<MerklePath, TreeError>> + Send;

    /// Recompute the root from `path` and compare with `get_root`.
    fn verify(
        &self,
        commitment: &str,
        path: &MerklePath,
    ) -> impl Future<Output = Result<bool, TreeError>> + Send;

    /// Drop the cached root, refetch, and notify subscribers.
    fn sync(&self, network: &str) -> impl Future<Output = Result<MerkleRoot, TreeError>> + Send;

    /// Receive every root published by `sync`.
    fn subscribe(&self) -> broadcast::Receiver<MerkleRoot>;
}

/// Fold `siblings` into a root starting from `leaf`, as described in the
/// module docs. Lengths are not checked here.
pub async fn recompute_root(
    hasher: &PairHasher,
    leaf: &Hash32,
    siblings: &[Hash32],
    path_indices: &[u8],
) -> Hash32 {
    let mut current = *leaf;
    for (level, (sibling, bit)) in siblings.iter().zip(path_indices).enumerate() {
        let level = level as u32;
        current = if *bit == 0 {
            hasher.combine(level, &current, sibling).await
        } else {
            hasher.combine(level, sibling, &current).await
        };
    }
    current
}

// ---------------------------------------------------------------------------
// Shared provider state
// ---------------------------------------------------------------------------

/// State and checks every provider carries.
#[derive(Debug)]
pub(crate) struct TreeCore {
    pub(crate) networks: SupportedNetworks,
    pub(crate) tree_depth: u32,
    pub(crate) hasher: PairHasher,
    pub(crate) roots: TtlCache<NetworkId, MerkleRoot>,
    pub(crate) paths: TtlCache<(NetworkId, Commitment), MerklePath>,
    pub(crate) notifier: RootNotifier,
}

impl TreeCore {
    pub(crate) fn new(config: &TreeConfig) -> Result<Self, TreeError> {
        config.validate()?;
        Ok(Self {
            networks: config.supported_networks(),
            tree_depth: config.tree_depth,
            hasher: PairHasher::new(config.pair_hash.clone()),
            roots: TtlCache::new(config.root_ttl()),
            paths: TtlCache::new(config.path_ttl()),
            notifier: RootNotifier::new(config.notify_capacity),
        })
    }

    pub(crate) fn network(&self, network: &str) -> Result<NetworkId, TreeError> {
        Ok(self.networks.require(network)?)
    }

    pub(crate) fn commitment(input: &str) -> Result<Commitment, TreeError> {
        Ok(Commitment::parse(input)?)
    }

    /// Serve `network`'s root from cache or run `fetch` and cache the result.
    ///
    /// Concurrent misses each run `fetch`; the last insert wins.
    pub(crate) async fn cached_root<F, Fut>(&self, network: &NetworkId, fetch: F) -> Result<MerkleRoot, TreeError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<MerkleRoot, TreeError>>,
    {
        if let Some(root) = self.roots.get(network) {
            tracing::debug!(%network, root = %root.root, "root cache hit");
            return Ok(root);
        }
        let root = fetch().await?;
        tracing::debug!(%network, root = %root.root, leaf_count = root.leaf_count, "root fetched");
        self.roots.insert(network.clone(), root.clone());
        Ok(root)
    }

    /// Serve a path from cache or run `fetch` and cache the result.
    pub(crate) async fn cached_path<F, Fut>(
        &self,
        network: &NetworkId,
        commitment: &Commitment,
        fetch: F,
    ) -> Result<MerklePath, TreeError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<MerklePath, TreeError>>,
    {
        let key = (network.clone(), *commitment);
        if let Some(path) = self.paths.get(&key) {
            return Ok(path);
        }
        let path = fetch().await?;
        self.paths.insert(key, path.clone());
        Ok(path)
    }

    /// Invalidate caches for a resync.
    pub(crate) fn invalidate(&self, network: &NetworkId) {
        self.roots.invalidate(network);
        // Paths are not indexed by network; a resync is rare enough to clear all.
        self.paths.clear();
    }

    /// Record a freshly synced root and tell subscribers.
    pub(crate) fn publish(&self, provider: &'static str, root: &MerkleRoot) {
        self.roots.insert(root.network.clone(), root.clone());
        let subscribers = self.notifier.publish(root);
        tracing::info!(
            provider,
            network = %root.network,
            root = %root.root,
            leaf_count = root.leaf_count,
            block_number = root.block_number,
            subscribers,
            "tree synced"
        );
    }

    /// Check `path` without hashing. Bad commitment text or an unsupported
    /// network is an error. Returns the parsed commitment if the path is
    /// well-formed for it, `None` if verification must fail.
    pub(crate) fn check_path(&self, commitment: &str, path: &MerklePath) -> Result<Option<Commitment>, TreeError> {
        let commitment = Self::commitment(commitment)?;
        self.network(path.network.as_str())?;
        if !commitment.as_hash().ct_eq(path.commitment.as_hash()) {
            tracing::debug!(%commitment, path_commitment = %path.commitment, "path is for another commitment");
            return Ok(None);
        }
        if let Some(defect) = path.shape_defect(self.tree_depth) {
            tracing::debug!(%commitment, network = %path.network, %defect, "malformed path rejected");
            return Ok(None);
        }
        Ok(Some(commitment))
    }

    /// Shared body of `verify`: structural check, local fold, root compare.
    pub(crate) async fn verify_with<F, Fut>(&self, commitment: &str, path: &MerklePath, root: F) -> Result<bool, TreeError>
    where
        F: FnOnce(NetworkId) -> Fut,
        Fut: Future<Output = Result<MerkleRoot, TreeError>>,
    {
        let Some(commitment) = self.check_path(commitment, path)? else {
            return Ok(false);
        };
        let computed =
            recompute_root(&self.hasher, commitment.as_hash(), &path.siblings, &path.path_indices).await;
        let current = root(path.network.clone()).await?;
        let ok = computed.ct_eq(&current.root);
        tracing::debug!(
            %commitment,
            network = %path.network,
            computed = %computed,
            expected = %current.root,
            ok,
            "path verified"
        );
        Ok(ok)
    }

    pub(crate) fn root_record(&self, network: NetworkId, root: Hash32, leaf_count: u64, block_number: u64) -> MerkleRoot {
        MerkleRoot {
            root,
            network,
            leaf_count,
            tree_depth: self.tree_depth,
            block_number,
            synced_at: Utc::now(),
        }
    }
}
