//! # Synthetic Tree Provider
//!
//! A non-cryptographic stand-in for demos and tests. Each network keeps an
//! in-process index of seeded commitments; nothing is read from chain.
//!
//! ## Shape
//!
//! - Leaves get sequential indices on [`SyntheticProvider::insert`].
//!   Re-inserting a known commitment returns its existing index.
//! - Sibling `i` of leaf `n` is
//!   `SHA-256(network || "sibling" || n (u64 BE) || "level" || i (u32 BE))`.
//! - Path bits are the bits of the leaf index.
//! - The root is the fold of the most recently inserted leaf's path, so a
//!   leaf verifies until another is seeded after it. An empty network has
//!   root `SHA-256(network || "empty")`.
//! - `leaf_count` and `block_number` are both the number of seeded leaves.

use std::collections::HashMap;

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use spool_core::{path_indices_from_leaf_index, Commitment, Hash32, MerklePath, MerkleRoot, NetworkId};
use tokio::sync::broadcast;

use crate::config::TreeConfig;
use crate::error::TreeError;
use crate::provider::{recompute_root, CommitmentTreeProvider, TreeCore};

#[derive(Debug, Default)]
struct LeafIndex {
    by_commitment: HashMap<Commitment, u64>,
    latest: Option<(Commitment, u64)>,
}

/// In-process demo tree.
#[derive(Debug)]
pub struct SyntheticProvider {
    core: TreeCore,
    leaves: DashMap<NetworkId, LeafIndex>,
}

impl SyntheticProvider {
    pub const NAME: &'static str = "synthetic";

    pub fn new(config: &TreeConfig) -> Result<Self, TreeError> {
        Ok(Self {
            core: TreeCore::new(config)?,
            leaves: DashMap::new(),
        })
    }

    /// Seed `commitment` as the next leaf of `network`, returning its index.
    ///
    /// Idempotent per commitment. Invalidates the cached root.
    pub fn insert(&self, network: &str, commitment: &str) -> Result<u64, TreeError> {
        let network = self.core.network(network)?;
        let commitment = TreeCore::commitment(commitment)?;
        let capacity = capacity(self.core.tree_depth);

        let index = {
            let mut leaves = self.leaves.entry(network.clone()).or_default();
            if let Some(existing) = leaves.by_commitment.get(&commitment) {
                return Ok(*existing);
            }
            let next = leaves.by_commitment.len() as u64;
            if next >= capacity {
                return Err(TreeError::TreeFull {
                    network: network.to_string(),
                    capacity,
                });
            }
            leaves.by_commitment.insert(commitment, next);
            leaves.latest = Some((commitment, next));
            next
        };

        self.core.invalidate(&network);
        tracing::debug!(%network, %commitment, leaf_index = index, "synthetic leaf seeded");
        Ok(index)
    }

    /// Number of seeded leaves on `network` (0 for unknown networks).
    pub fn leaf_count(&self, network: &str) -> u64 {
        self.leaves
            .get(&NetworkId::new(network))
            .map(|l| l.by_commitment.len() as u64)
            .unwrap_or(0)
    }

    fn siblings(&self, network: &NetworkId, leaf_index: u64) -> Vec<Hash32> {
        (0..self.core.tree_depth)
            .map(|level| synthetic_sibling(network, leaf_index, level))
            .collect()
    }

    async fn compute_root(&self, network: NetworkId) -> MerkleRoot {
        // Copy out of the map before awaiting on the hasher.
        let (count, latest) = match self.leaves.get(&network) {
            Some(l) => (l.by_commitment.len() as u64, l.latest),
            None => (0, None),
        };
        let root = match latest {
            None => empty_root(&network),
            Some((commitment, index)) => {
                let siblings = self.siblings(&network, index);
                let bits = path_indices_from_leaf_index(index, self.core.tree_depth);
                recompute_root(&self.core.hasher, commitment.as_hash(), &siblings, &bits).await
            }
        };
        self.core.root_record(network, root, count, count)
    }
}

fn capacity(depth: u32) -> u64 {
    if depth >= 64 {
        u64::MAX
    } else {
        1u64 << depth
    }
}

/// Deterministic sibling for the synthetic tree.
pub fn synthetic_sibling(network: &NetworkId, leaf_index: u64, level: u32) -> Hash32 {
    let mut hasher = Sha256::new();
    hasher.update(network.as_str().as_bytes());
    hasher.update(b"sibling");
    hasher.update(leaf_index.to_be_bytes());
    hasher.update(b"level");
    hasher.update(level.to_be_bytes());
    Hash32::from_bytes(hasher.finalize().into())
}

fn empty_root(network: &NetworkId) -> Hash32 {
    let mut hasher = Sha256::new();
    hasher.update(network.as_str().as_bytes());
    hasher.update(b"empty");
    Hash32::from_bytes(hasher.finalize().into())
}

impl CommitmentTreeProvider for SyntheticProvider {
    fn provider_name(&self) -> &'static str {
        Self::NAME
    }

    fn tree_depth(&self) -> u32 {
        self.core.tree_depth
    }

    fn supports_network(&self, network: &str) -> bool {
        self.core.networks.contains(network)
    }

    async fn get_root(&self, network: &str) -> Result<MerkleRoot, TreeError> {
        let network = self.core.network(network)?;
        self.core
            .cached_root(&network, || async { Ok(self.compute_root(network.clone()).await) })
            .await
    }

    async fn get_path(&self, commitment: &str, network: &str) -> Result<MerklePath, TreeError> {
        let network = self.core.network(network)?;
        let commitment = TreeCore::commitment(commitment)?;

        let leaf_index = self
            .leaves
            .get(&network)
            .and_then(|l| l.by_commitment.get(&commitment).copied())
            .ok_or_else(|| TreeError::CommitmentNotFound {
                network: network.to_string(),
                commitment: commitment.canonical(),
            })?;

        let root = self.get_root(network.as_str()).await?;
        Ok(MerklePath {
            commitment,
            root: root.root,
            siblings: self.siblings(&network, leaf_index),
            path_indices: path_indices_from_leaf_index(leaf_index, self.core.tree_depth),
            network,
            leaf_index,
        })
    }

    async fn verify(&self, commitment: &str, path: &MerklePath) -> Result<bool, TreeError> {
        self.core
            .verify_with(commitment, path, |network| async move {
                self.get_root(network.as_str()).await
            })
            .await
    }

    async fn sync(&self, network: &str) -> Result<MerkleRoot, TreeError> {
        let network = self.core.network(network)?;
        self.core.invalidate(&network);
        let root = self.compute_root(network).await;
        self.core.publish(Self::NAME, &root);
        Ok(root)
    }

    fn subscribe(&self) -> broadcast::Receiver<MerkleRoot> {
        self.core.notifier.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spool_crypto::PairHasherConfig;

    fn provider(depth: u32) -> SyntheticProvider {
        SyntheticProvider::new(&TreeConfig {
            tree_depth: depth,
            pair_hash: PairHasherConfig::sha256(),
            ..TreeConfig::default()
        })
        .unwrap()
    }

    fn commitment(b: u8) -> String {
        format!("0x{}", format!("{b:02x}").repeat(32))
    }

    #[test]
    fn insert_is_sequential_and_idempotent() {
        let p = provider(8);
        assert_eq!(p.insert("polygon", &commitment(1)).unwrap(), 0);
        assert_eq!(p.insert("polygon", &commitment(2)).unwrap(), 1);
        assert_eq!(p.insert("POLYGON", &commitment(1).to_uppercase().replace("0X", "")).unwrap(), 0);
        assert_eq!(p.leaf_count("polygon"), 2);
        assert_eq!(p.leaf_count("ethereum"), 0);
    }

    #[test]
    fn insert_rejects_unsupported_network() {
        let p = provider(8);
        assert!(matches!(
            p.insert("solana", &commitment(1)),
            Err(TreeError::UnsupportedNetwork { .. })
        ));
    }

    #[test]
    fn full_tree_rejects_new_leaves() {
        let p = provider(1);
        p.insert("polygon", &commitment(1)).unwrap();
        p.insert("polygon", &commitment(2)).unwrap();
        assert!(matches!(
            p.insert("polygon", &commitment(3)),
            Err(TreeError::TreeFull { capacity: 2, .. })
        ));
    }

    #[tokio::test]
    async fn empty_network_root_is_deterministic() {
        let p = provider(8);
        let a = p.get_root("ethereum").await.unwrap();
        assert_eq!(a.root, empty_root(&NetworkId::new("ethereum")));
        assert_eq!(a.leaf_count, 0);
        assert_ne!(a.root, p.get_root("polygon").await.unwrap().root);
    }

    #[tokio::test]
    async fn seeding_changes_the_root() {
        let p = provider(8);
        let before = p.get_root("polygon").await.unwrap();
        p.insert("polygon", &commitment(1)).unwrap();
        let after = p.get_root("polygon").await.unwrap();
        assert_ne!(before.root, after.root);
        assert_eq!(after.leaf_count, 1);
        assert_eq!(after.block_number, 1);
    }

    #[test]
    fn siblings_differ_per_level_and_network() {
        let poly = NetworkId::new("polygon");
        let eth = NetworkId::new("ethereum");
        assert_ne!(synthetic_sibling(&poly, 0, 0), synthetic_sibling(&poly, 0, 1));
        assert_ne!(synthetic_sibling(&poly, 0, 0), synthetic_sibling(&eth, 0, 0));
        assert_ne!(synthetic_sibling(&poly, 0, 0), synthetic_sibling(&poly, 1, 0));
    }
}
