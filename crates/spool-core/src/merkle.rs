//! # Merkle Roots and Inclusion Paths
//!
//! Value objects describing the observed state of a fixed-depth binary
//! commitment tree and the witness that a leaf belongs to it.
//!
//! ## Path Bits
//!
//! `path_indices[i]` says which side the running value sits on at level `i`:
//! `0` means it is the left child (sibling on the right), `1` the reverse.
//! Index-derived providers fill it with the bits of `leaf_index`
//! ([`path_indices_from_leaf_index`]); tree-backed providers copy it from
//! the tree, where it need not match `leaf_index` for non-dense trees.
//! Verification always trusts `path_indices` as given.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::commitment::Commitment;
use crate::hash::Hash32;
use crate::network::NetworkId;

/// Depth used when the deployment does not configure one (2^32 leaves).
pub const DEFAULT_TREE_DEPTH: u32 = 32;

/// The most recently observed tree state for one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleRoot {
    pub root: Hash32,
    pub network: NetworkId,
    pub leaf_count: u64,
    /// Fixed per deployment; must equal the length of any path verified
    /// against this root.
    pub tree_depth: u32,
    pub block_number: u64,
    pub synced_at: DateTime<Utc>,
}

/// Inclusion witness from a leaf to the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerklePath {
    pub commitment: Commitment,
    /// Root the provider reported alongside this path.
    pub root: Hash32,
    pub network: NetworkId,
    pub leaf_index: u64,
    /// One sibling per level, leaf level first.
    pub siblings: Vec<Hash32>,
    /// One bit per level, leaf level first. Kept as `u8` so that paths
    /// received from outside can carry (and be rejected for) non-binary values.
    pub path_indices: Vec<u8>,
}

impl MerklePath {
    /// Describe why this path cannot be verified at `tree_depth`, if it can't.
    ///
    /// Checks lengths and bit values only; no hashing.
    pub fn shape_defect(&self, tree_depth: u32) -> Option<String> {
        let depth = tree_depth as usize;
        if self.siblings.len() != depth {
            return Some(format!(
                "expected {depth} siblings, got {}",
                self.siblings.len()
            ));
        }
        if self.path_indices.len() != depth {
            return Some(format!(
                "expected {depth} path indices, got {}",
                self.path_indices.len()
            ));
        }
        if let Some((level, bit)) = self
            .path_indices
            .iter()
            .enumerate()
            .find(|(_, b)| **b > 1)
        {
            return Some(format!("path index at level {level} is {bit}, not 0 or 1"));
        }
        None
    }

    /// Number of levels in this path.
    pub fn depth(&self) -> usize {
        self.siblings.len()
    }
}

/// Bit-decompose `leaf_index` into `depth` path bits, least significant first.
///
/// Levels beyond bit 63 are zero.
pub fn path_indices_from_leaf_index(leaf_index: u64, depth: u32) -> Vec<u8> {
    (0..depth)
        .map(|i| {
            if i < u64::BITS {
                ((leaf_index >> i) & 1) as u8
            } else {
                0
            }
        })
        .collect()
}

/// Reassemble a leaf index as `Σ bit_i · 2^i`.
///
/// Returns `None` if any entry is not 0/1 or a set bit lies beyond bit 63.
pub fn leaf_index_from_path_indices(bits: &[u8]) -> Option<u64> {
    let mut index = 0u64;
    for (i, bit) in bits.iter().enumerate() {
        match bit {
            0 => {}
            1 if i < u64::BITS as usize => index |= 1u64 << i,
            _ => return None,
        }
    }
    Some(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_path(depth: usize) -> MerklePath {
        MerklePath {
            commitment: Commitment::from_hash(Hash32::from_bytes([0x11; 32])),
            root: Hash32::ZERO,
            network: NetworkId::new("polygon"),
            leaf_index: 0,
            siblings: vec![Hash32::ZERO; depth],
            path_indices: vec![0; depth],
        }
    }

    #[test]
    fn well_formed_path_has_no_defect() {
        assert_eq!(sample_path(32).shape_defect(32), None);
    }

    #[test]
    fn short_sibling_list_is_a_defect() {
        let mut p = sample_path(32);
        p.siblings.pop();
        let reason = p.shape_defect(32).unwrap();
        assert!(reason.contains("31 siblings") || reason.contains("got 31"));
    }

    #[test]
    fn mismatched_index_length_is_a_defect() {
        let mut p = sample_path(4);
        p.path_indices.push(0);
        assert!(p.shape_defect(4).unwrap().contains("path indices"));
    }

    #[test]
    fn non_binary_index_is_a_defect() {
        let mut p = sample_path(4);
        p.path_indices[2] = 2;
        assert!(p.shape_defect(4).unwrap().contains("level 2"));
    }

    #[test]
    fn leaf_zero_has_all_zero_bits() {
        assert_eq!(path_indices_from_leaf_index(0, 8), vec![0; 8]);
    }

    #[test]
    fn bits_are_least_significant_first() {
        assert_eq!(path_indices_from_leaf_index(6, 4), vec![0, 1, 1, 0]);
    }

    #[test]
    fn rejects_non_binary_bits() {
        assert_eq!(leaf_index_from_path_indices(&[0, 1, 3]), None);
    }

    #[test]
    fn deep_trees_pad_with_zero() {
        let bits = path_indices_from_leaf_index(u64::MAX, 70);
        assert_eq!(bits.len(), 70);
        assert!(bits[..64].iter().all(|b| *b == 1));
        assert!(bits[64..].iter().all(|b| *b == 0));
        assert_eq!(leaf_index_from_path_indices(&bits), Some(u64::MAX));
    }

    proptest! {
        #[test]
        fn bit_decomposition_round_trips(index in any::<u32>()) {
            let bits = path_indices_from_leaf_index(u64::from(index), 32);
            prop_assert_eq!(leaf_index_from_path_indices(&bits), Some(u64::from(index)));
        }
    }
}
