//! # Delegated Bridge Tree Provider
//!
//! Forwards root and path queries to the bridge, which holds the real tree.
//! Root, leaf index, siblings and path bits are taken verbatim; only the
//! final inclusion check is recomputed locally.
//!
//! Any bridge failure on a path query is reported as
//! [`TreeError::CommitmentNotFound`]: callers cannot distinguish "the bridge
//! is down" from "the bridge does not know this leaf" on that call. Root
//! queries and syncs surface [`TreeError::Bridge`].

use spool_bridge_client::BridgeClient;
use spool_core::{Commitment, MerklePath, MerkleRoot, NetworkId};
use tokio::sync::broadcast;

use crate::config::TreeConfig;
use crate::error::TreeError;
use crate::provider::{CommitmentTreeProvider, TreeCore};

/// Bridge-backed provider, generic over the client for testing.
#[derive(Debug)]
pub struct DelegatedBridgeProvider<B> {
    core: TreeCore,
    bridge: B,
}

impl<B: BridgeClient> DelegatedBridgeProvider<B> {
    pub const NAME: &'static str = "delegated-bridge";

    pub fn new(config: &TreeConfig, bridge: B) -> Result<Self, TreeError> {
        Ok(Self {
            core: TreeCore::new(config)?,
            bridge,
        })
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    async fn fetch_root(&self, network: NetworkId) -> Result<MerkleRoot, TreeError> {
        let answer = self.bridge.merkle_root(network.as_str()).await?;
        if let Some(depth) = answer.tree_depth {
            if depth != self.core.tree_depth {
                tracing::warn!(
                    %network,
                    bridge_depth = depth,
                    configured_depth = self.core.tree_depth,
                    "bridge reports a different tree depth"
                );
            }
        }
        Ok(self
            .core
            .root_record(network, answer.root, answer.leaf_count, answer.block_number))
    }

    async fn fetch_path(&self, network: &NetworkId, commitment: &Commitment) -> Result<MerklePath, TreeError> {
        match self.bridge.merkle_proof(network.as_str(), commitment).await {
            Ok(proof) => Ok(MerklePath {
                commitment: *commitment,
                root: proof.root,
                network: network.clone(),
                leaf_index: proof.leaf_index,
                siblings: proof.siblings,
                path_indices: proof.path_indices,
            }),
            Err(e) => {
                tracing::warn!(%network, %commitment, error = %e, "bridge path query failed");
                Err(TreeError::CommitmentNotFound {
                    network: network.to_string(),
                    commitment: commitment.canonical(),
                })
            }
        }
    }
}

impl<B: BridgeClient> CommitmentTreeProvider for DelegatedBridgeProvider<B> {
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
            .cached_root(&network, || self.fetch_root(network.clone()))
            .await
    }

    async fn get_path(&self, commitment: &str, network: &str) -> Result<MerklePath, TreeError> {
        let network = self.core.network(network)?;
        let commitment = TreeCore::commitment(commitment)?;
        self.core
            .cached_path(&network, &commitment, || self.fetch_path(&network, &commitment))
            .await
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
        self.bridge.rescan(network.as_str()).await?;
        self.core.invalidate(&network);
        let root = self.fetch_root(network).await?;
        self.core.publish(Self::NAME, &root);
        Ok(root)
    }

    fn subscribe(&self) -> broadcast::Receiver<MerkleRoot> {
        self.core.notifier.subscribe()
    }
}
