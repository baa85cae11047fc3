//! Tree backend selected once at startup.

use spool_bridge_client::{BridgeConfig, HttpBridgeClient};
use spool_core::{MerklePath, MerkleRoot};
use tokio::sync::broadcast;

use crate::bridge::DelegatedBridgeProvider;
use crate::chain_rpc::ChainRpcProvider;
use crate::config::{ChainRpcConfig, TreeBackendKind, TreeConfig};
use crate::error::TreeError;
use crate::provider::CommitmentTreeProvider;
use crate::synthetic::SyntheticProvider;

/// One of the three providers, dispatched by `match`.
#[derive(Debug)]
pub enum TreeBackend {
    Synthetic(SyntheticProvider),
    ChainRpc(ChainRpcProvider),
    Bridge(DelegatedBridgeProvider<HttpBridgeClient>),
}

impl TreeBackend {
    /// Build the backend named by `tree.backend`. The chain-RPC backend
    /// needs `rpc`; the bridge backend needs `bridge`.
    pub fn from_config(
        tree: &TreeConfig,
        rpc: Option<&ChainRpcConfig>,
        bridge: Option<BridgeConfig>,
    ) -> Result<Self, TreeError> {
        let backend = match tree.backend {
            TreeBackendKind::Synthetic => Self::Synthetic(SyntheticProvider::new(tree)?),
            TreeBackendKind::ChainRpc => {
                let rpc = rpc.ok_or_else(|| missing("chain-rpc backend requires RPC configuration"))?;
                Self::ChainRpc(ChainRpcProvider::new(tree, rpc)?)
            }
            TreeBackendKind::Bridge => {
                let bridge =
                    bridge.ok_or_else(|| missing("bridge backend requires bridge configuration"))?;
                Self::Bridge(DelegatedBridgeProvider::new(tree, HttpBridgeClient::new(bridge)?)?)
            }
        };
        tracing::info!(
            backend = backend.provider_name(),
            networks = ?tree.supported_networks().names(),
            tree_depth = tree.tree_depth,
            "tree backend ready"
        );
        Ok(backend)
    }

    /// Load every configuration the selected backend needs from the
    /// environment and build it.
    pub fn from_env() -> Result<Self, TreeError> {
        let tree = TreeConfig::from_env()?;
        match tree.backend {
            TreeBackendKind::Synthetic => Self::from_config(&tree, None, None),
            TreeBackendKind::ChainRpc => {
                let rpc = ChainRpcConfig::from_env()?;
                Self::from_config(&tree, Some(&rpc), None)
            }
            TreeBackendKind::Bridge => {
                let bridge = BridgeConfig::from_env()?;
                Self::from_config(&tree, None, Some(bridge))
            }
        }
    }

    /// The synthetic provider, for seeding demo leaves.
    pub fn as_synthetic(&self) -> Option<&SyntheticProvider> {
        match self {
            Self::Synthetic(p) => Some(p),
            _ => None,
        }
    }
}

fn missing(reason: &str) -> TreeError {
    TreeError::Config(spool_core::ConfigError::Invalid {
        var: "backend".into(),
        reason: reason.into(),
    })
}

impl CommitmentTreeProvider for TreeBackend {
    fn provider_name(&self) -> &'static str {
        match self {
            Self::Synthetic(p) => p.provider_name(),
            Self::ChainRpc(p) => p.provider_name(),
            Self::Bridge(p) => p.provider_name(),
        }
    }

    fn tree_depth(&self) -> u32 {
        match self {
            Self::Synthetic(p) => p.tree_depth(),
            Self::ChainRpc(p) => p.tree_depth(),
            Self::Bridge(p) => p.tree_depth(),
        }
    }

    fn supports_network(&self, network: &str) -> bool {
        match self {
            Self::Synthetic(p) => p.supports_network(network),
            Self::ChainRpc(p) => p.supports_network(network),
            Self::Bridge(p) => p.supports_network(network),
        }
    }

    async fn get_root(&self, network: &str) -> Result<MerkleRoot, TreeError> {
        match self {
            Self::Synthetic(p) => p.get_root(network).await,
            Self::ChainRpc(p) => p.get_root(network).await,
            Self::Bridge(p) => p.get_root(network).await,
        }
    }

    async fn get_path(&self, commitment: &str, network: &str) -> Result<MerklePath, TreeError> {
        match self {
            Self::Synthetic(p) => p.get_path(commitment, network).await,
            Self::ChainRpc(p) => p.get_path(commitment, network).await,
            Self::Bridge(p) => p.get_path(commitment, network).await,
        }
    }

    async fn verify(&self, commitment: &str, path: &MerklePath) -> Result<bool, TreeError> {
        match self {
            Self::Synthetic(p) => p.verify(commitment, path).await,
            Self::ChainRpc(p) => p.verify(commitment, path).await,
            Self::Bridge(p) => p.verify(commitment, path).await,
        }
    }

    async fn sync(&self, network: &str) -> Result<MerkleRoot, TreeError> {
        match self {
            Self::Synthetic(p) => p.sync(network).await,
            Self::ChainRpc(p) => p.sync(network).await,
            Self::Bridge(p) => p.sync(network).await,
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<MerkleRoot> {
        match self {
            Self::Synthetic(p) => p.subscribe(),
            Self::ChainRpc(p) => p.subscribe(),
            Self::Bridge(p) => p.subscribe(),
        }
    }
}
