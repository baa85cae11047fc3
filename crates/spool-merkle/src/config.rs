//! Tree provider configuration.
//!
//! [`TreeConfig`] is shared by every backend. [`ChainRpcConfig`] adds the
//! per-network RPC endpoint and tree contract for the chain-RPC backend;
//! the bridge backend takes a `spool_bridge_client::BridgeConfig`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use spool_core::config::{env_list, env_parse, env_required, split_pairs, ConfigError};
use spool_core::{SupportedNetworks, DEFAULT_TREE_DEPTH};
use spool_crypto::PairHasherConfig;

/// Default lifetime of a cached root.
pub const DEFAULT_ROOT_TTL_SECS: u64 = 30;

/// Default RPC request timeout.
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 30;

/// Which provider answers tree queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TreeBackendKind {
    /// In-process demo tree.
    #[default]
    Synthetic,
    /// Read-only `eth_call` against the pool contract.
    ChainRpc,
    /// Delegated bridge service.
    Bridge,
}

impl fmt::Display for TreeBackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Synthetic => "synthetic",
            Self::ChainRpc => "chain-rpc",
            Self::Bridge => "bridge",
        })
    }
}

impl FromStr for TreeBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "synthetic" => Ok(Self::Synthetic),
            "chain-rpc" | "rpc" => Ok(Self::ChainRpc),
            "bridge" => Ok(Self::Bridge),
            other => Err(format!("unknown tree backend {other:?}")),
        }
    }
}

/// Settings common to all tree providers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    pub backend: TreeBackendKind,
    /// Networks this deployment answers for.
    pub networks: Vec<String>,
    pub tree_depth: u32,
    /// Root cache lifetime. `0` disables the cache.
    pub root_ttl_secs: u64,
    /// Path cache lifetime. `0` (the default) disables the cache.
    pub path_ttl_secs: u64,
    /// Buffered root-update notifications per subscriber.
    pub notify_capacity: usize,
    pub pair_hash: PairHasherConfig,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            backend: TreeBackendKind::default(),
            networks: vec!["ethereum".into(), "polygon".into()],
            tree_depth: DEFAULT_TREE_DEPTH,
            root_ttl_secs: DEFAULT_ROOT_TTL_SECS,
            path_ttl_secs: 0,
            notify_capacity: 16,
            pair_hash: PairHasherConfig::default(),
        }
    }
}

impl TreeConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `SPOOL_TREE_BACKEND` (`synthetic` | `chain-rpc` | `bridge`, default: `synthetic`)
    /// - `SPOOL_NETWORKS` (comma-separated, default: `ethereum,polygon`)
    /// - `SPOOL_TREE_DEPTH` (default: 32)
    /// - `SPOOL_ROOT_TTL_SECS` (default: 30)
    /// - `SPOOL_PATH_TTL_SECS` (default: 0)
    /// - pair-hash variables, see `PairHasherConfig::from_env`
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            backend: env_parse("SPOOL_TREE_BACKEND", defaults.backend)?,
            networks: env_list("SPOOL_NETWORKS", &["ethereum", "polygon"]),
            tree_depth: env_parse("SPOOL_TREE_DEPTH", defaults.tree_depth)?,
            root_ttl_secs: env_parse("SPOOL_ROOT_TTL_SECS", defaults.root_ttl_secs)?,
            path_ttl_secs: env_parse("SPOOL_PATH_TTL_SECS", defaults.path_ttl_secs)?,
            notify_capacity: defaults.notify_capacity,
            pair_hash: PairHasherConfig::from_env()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations no provider can serve.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tree_depth == 0 || self.tree_depth > 64 {
            return Err(ConfigError::Invalid {
                var: "tree_depth".into(),
                reason: format!("must be in 1..=64, got {}", self.tree_depth),
            });
        }
        if self.supported_networks().is_empty() {
            return Err(ConfigError::Invalid {
                var: "networks".into(),
                reason: "at least one network is required".into(),
            });
        }
        Ok(())
    }

    pub fn supported_networks(&self) -> SupportedNetworks {
        SupportedNetworks::new(&self.networks)
    }

    pub fn root_ttl(&self) -> Duration {
        Duration::from_secs(self.root_ttl_secs)
    }

    pub fn path_ttl(&self) -> Duration {
        Duration::from_secs(self.path_ttl_secs)
    }
}

/// RPC endpoint and tree contract for one network.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChainEndpoint {
    pub rpc_url: String,
    /// Pool contract exposing `getMerkleRoot()`, `getMerklePath(bytes32)`
    /// and `getLeafCount()`.
    pub contract_address: String,
}

/// Chain-RPC backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChainRpcConfig {
    /// Keyed by network id.
    pub endpoints: BTreeMap<String, ChainEndpoint>,
    #[serde(default = "default_rpc_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_rpc_timeout_secs() -> u64 {
    DEFAULT_RPC_TIMEOUT_SECS
}

impl ChainRpcConfig {
    pub fn new() -> Self {
        Self {
            endpoints: BTreeMap::new(),
            timeout_secs: DEFAULT_RPC_TIMEOUT_SECS,
        }
    }

    /// Add or replace the endpoint for `network`.
    pub fn with_endpoint(
        mut self,
        network: impl Into<String>,
        rpc_url: impl Into<String>,
        contract_address: impl Into<String>,
    ) -> Self {
        self.endpoints.insert(
            network.into().trim().to_ascii_lowercase(),
            ChainEndpoint {
                rpc_url: rpc_url.into(),
                contract_address: contract_address.into(),
            },
        );
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `SPOOL_RPC_URLS` (required, `network=url,...`)
    /// - `SPOOL_TREE_CONTRACTS` (required, `network=0xaddress,...`)
    /// - `SPOOL_RPC_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        let urls = split_pairs("SPOOL_RPC_URLS", &env_required("SPOOL_RPC_URLS")?)?;
        let contracts: BTreeMap<String, String> =
            split_pairs("SPOOL_TREE_CONTRACTS", &env_required("SPOOL_TREE_CONTRACTS")?)?
                .into_iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v))
                .collect();

        let mut config = Self::new();
        for (network, url) in urls {
            let network = network.to_ascii_lowercase();
            let contract = contracts.get(&network).ok_or_else(|| ConfigError::Invalid {
                var: "SPOOL_TREE_CONTRACTS".into(),
                reason: format!("no contract address for network {network:?}"),
            })?;
            config = config.with_endpoint(network.clone(), url, contract.clone());
        }
        config.timeout_secs = env_parse("SPOOL_RPC_TIMEOUT_SECS", DEFAULT_RPC_TIMEOUT_SECS)?;
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ChainRpcConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = TreeConfig::default();
        assert_eq!(cfg.tree_depth, 32);
        assert_eq!(cfg.root_ttl(), Duration::from_secs(30));
        assert_eq!(cfg.backend, TreeBackendKind::Synthetic);
        assert!(cfg.supported_networks().contains("polygon"));
        cfg.validate().unwrap();
    }

    #[test]
    fn validate_rejects_zero_depth_and_empty_networks() {
        let cfg = TreeConfig {
            tree_depth: 0,
            ..TreeConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = TreeConfig {
            networks: vec![" ".into()],
            ..TreeConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn backend_kind_parses_aliases() {
        assert_eq!("chain_rpc".parse::<TreeBackendKind>().unwrap(), TreeBackendKind::ChainRpc);
        assert_eq!("Bridge".parse::<TreeBackendKind>().unwrap(), TreeBackendKind::Bridge);
        assert!("ipfs".parse::<TreeBackendKind>().is_err());
    }

    #[test]
    fn tree_config_deserializes_partial_json() {
        let cfg: TreeConfig =
            serde_json::from_str(r#"{"backend":"chain-rpc","networks":["base"],"tree_depth":20}"#)
                .unwrap();
        assert_eq!(cfg.backend, TreeBackendKind::ChainRpc);
        assert_eq!(cfg.tree_depth, 20);
        assert_eq!(cfg.root_ttl_secs, DEFAULT_ROOT_TTL_SECS);
    }

    #[test]
    fn with_endpoint_normalizes_network() {
        let cfg = ChainRpcConfig::new().with_endpoint(" Polygon ", "http://rpc", "0xabc");
        assert!(cfg.endpoints.contains_key("polygon"));
    }
}
