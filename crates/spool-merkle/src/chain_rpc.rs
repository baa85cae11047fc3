//! # Chain RPC Tree Provider
//!
//! Reads the commitment tree directly from the pool contract with
//! read-only `eth_call`s. No keys, no transactions.
//!
//! ## Contract Interface
//!
//! ```solidity
//! function getMerkleRoot() external view returns (bytes32);
//! function getLeafCount() external view returns (uint256);
//! function getMerklePath(bytes32 commitment) external view
//!     returns (uint256 leafIndex, bytes32 root, bytes32[] siblings);
//! ```
//!
//! ## `getMerklePath` Return Layout
//!
//! | Bytes | Word | Content |
//! |-------|------|---------|
//! | 0..32 | 0 | `leafIndex` |
//! | 32..64 | 1 | `root` |
//! | 64..96 | 2 | offset of `siblings` (ignored, always `0x60`) |
//! | 96..128 | 3 | `siblings.length` |
//! | 128.. | 4.. | siblings |
//!
//! Fewer siblings than the tree depth are zero-padded; extra ones are
//! dropped. Path bits come from the leaf index (the contract's tree is
//! filled left to right). An all-zero answer means "not a leaf".

use std::collections::BTreeMap;

use spool_core::{path_indices_from_leaf_index, Commitment, Hash32, MerklePath, MerkleRoot, NetworkId};
use tokio::sync::broadcast;

use crate::config::{ChainEndpoint, ChainRpcConfig, TreeConfig};
use crate::error::TreeError;
use crate::provider::{CommitmentTreeProvider, TreeCore};

/// `getMerkleRoot()`
pub const GET_MERKLE_ROOT_SELECTOR: &str = "49590657";
/// `getMerklePath(bytes32)`
pub const GET_MERKLE_PATH_SELECTOR: &str = "d075eee6";
/// `getLeafCount()`
pub const GET_LEAF_COUNT_SELECTOR: &str = "d3ea6125";

const WORD: usize = 32;

/// Read-only JSON-RPC view of the on-chain tree.
#[derive(Debug)]
pub struct ChainRpcProvider {
    core: TreeCore,
    client: reqwest::Client,
    endpoints: BTreeMap<NetworkId, ChainEndpoint>,
}

impl ChainRpcProvider {
    pub const NAME: &'static str = "chain-rpc";

    /// Every supported network needs an endpoint with a well-formed
    /// contract address.
    pub fn new(tree: &TreeConfig, rpc: &ChainRpcConfig) -> Result<Self, TreeError> {
        let core = TreeCore::new(tree)?;

        let mut endpoints = BTreeMap::new();
        for network in core.networks.iter() {
            let endpoint = rpc.endpoints.get(network.as_str()).ok_or_else(|| {
                spool_core::ConfigError::Invalid {
                    var: "rpc.endpoints".into(),
                    reason: format!("no RPC endpoint for network {network}"),
                }
            })?;
            if !is_valid_eth_address(&endpoint.contract_address) {
                return Err(spool_core::ConfigError::Invalid {
                    var: format!("rpc.endpoints.{network}.contract_address"),
                    reason: format!("invalid contract address: {}", endpoint.contract_address),
                }
                .into());
            }
            endpoints.insert(network.clone(), endpoint.clone());
        }

        let client = reqwest::Client::builder()
            .timeout(rpc.timeout())
            .build()
            .map_err(|e| TreeError::rpc("*", format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            core,
            client,
            endpoints,
        })
    }

    fn endpoint(&self, network: &NetworkId) -> Result<&ChainEndpoint, TreeError> {
        self.endpoints
            .get(network)
            .ok_or_else(|| TreeError::rpc(network.as_str(), "no endpoint configured"))
    }

    /// Send a JSON-RPC request and return the result field.
    async fn rpc_call(
        &self,
        network: &NetworkId,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, TreeError> {
        let endpoint = self.endpoint(network)?;
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let resp = self
            .client
            .post(&endpoint.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() {
                    format!("{method}: request timed out")
                } else {
                    format!("{method}: {e}")
                };
                TreeError::rpc(network.as_str(), reason)
            })?;

        if !resp.status().is_success() {
            return Err(TreeError::rpc(
                network.as_str(),
                format!("{method}: HTTP {}", resp.status()),
            ));
        }

        let json: serde_json::Value = resp.json().await.map_err(|e| {
            TreeError::rpc(network.as_str(), format!("{method}: invalid JSON response: {e}"))
        })?;

        if let Some(error) = json.get("error") {
            let msg = error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown RPC error");
            return Err(TreeError::rpc(network.as_str(), format!("{method}: {msg}")));
        }

        json.get("result").cloned().ok_or_else(|| {
            TreeError::rpc(
                network.as_str(),
                format!("{method}: JSON-RPC response missing 'result' field"),
            )
        })
    }

    /// `eth_call` at `latest`, returning the decoded return data.
    async fn eth_call(&self, network: &NetworkId, calldata: String) -> Result<Vec<u8>, TreeError> {
        let to = self.endpoint(network)?.contract_address.clone();
        let result = self
            .rpc_call(
                network,
                "eth_call",
                serde_json::json!([{ "to": to, "data": calldata }, "latest"]),
            )
            .await?;
        let hex_str = result
            .as_str()
            .ok_or_else(|| TreeError::rpc(network.as_str(), "eth_call returned non-string result"))?;
        decode_hex_bytes(hex_str)
            .map_err(|e| TreeError::rpc(network.as_str(), format!("eth_call result: {e}")))
    }

    async fn block_number(&self, network: &NetworkId) -> Result<u64, TreeError> {
        let value = self
            .rpc_call(network, "eth_blockNumber", serde_json::json!([]))
            .await?;
        value
            .as_str()
            .and_then(|s| u64::from_str_radix(s.trim_start_matches("0x"), 16).ok())
            .ok_or_else(|| TreeError::rpc(network.as_str(), "eth_blockNumber: malformed quantity"))
    }

    async fn fetch_root(&self, network: NetworkId) -> Result<MerkleRoot, TreeError> {
        let root_data = self
            .eth_call(&network, format!("0x{GET_MERKLE_ROOT_SELECTOR}"))
            .await?;
        let root = word(&root_data, 0)
            .map(Hash32::from_bytes)
            .ok_or_else(|| TreeError::rpc(network.as_str(), "getMerkleRoot: short return data"))?;

        let count_data = self
            .eth_call(&network, format!("0x{GET_LEAF_COUNT_SELECTOR}"))
            .await?;
        let leaf_count = word(&count_data, 0)
            .and_then(|w| word_to_u64(&w))
            .ok_or_else(|| TreeError::rpc(network.as_str(), "getLeafCount: malformed uint256"))?;

        let block_number = self.block_number(&network).await?;
        Ok(self.core.root_record(network, root, leaf_count, block_number))
    }

    async fn fetch_path(&self, network: &NetworkId, commitment: &Commitment) -> Result<MerklePath, TreeError> {
        let calldata = format!("0x{GET_MERKLE_PATH_SELECTOR}{}", commitment.as_hash().to_hex());
        let data = self.eth_call(network, calldata).await?;
        let decoded = decode_merkle_path(&data, self.core.tree_depth)
            .map_err(|reason| TreeError::rpc(network.as_str(), format!("getMerklePath: {reason}")))?;

        if decoded.is_empty_answer() {
            return Err(TreeError::CommitmentNotFound {
                network: network.to_string(),
                commitment: commitment.canonical(),
            });
        }

        Ok(MerklePath {
            commitment: *commitment,
            root: decoded.root,
            network: network.clone(),
            leaf_index: decoded.leaf_index,
            path_indices: path_indices_from_leaf_index(decoded.leaf_index, self.core.tree_depth),
            siblings: decoded.siblings,
        })
    }
}

/// Decoded `getMerklePath` answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPath {
    pub leaf_index: u64,
    pub root: Hash32,
    /// Exactly `tree_depth` entries.
    pub siblings: Vec<Hash32>,
    /// Sibling count the contract reported.
    pub reported_len: u64,
}

impl DecodedPath {
    /// The contract's "not a leaf" answer: zero root, index and siblings.
    pub fn is_empty_answer(&self) -> bool {
        self.root.is_zero() && self.leaf_index == 0 && self.siblings.iter().all(Hash32::is_zero)
    }
}

/// Decode `getMerklePath` return data per the layout in the module docs.
pub fn decode_merkle_path(data: &[u8], tree_depth: u32) -> Result<DecodedPath, String> {
    if data.len() < 4 * WORD {
        return Err(format!("short return data ({} bytes)", data.len()));
    }
    let leaf_index = word(data, 0)
        .and_then(|w| word_to_u64(&w))
        .ok_or("leafIndex does not fit in u64")?;
    let root = word(data, 1).map(Hash32::from_bytes).ok_or("missing root")?;
    let reported_len = word(data, 3)
        .and_then(|w| word_to_u64(&w))
        .ok_or("sibling count does not fit in u64")?;

    let available = ((data.len() - 4 * WORD) / WORD) as u64;
    if reported_len > available {
        return Err(format!(
            "sibling count {reported_len} exceeds {available} words of return data"
        ));
    }

    let depth = tree_depth as usize;
    let mut siblings: Vec<Hash32> = (0..reported_len.min(depth as u64) as usize)
        .filter_map(|i| word(data, 4 + i).map(Hash32::from_bytes))
        .collect();
    siblings.resize(depth, Hash32::ZERO);

    Ok(DecodedPath {
        leaf_index,
        root,
        siblings,
        reported_len,
    })
}

/// The `index`-th 32-byte word of `data`.
fn word(data: &[u8], index: usize) -> Option<[u8; 32]> {
    let start = index.checked_mul(WORD)?;
    let slice = data.get(start..start + WORD)?;
    <[u8; 32]>::try_from(slice).ok()
}

/// A big-endian uint256 word as `u64`, if it fits.
fn word_to_u64(w: &[u8; 32]) -> Option<u64> {
    if w[..24].iter().any(|b| *b != 0) {
        return None;
    }
    let mut tail = [0u8; 8];
    tail.copy_from_slice(&w[24..]);
    Some(u64::from_be_bytes(tail))
}

fn decode_hex_bytes(s: &str) -> Result<Vec<u8>, String> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(digits).map_err(|e| format!("invalid hex: {e}"))
}

/// Validate that a string is a well-formed Ethereum address (0x + 40 hex chars).
fn is_valid_eth_address(addr: &str) -> bool {
    addr.len() == 42 && addr.starts_with("0x") && addr[2..].chars().all(|c| c.is_ascii_hexdigit())
}

impl CommitmentTreeProvider for ChainRpcProvider {
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
        self.core.invalidate(&network);
        let root = self.fetch_root(network).await?;
        self.core.publish(Self::NAME, &root);
        Ok(root)
    }

    fn subscribe(&self) -> broadcast::Receiver<MerkleRoot> {
        self.core.notifier.subscribe()
    }
}
