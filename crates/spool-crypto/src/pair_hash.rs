//! # Merkle Pair Hash
//!
//! Combines a node with its sibling to form the parent. The caller decides
//! the order from the path bit; [`PairHasher::combine`] never reorders, so
//! `combine(l, a, b) != combine(l, b, a)` and path bits stay meaningful.
//!
//! ## Primary: Poseidon via Helper Binary
//!
//! The circuit-compatible hash runs out of process:
//! `<binary> hash <left_hex> <right_hex>` printing 32 bytes of hex. The
//! binary is probed once per process for each helper path (`<binary>
//! --version`, exit 0 within the timeout). Every hasher configured with the
//! same path shares the answer.
//!
//! ## Fallback: Domain-Separated SHA-256
//!
//! `SHA-256("merkle_node:" || level (u32 BE) || left || right)`. Used when
//! the primary is not configured, failed its probe, or a single call fails,
//! times out, or prints something that is not 32 bytes of hex. Degradation
//! is logged at `warn` and never surfaced as an error.
//!
//! Roots computed under the fallback are not comparable with on-chain
//! Poseidon roots. Deployments that verify against chain state must ship the
//! helper binary.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use dashmap::DashMap;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use spool_core::config::{env_opt, env_parse, ConfigError};
use spool_core::Hash32;
use tokio::sync::OnceCell;

use crate::exec::{ExecOutcome, ExternalExecutor};

/// Domain-separation prefix for fallback interior nodes.
pub const NODE_DOMAIN_TAG: &[u8] = b"merkle_node:";

/// Default per-call deadline for the helper binary.
pub const DEFAULT_HASH_TIMEOUT_SECS: u64 = 5;

/// Which pair hash the deployment asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PairHashAlgorithm {
    /// External Poseidon helper, degrading to SHA-256.
    #[default]
    Poseidon,
    /// SHA-256 only; the helper is never invoked.
    Sha256,
}

impl fmt::Display for PairHashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Poseidon => f.write_str("poseidon"),
            Self::Sha256 => f.write_str("sha256"),
        }
    }
}

impl FromStr for PairHashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "poseidon" => Ok(Self::Poseidon),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            other => Err(format!("unknown pair hash algorithm {other:?}")),
        }
    }
}

/// Pair-hash configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PairHasherConfig {
    pub algorithm: PairHashAlgorithm,
    /// Path to the Poseidon helper. `None` means always fall back.
    pub helper_binary: Option<PathBuf>,
    /// Per-invocation deadline, probe included.
    pub timeout_secs: u64,
}

impl Default for PairHasherConfig {
    fn default() -> Self {
        Self {
            algorithm: PairHashAlgorithm::default(),
            helper_binary: None,
            timeout_secs: DEFAULT_HASH_TIMEOUT_SECS,
        }
    }
}

impl PairHasherConfig {
    /// SHA-256 only; no helper.
    pub fn sha256() -> Self {
        Self {
            algorithm: PairHashAlgorithm::Sha256,
            ..Self::default()
        }
    }

    /// Poseidon through `binary`.
    pub fn poseidon(binary: impl Into<PathBuf>) -> Self {
        Self {
            algorithm: PairHashAlgorithm::Poseidon,
            helper_binary: Some(binary.into()),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `SPOOL_PAIR_HASH` (`poseidon` | `sha256`, default: `poseidon`)
    /// - `SPOOL_POSEIDON_BIN` (optional)
    /// - `SPOOL_HASH_TIMEOUT_SECS` (default: 5)
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            algorithm: env_parse("SPOOL_PAIR_HASH", PairHashAlgorithm::default())?,
            helper_binary: env_opt("SPOOL_POSEIDON_BIN").map(PathBuf::from),
            timeout_secs: env_parse("SPOOL_HASH_TIMEOUT_SECS", DEFAULT_HASH_TIMEOUT_SECS)?,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// The fallback node hash.
pub fn sha256_node(level: u32, left: &Hash32, right: &Hash32) -> Hash32 {
    let mut hasher = Sha256::new();
    hasher.update(NODE_DOMAIN_TAG);
    hasher.update(level.to_be_bytes());
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    Hash32::from_bytes(hasher.finalize().into())
}

/// Probe results, keyed by helper path, for the life of the process.
static PROBES: OnceLock<DashMap<PathBuf, Arc<OnceCell<bool>>>> = OnceLock::new();

fn probe_cell(binary: &Path) -> Arc<OnceCell<bool>> {
    PROBES
        .get_or_init(DashMap::new)
        .entry(binary.to_path_buf())
        .or_default()
        .clone()
}

/// Order-sensitive node combiner with a probed primary and a SHA-256 fallback.
#[derive(Debug)]
pub struct PairHasher {
    config: PairHasherConfig,
    executor: ExternalExecutor,
    primary_ok: Arc<OnceCell<bool>>,
}

impl Default for PairHasher {
    fn default() -> Self {
        Self::new(PairHasherConfig::default())
    }
}

impl PairHasher {
    pub fn new(config: PairHasherConfig) -> Self {
        let primary_ok = match &config.helper_binary {
            Some(binary) => probe_cell(binary),
            None => Arc::default(),
        };
        Self {
            config,
            executor: ExternalExecutor::new(),
            primary_ok,
        }
    }

    /// A hasher that never leaves the process.
    pub fn sha256() -> Self {
        Self::new(PairHasherConfig::sha256())
    }

    pub fn config(&self) -> &PairHasherConfig {
        &self.config
    }

    /// Hash `left || right` at tree `level` (0 = leaf level).
    pub async fn combine(&self, level: u32, left: &Hash32, right: &Hash32) -> Hash32 {
        if let Some(binary) = self.primary_binary().await {
            match self.poseidon(binary, left, right).await {
                Ok(hash) => return hash,
                Err(reason) => {
                    tracing::warn!(
                        level,
                        binary = %binary.display(),
                        %reason,
                        "poseidon pair hash failed, using sha256 fallback"
                    );
                }
            }
        }
        sha256_node(level, left, right)
    }

    /// The algorithm calls will use, after probing.
    pub async fn effective_algorithm(&self) -> PairHashAlgorithm {
        if self.primary_binary().await.is_some() {
            PairHashAlgorithm::Poseidon
        } else {
            PairHashAlgorithm::Sha256
        }
    }

    async fn primary_binary(&self) -> Option<&Path> {
        if self.config.algorithm != PairHashAlgorithm::Poseidon {
            return None;
        }
        let binary = self.config.helper_binary.as_deref()?;
        let available = *self
            .primary_ok
            .get_or_init(|| self.probe(binary))
            .await;
        available.then_some(binary)
    }

    async fn probe(&self, binary: &Path) -> bool {
        let outcome = self
            .executor
            .run(binary, ["--version"], self.config.timeout())
            .await;
        match outcome {
            ExecOutcome::Completed { stdout } => {
                tracing::info!(binary = %binary.display(), version = %stdout.trim(), "poseidon helper available");
                true
            }
            ExecOutcome::TimedOut => {
                tracing::warn!(binary = %binary.display(), "poseidon helper probe timed out, using sha256 pair hash");
                false
            }
            ExecOutcome::Failed { code, stderr } => {
                tracing::warn!(
                    binary = %binary.display(),
                    ?code,
                    stderr = %stderr.trim(),
                    "poseidon helper unavailable, using sha256 pair hash"
                );
                false
            }
        }
    }

    async fn poseidon(&self, binary: &Path, left: &Hash32, right: &Hash32) -> Result<Hash32, String> {
        let args = ["hash".to_string(), left.to_prefixed_hex(), right.to_prefixed_hex()];
        match self.executor.run(binary, &args, self.config.timeout()).await {
            ExecOutcome::Completed { stdout } => {
                Hash32::parse(stdout.trim()).map_err(|e| format!("malformed output: {e}"))
            }
            ExecOutcome::TimedOut => Err(format!("timed out after {}s", self.config.timeout_secs)),
            ExecOutcome::Failed { code, stderr } => {
                Err(format!("exit {code:?}: {}", stderr.trim()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(b: u8) -> Hash32 {
        Hash32::from_bytes([b; 32])
    }

    #[test]
    fn sha256_node_is_order_sensitive() {
        assert_ne!(sha256_node(0, &h(1), &h(2)), sha256_node(0, &h(2), &h(1)));
    }

    #[test]
    fn sha256_node_binds_level() {
        assert_ne!(sha256_node(0, &h(1), &h(2)), sha256_node(1, &h(1), &h(2)));
    }

    #[test]
    fn sha256_node_matches_manual_digest() {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"merkle_node:");
        buf.extend_from_slice(&7u32.to_be_bytes());
        buf.extend_from_slice(&[0xaa; 32]);
        buf.extend_from_slice(&[0xbb; 32]);
        let expected: [u8; 32] = Sha256::digest(&buf).into();
        assert_eq!(sha256_node(7, &h(0xaa), &h(0xbb)).as_bytes(), &expected);
    }

    #[tokio::test]
    async fn sha256_hasher_uses_fallback() {
        let hasher = PairHasher::sha256();
        assert_eq!(hasher.combine(3, &h(1), &h(2)).await, sha256_node(3, &h(1), &h(2)));
        assert_eq!(hasher.effective_algorithm().await, PairHashAlgorithm::Sha256);
    }

    #[tokio::test]
    async fn poseidon_without_binary_degrades() {
        let hasher = PairHasher::new(PairHasherConfig::default());
        assert_eq!(hasher.combine(0, &h(4), &h(5)).await, sha256_node(0, &h(4), &h(5)));
    }

    #[tokio::test]
    async fn missing_binary_degrades_silently() {
        let hasher = PairHasher::new(PairHasherConfig::poseidon("/nonexistent/poseidon-helper"));
        assert_eq!(hasher.combine(0, &h(4), &h(5)).await, sha256_node(0, &h(4), &h(5)));
        assert_eq!(hasher.effective_algorithm().await, PairHashAlgorithm::Sha256);
    }

    #[test]
    fn algorithm_parses_case_insensitively() {
        assert_eq!("SHA256".parse::<PairHashAlgorithm>().unwrap(), PairHashAlgorithm::Sha256);
        assert_eq!("poseidon".parse::<PairHashAlgorithm>().unwrap(), PairHashAlgorithm::Poseidon);
        assert!("blake3".parse::<PairHashAlgorithm>().is_err());
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let cfg: PairHasherConfig = serde_json::from_str(r#"{"algorithm":"sha256"}"#).unwrap();
        assert_eq!(cfg.algorithm, PairHashAlgorithm::Sha256);
        assert_eq!(cfg.timeout_secs, DEFAULT_HASH_TIMEOUT_SECS);
        assert!(cfg.helper_binary.is_none());
    }
}
