//! Prover configuration.
//!
//! [`ProverConfig`] carries the settings both backends share (validity
//! window, verifier addresses) plus the local prover's circuit mapping and
//! binary. The bridge backend's operation mapping lives in the nested
//! [`BridgeProverConfig`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use spool_core::config::{env_opt, env_parse, split_pairs, ConfigError};
use spool_core::{ProofType, DEFAULT_PROOF_VALIDITY_DAYS};

/// Default deadline for one `prove` or `verify` invocation.
pub const DEFAULT_PROVER_TIMEOUT_SECS: u64 = 120;

const MAX_VALIDITY_DAYS: i64 = 36_500;

/// Which prover generates and checks proofs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProverBackendKind {
    /// Circuit files on disk, proved by a subprocess.
    #[default]
    Local,
    /// Delegated bridge service.
    Bridge,
}

impl fmt::Display for ProverBackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Local => "local",
            Self::Bridge => "bridge",
        })
    }
}

impl FromStr for ProverBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "bridge" => Ok(Self::Bridge),
            other => Err(format!("unknown prover backend {other:?}")),
        }
    }
}

/// Bridge endpoint a proof type is delegated to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BridgeOperation {
    Shield,
    Unshield,
    Transfer,
}

impl BridgeOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shield => "shield",
            Self::Unshield => "unshield",
            Self::Transfer => "transfer",
        }
    }
}

impl fmt::Display for BridgeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BridgeOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shield" => Ok(Self::Shield),
            "unshield" => Ok(Self::Unshield),
            "transfer" => Ok(Self::Transfer),
            other => Err(format!("unknown bridge operation {other:?}")),
        }
    }
}

/// Operation mapping for the delegated bridge prover.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BridgeProverConfig {
    pub operations: BTreeMap<ProofType, BridgeOperation>,
}

impl Default for BridgeProverConfig {
    /// The three pool operations map to their namesakes; compliance
    /// proofs have no bridge operation.
    fn default() -> Self {
        Self {
            operations: BTreeMap::from([
                (ProofType::Shield, BridgeOperation::Shield),
                (ProofType::Unshield, BridgeOperation::Unshield),
                (ProofType::Transfer, BridgeOperation::Transfer),
            ]),
        }
    }
}

impl BridgeProverConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `SPOOL_BRIDGE_OPERATIONS` (`type=operation,...`; replaces the
    ///   default mapping when set)
    pub fn from_env() -> Result<Self, ConfigError> {
        let operations = match proof_type_map("SPOOL_BRIDGE_OPERATIONS")? {
            None => Self::default().operations,
            Some(pairs) => pairs
                .into_iter()
                .map(|(t, op)| {
                    op.parse()
                        .map(|op| (t, op))
                        .map_err(|reason| ConfigError::Invalid {
                            var: "SPOOL_BRIDGE_OPERATIONS".into(),
                            reason,
                        })
                })
                .collect::<Result<_, _>>()?,
        };
        Ok(Self { operations })
    }
}

/// Prover settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProverConfig {
    pub backend: ProverBackendKind,
    /// Freshness window stamped on generated proofs.
    pub validity_days: i64,
    /// On-chain verifier contract per proof type. Unlisted types get an
    /// empty address.
    pub verifiers: BTreeMap<ProofType, String>,
    /// Root of the read-only circuit artifact tree.
    pub circuits_dir: PathBuf,
    /// Circuit directory name per proof type.
    pub circuits: BTreeMap<ProofType, String>,
    pub prover_binary: PathBuf,
    pub timeout_secs: u64,
    /// Parent for per-call scratch directories; the system temp dir when
    /// unset.
    pub scratch_dir: Option<PathBuf>,
    pub bridge: BridgeProverConfig,
}

impl Default for ProverConfig {
    fn default() -> Self {
        Self {
            backend: ProverBackendKind::default(),
            validity_days: DEFAULT_PROOF_VALIDITY_DAYS,
            verifiers: BTreeMap::new(),
            circuits_dir: PathBuf::from("circuits"),
            circuits: ProofType::ALL
                .into_iter()
                .map(|t| (t, t.as_str().replace('-', "_")))
                .collect(),
            prover_binary: PathBuf::from("spool-prover"),
            timeout_secs: DEFAULT_PROVER_TIMEOUT_SECS,
            scratch_dir: None,
            bridge: BridgeProverConfig::default(),
        }
    }
}

impl ProverConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `SPOOL_PROVER_BACKEND` (`local` | `bridge`, default: `local`)
    /// - `SPOOL_PROOF_VALIDITY_DAYS` (default: 90)
    /// - `SPOOL_VERIFIERS` (`type=0xaddress,...`)
    /// - `SPOOL_CIRCUITS_DIR` (default: `circuits`)
    /// - `SPOOL_CIRCUITS` (`type=circuit,...`; replaces the default mapping when set)
    /// - `SPOOL_PROVER_BIN` (default: `spool-prover`)
    /// - `SPOOL_PROVER_TIMEOUT_SECS` (default: 120)
    /// - `SPOOL_PROVER_SCRATCH_DIR` (default: system temp dir)
    /// - bridge variables, see [`BridgeProverConfig::from_env`]
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            backend: env_parse("SPOOL_PROVER_BACKEND", defaults.backend)?,
            validity_days: env_parse("SPOOL_PROOF_VALIDITY_DAYS", defaults.validity_days)?,
            verifiers: proof_type_map("SPOOL_VERIFIERS")?
                .map(|pairs| pairs.into_iter().collect())
                .unwrap_or_default(),
            circuits_dir: env_opt("SPOOL_CIRCUITS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.circuits_dir),
            circuits: proof_type_map("SPOOL_CIRCUITS")?
                .map(|pairs| pairs.into_iter().collect())
                .unwrap_or(defaults.circuits),
            prover_binary: env_opt("SPOOL_PROVER_BIN")
                .map(PathBuf::from)
                .unwrap_or(defaults.prover_binary),
            timeout_secs: env_parse("SPOOL_PROVER_TIMEOUT_SECS", defaults.timeout_secs)?,
            scratch_dir: env_opt("SPOOL_PROVER_SCRATCH_DIR").map(PathBuf::from),
            bridge: BridgeProverConfig::from_env()?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_VALIDITY_DAYS).contains(&self.validity_days) {
            return Err(ConfigError::Invalid {
                var: "validity_days".into(),
                reason: format!("must be in 1..={MAX_VALIDITY_DAYS}, got {}", self.validity_days),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "timeout_secs".into(),
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validity(&self) -> chrono::Duration {
        chrono::Duration::days(self.validity_days)
    }

    /// Verifier address for `proof_type`, empty when unconfigured.
    pub fn verifier_for(&self, proof_type: ProofType) -> &str {
        self.verifiers.get(&proof_type).map(String::as_str).unwrap_or("")
    }
}

/// `type=value` pairs from `var`, keyed by parsed [`ProofType`].
fn proof_type_map(var: &str) -> Result<Option<Vec<(ProofType, String)>>, ConfigError> {
    let Some(raw) = env_opt(var) else {
        return Ok(None);
    };
    split_pairs(var, &raw)?
        .into_iter()
        .map(|(k, v)| {
            k.parse::<ProofType>()
                .map(|t| (t, v))
                .map_err(|reason| ConfigError::Invalid {
                    var: var.to_string(),
                    reason,
                })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}
