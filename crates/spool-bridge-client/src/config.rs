//! Bridge client configuration.
//!
//! Override via environment variables or explicit construction for
//! staging/testing.

use serde::{Deserialize, Deserializer};
use spool_core::config::{env_opt, env_parse, env_required, ConfigError};
use url::Url;
use zeroize::Zeroizing;

/// Default request timeout for bridge calls.
pub const DEFAULT_BRIDGE_TIMEOUT_SECS: u64 = 30;

/// Configuration for connecting to the delegated bridge.
///
/// Custom `Debug` implementation redacts the `api_token` field to prevent
/// credential leakage in log output. The token is zeroed on drop.
#[derive(Clone, Deserialize)]
pub struct BridgeConfig {
    /// Root of the bridge API; endpoint paths are appended to it.
    pub base_url: Url,
    /// Bearer token for API authentication.
    #[serde(deserialize_with = "deserialize_token")]
    pub api_token: Zeroizing<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_BRIDGE_TIMEOUT_SECS
}

fn deserialize_token<'de, D: Deserializer<'de>>(d: D) -> Result<Zeroizing<String>, D::Error> {
    String::deserialize(d).map(Zeroizing::new)
}

impl std::fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl BridgeConfig {
    pub fn new(base_url: Url, api_token: impl Into<String>) -> Self {
        Self {
            base_url,
            api_token: Zeroizing::new(api_token.into()),
            timeout_secs: DEFAULT_BRIDGE_TIMEOUT_SECS,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `SPOOL_BRIDGE_URL` (default: `http://127.0.0.1:3000`)
    /// - `SPOOL_BRIDGE_TOKEN` (required)
    /// - `SPOOL_BRIDGE_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_token = Zeroizing::new(env_required("SPOOL_BRIDGE_TOKEN")?);
        let raw_url = env_opt("SPOOL_BRIDGE_URL").unwrap_or_else(|| "http://127.0.0.1:3000".into());
        let base_url = Url::parse(&raw_url).map_err(|e| ConfigError::Invalid {
            var: "SPOOL_BRIDGE_URL".into(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            base_url,
            api_token,
            timeout_secs: env_parse("SPOOL_BRIDGE_TIMEOUT_SECS", DEFAULT_BRIDGE_TIMEOUT_SECS)?,
        })
    }

    /// `base_url` without a trailing slash, ready for path concatenation.
    pub(crate) fn root(&self) -> String {
        self.base_url.as_str().trim_end_matches('/').to_string()
    }
}
