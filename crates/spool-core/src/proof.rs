//! # Zero-Knowledge Proof Records
//!
//! [`ProofType`] is the closed set of circuits the pool knows about. Each
//! backend maps it through configuration to a concrete circuit name or bridge
//! operation; an unmapped type is a configuration error, never a fallback.
//!
//! [`ZkProof`] is the immutable record produced by a successful generation.
//! Freshness (`expires_at`) is a policy, independent of whether the proof
//! bytes are cryptographically valid.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default freshness window for generated proofs.
pub const DEFAULT_PROOF_VALIDITY_DAYS: i64 = 90;

/// Ordered name → value map used for proof inputs and metadata.
pub type ProofInputs = BTreeMap<String, serde_json::Value>;

/// Supported circuit kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProofType {
    /// Holder is not on a sanctions list.
    SanctionsClearance,
    /// Holder has passed a given KYC tier.
    KycTier,
    /// Holder is above an age threshold.
    AgeVerification,
    /// Deposit of public funds into the pool.
    Shield,
    /// Withdrawal of pool funds to a public address.
    Unshield,
    /// Private transfer inside the pool.
    Transfer,
}

impl ProofType {
    /// Every variant, in declaration order.
    pub const ALL: [ProofType; 6] = [
        ProofType::SanctionsClearance,
        ProofType::KycTier,
        ProofType::AgeVerification,
        ProofType::Shield,
        ProofType::Unshield,
        ProofType::Transfer,
    ];

    /// Stable kebab-case identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SanctionsClearance => "sanctions-clearance",
            Self::KycTier => "kyc-tier",
            Self::AgeVerification => "age-verification",
            Self::Shield => "shield",
            Self::Unshield => "unshield",
            Self::Transfer => "transfer",
        }
    }
}

impl fmt::Display for ProofType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProofType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| format!("unknown proof type: {s:?}"))
    }
}

/// A generated proof and the context needed to check it later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZkProof {
    pub proof_type: ProofType,
    /// Opaque proof bytes; base64 on the wire.
    #[serde(with = "b64_bytes")]
    pub proof: Vec<u8>,
    pub public_inputs: ProofInputs,
    /// On-chain verifier contract for this proof type (may be empty).
    pub verifier_address: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub metadata: ProofInputs,
}

impl ZkProof {
    /// True once `now` is strictly past `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// [`ZkProof::is_expired_at`] against the current wall clock.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// String-valued metadata entry, if present.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }
}

/// Serde adapter: `Vec<u8>` as standard base64.
mod b64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s.as_bytes()).map_err(serde::de::Error::custom)
    }
}
