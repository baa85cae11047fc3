//! # Hash32 — Canonical 32-Byte Values
//!
//! Every node in the commitment tree (leaves, siblings, roots) is a 32-byte
//! value. The wire and configuration forms are hex strings; this module owns
//! the single parser and the single canonical renderer for them.
//!
//! ## Canonical Form
//!
//! Input: 64 hex digits, optional `0x`/`0X` prefix, any letter case,
//! surrounding whitespace ignored. Output: lowercase, `0x`-prefixed.
//!
//! ## Security Invariant
//!
//! Comparisons that decide whether a proof is accepted must use
//! [`Hash32::ct_eq`]. The derived `PartialEq` is for map keys and tests.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use subtle::ConstantTimeEq;

use crate::error::{excerpt, ValidationError};

/// A 32-byte digest, sibling, root, or commitment value.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Hash32([u8; 32]);

impl Hash32 {
    /// The all-zero value. Used to pad short sibling lists.
    pub const ZERO: Hash32 = Hash32([0u8; 32]);

    /// Wrap raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Build from a slice that must be exactly 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; 32]>::try_from(bytes).ok().map(Self)
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parse a hex string in any accepted form.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MalformedHash`] if the input is not 64 hex
    /// digits after stripping an optional prefix.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        decode_hex32(input)
            .map(Self)
            .map_err(|reason| ValidationError::MalformedHash {
                input: excerpt(input),
                reason,
            })
    }

    /// Lowercase hex without prefix (64 chars).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Canonical lowercase hex with `0x` prefix (66 chars).
    pub fn to_prefixed_hex(&self) -> String {
        format!("0x{}", self.to_hex())
    }

    /// Constant-time equality.
    pub fn ct_eq(&self, other: &Hash32) -> bool {
        self.0.ct_eq(&other.0).into()
    }

    /// True for the all-zero value.
    pub fn is_zero(&self) -> bool {
        self.ct_eq(&Self::ZERO)
    }
}

/// Decode 64 hex digits (optional prefix, any case) into 32 bytes.
///
/// Returns the rejection reason as a string so callers can wrap it in the
/// error variant that fits their context (commitment vs. generic hash).
pub(crate) fn decode_hex32(input: &str) -> Result<[u8; 32], String> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.len() != 64 {
        return Err(format!("expected 64 hex chars, got {}", digits.len()));
    }
    let mut out = [0u8; 32];
    hex::decode_to_slice(digits, &mut out).map_err(|e| format!("invalid hex: {e}"))?;
    Ok(out)
}

impl fmt::Display for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_prefixed_hex())
    }
}

impl fmt::Debug for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash32({})", self.to_prefixed_hex())
    }
}

impl FromStr for Hash32 {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<[u8; 32]> for Hash32 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash32 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Hash32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_prefixed_hex())
    }
}

impl<'de> Deserialize<'de> for Hash32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash32::parse(&s).map_err(serde::de::Error::custom)
    }
}
