//! # Note Commitments
//!
//! A commitment is the hiding digest of a private note and the leaf value of
//! the commitment tree. Identity is by byte value: `"ABCD…"`, `"0xabcd…"`
//! and `"abcd…"` are the same commitment once normalized.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{excerpt, ValidationError};
use crate::hash::{decode_hex32, Hash32};

/// A 32-byte note commitment in canonical form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Commitment(Hash32);

impl Commitment {
    /// Parse and canonicalize a commitment.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidCommitment`] unless the input is 64
    /// hex digits with an optional `0x` prefix.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        decode_hex32(input)
            .map(|bytes| Self(Hash32::from_bytes(bytes)))
            .map_err(|reason| ValidationError::InvalidCommitment {
                input: excerpt(input),
                reason,
            })
    }

    /// Wrap an already-validated 32-byte value.
    pub const fn from_hash(hash: Hash32) -> Self {
        Self(hash)
    }

    /// The commitment as a tree node value.
    pub fn as_hash(&self) -> &Hash32 {
        &self.0
    }

    /// Canonical lowercase `0x`-prefixed hex.
    pub fn canonical(&self) -> String {
        self.0.to_prefixed_hex()
    }
}

/// Normalize a commitment string to lowercase `0x`-prefixed hex.
///
/// Idempotent: `normalize_commitment(normalize_commitment(x)?) == normalize_commitment(x)`.
pub fn normalize_commitment(input: &str) -> Result<String, ValidationError> {
    Commitment::parse(input).map(|c| c.canonical())
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Commitment({})", self.0)
    }
}

impl FromStr for Commitment {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Hash32> for Commitment {
    fn from(hash: Hash32) -> Self {
        Self(hash)
    }
}

impl From<Commitment> for Hash32 {
    fn from(c: Commitment) -> Self {
        c.0
    }
}

impl Serialize for Commitment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.canonical())
    }
}

impl<'de> Deserialize<'de> for Commitment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Commitment::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalizes_all_accepted_forms_identically() {
        let bare = "ab".repeat(32);
        let prefixed = format!("0x{bare}");
        let upper = bare.to_uppercase();
        let expected = format!("0x{bare}");
        assert_eq!(normalize_commitment(&bare).unwrap(), expected);
        assert_eq!(normalize_commitment(&prefixed).unwrap(), expected);
        assert_eq!(normalize_commitment(&upper).unwrap(), expected);
    }

    #[test]
    fn invalid_commitment_uses_commitment_variant() {
        let err = Commitment::parse("0x11").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidCommitment { .. }));
    }

    #[test]
    fn serde_round_trips_canonical_form() {
        let c = Commitment::parse(&"11".repeat(32)).unwrap();
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "11".repeat(32)));
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(bytes in proptest::array::uniform32(any::<u8>())) {
            let raw = hex::encode(bytes);
            let once = normalize_commitment(&raw).unwrap();
            let twice = normalize_commitment(&once).unwrap();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn normalization_ignores_case_and_prefix(bytes in proptest::array::uniform32(any::<u8>())) {
            let raw = hex::encode(bytes);
            let a = normalize_commitment(&raw.to_uppercase()).unwrap();
            let b = normalize_commitment(&format!("0x{raw}")).unwrap();
            let c = normalize_commitment(&raw).unwrap();
            prop_assert_eq!(&a, &b);
            prop_assert_eq!(&b, &c);
        }
    }
}
