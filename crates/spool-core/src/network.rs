//! # Network Identifiers
//!
//! Providers are configured for a fixed set of networks (e.g. `ethereum`,
//! `polygon`). Every public tree operation checks the requested network
//! against that set before doing any I/O.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{excerpt, ValidationError};

/// A normalized (trimmed, lowercase) network identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkId(String);

impl NetworkId {
    /// Normalize a raw network name.
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_ascii_lowercase())
    }

    /// Borrow the normalized name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The set of networks a provider answers for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupportedNetworks(BTreeSet<NetworkId>);

impl SupportedNetworks {
    /// Build from raw names. Blank entries are ignored.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            names
                .into_iter()
                .map(|n| NetworkId::new(n.as_ref()))
                .filter(|n| !n.as_str().is_empty())
                .collect(),
        )
    }

    /// True if `network` (in any case) is supported.
    pub fn contains(&self, network: &str) -> bool {
        self.0.contains(&NetworkId::new(network))
    }

    /// Return the normalized id or [`ValidationError::UnsupportedNetwork`].
    pub fn require(&self, network: &str) -> Result<NetworkId, ValidationError> {
        let id = NetworkId::new(network);
        if self.0.contains(&id) {
            Ok(id)
        } else {
            Err(ValidationError::UnsupportedNetwork {
                network: excerpt(network),
                supported: self.names(),
            })
        }
    }

    /// Sorted list of supported names.
    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|n| n.as_str().to_string()).collect()
    }

    /// Iterate the supported ids.
    pub fn iter(&self) -> impl Iterator<Item = &NetworkId> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
