//! Per-call scratch directory for prover input and output files.
//!
//! The directory and everything in it are removed when [`Scratch`] is
//! dropped, so early returns, timeouts and panics all clean up.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::TempDir;

use crate::error::ProverError;

#[derive(Debug)]
pub(crate) struct Scratch {
    dir: TempDir,
}

impl Scratch {
    /// Create a fresh directory under `parent`, or under the system temp
    /// dir when `parent` is `None`.
    pub(crate) fn new(parent: Option<&Path>) -> Result<Self, ProverError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("spool-prover-");
        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        }
        .map_err(|e| ProverError::io("failed to create scratch directory", e))?;
        Ok(Self { dir })
    }

    pub(crate) fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write `value` as JSON to `name` and return its path.
    pub(crate) async fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<PathBuf, ProverError> {
        self.write_bytes(name, &serde_json::to_vec(value)?).await
    }

    pub(crate) async fn write_bytes(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, ProverError> {
        let path = self.file(name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| ProverError::io(format!("failed to write {name}"), e))?;
        Ok(path)
    }

    pub(crate) async fn read_bytes(&self, name: &str) -> Result<Vec<u8>, ProverError> {
        tokio::fs::read(self.file(name))
            .await
            .map_err(|e| ProverError::io(format!("failed to read {name}"), e))
    }
}
