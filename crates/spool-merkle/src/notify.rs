//! Root-updated notifications.
//!
//! Every provider owns a [`RootNotifier`]. `sync` publishes the fresh root;
//! observers (indexers, websocket fan-out) hold a `broadcast::Receiver`.
//! A slow receiver lags and skips; it never blocks the provider.

use spool_core::MerkleRoot;
use tokio::sync::broadcast;

#[derive(Debug, Clone)]
pub struct RootNotifier {
    tx: broadcast::Sender<MerkleRoot>,
}

impl RootNotifier {
    /// `capacity` is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MerkleRoot> {
        self.tx.subscribe()
    }

    /// Publish `root`, returning how many subscribers received it.
    /// Having none is not an error.
    pub fn publish(&self, root: &MerkleRoot) -> usize {
        match self.tx.send(root.clone()) {
            Ok(n) => {
                tracing::debug!(network = %root.network, subscribers = n, "root update published");
                n
            }
            Err(_) => 0,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
