// Live viewer registry and fan-out of state snapshots.
// Invariants: each snapshot is serialized once per broadcast; a failing viewer
// never prevents delivery to the others. Viewer queues are bounded and a full
// queue drops the message instead of waiting.

use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};

use crate::utils::next_sequence;

pub type ConnectionId = u64;

#[derive(Debug, thiserror::Error)]
pub enum BroadcastError {
    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("viewer {0} is closed")]
    Closed(ConnectionId),
    #[error("viewer {0} is lagging; message dropped")]
    Lagged(ConnectionId),
}

/// Transport handle for one viewer. The socket task owns the receiving end;
/// once it is dropped the connection reports as closed.
#[derive(Clone, Debug)]
pub struct ViewerConnection {
    tx: mpsc::Sender<String>,
}

impl ViewerConnection {
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx }
    }

    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    fn send(&self, id: ConnectionId, payload: String) -> Result<(), BroadcastError> {
        self.tx.try_send(payload).map_err(|err| match err {
            TrySendError::Full(_) => BroadcastError::Lagged(id),
            TrySendError::Closed(_) => BroadcastError::Closed(id),
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Clone, Default)]
pub struct BroadcastHub {
    connections: Arc<RwLock<HashMap<ConnectionId, ViewerConnection>>>,
    sequence: Arc<AtomicU64>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, connection: ViewerConnection) -> ConnectionId {
        let id = next_sequence(self.sequence.as_ref());
        self.connections.write().await.insert(id, connection);
        debug!(connection = id, "viewer registered");
        id
    }

    /// Idempotent; returns whether the viewer was still registered.
    pub async fn unregister(&self, id: ConnectionId) -> bool {
        self.connections.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.connections.write().await.clear();
    }

    pub async fn broadcast<T: Serialize>(&self, snapshot: &T) -> Result<BroadcastReport, BroadcastError> {
        let payload = serde_json::to_string(snapshot)?;
        let connections = self.connections.read().await;
        let mut report = BroadcastReport::default();
        for (&id, connection) in connections.iter() {
            if !connection.is_open() {
                report.skipped += 1;
                continue;
            }
            match connection.send(id, payload.clone()) {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    warn!(%err, connection = id, "broadcast delivery failed");
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }

    pub async fn unicast<T: Serialize>(&self, id: ConnectionId, snapshot: &T) -> Result<(), BroadcastError> {
        let payload = serde_json::to_string(snapshot)?;
        let connections = self.connections.read().await;
        match connections.get(&id) {
            Some(connection) if connection.is_open() => connection.send(id, payload),
            _ => Err(BroadcastError::Closed(id)),
        }
    }
}
