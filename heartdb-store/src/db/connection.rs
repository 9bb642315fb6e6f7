//! Connection lifecycle.
//!
//! The manager is an owned value created by the composition root and lent to
//! every repository. It holds at most one live handle. `connect` is
//! idempotent, and concurrent first calls are serialised so only one of them
//! actually dials the server.

use std::sync::Arc;

use heartdb_core::DatabaseConfig;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::backends::{MemoryStore, MongoStore};
use super::store::DocumentStore;
use crate::error::StoreResult;

/// Shared handle to a connected store.
pub type StoreHandle = Arc<dyn DocumentStore>;

enum Backend {
    Mongo(DatabaseConfig),
    /// A store that needs no dialing: the in-memory store or a test fake.
    Provided(StoreHandle),
}

pub struct ConnectionManager {
    backend: Backend,
    handle: Mutex<Option<StoreHandle>>,
}

impl ConnectionManager {
    /// Manager for a MongoDB deployment. Nothing is dialed until
    /// [`connect`](Self::connect).
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            backend: Backend::Mongo(config),
            handle: Mutex::new(None),
        }
    }

    /// Manager around an already-built store.
    pub fn from_store(store: StoreHandle) -> Self {
        Self {
            backend: Backend::Provided(store),
            handle: Mutex::new(None),
        }
    }

    /// Manager backed by a fresh [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(MemoryStore::new()))
    }

    /// Return the live handle, establishing it first if needed.
    ///
    /// Connection failures propagate; nothing is retried and the manager
    /// stays disconnected.
    pub async fn connect(&self) -> StoreResult<StoreHandle> {
        let mut slot = self.handle.lock().await;
        if let Some(handle) = slot.as_ref() {
            return Ok(Arc::clone(handle));
        }

        let handle: StoreHandle = match &self.backend {
            Backend::Mongo(config) => Arc::new(MongoStore::connect(config).await?),
            Backend::Provided(store) => {
                debug!(backend = store.backend_name(), "Using provided store");
                Arc::clone(store)
            }
        };

        *slot = Some(Arc::clone(&handle));
        Ok(handle)
    }

    /// Release the handle. A no-op when not connected.
    pub async fn close(&self) {
        let Some(handle) = self.handle.lock().await.take() else {
            return;
        };
        handle.shutdown().await;
        info!(backend = handle.backend_name(), "Connection closed");
    }

    /// Current handle, if connected. Never connects.
    pub async fn handle(&self) -> Option<StoreHandle> {
        self.handle.lock().await.clone()
    }

    pub async fn is_connected(&self) -> bool {
        self.handle.lock().await.is_some()
    }

    /// Human-readable target, safe to log.
    pub fn describe(&self) -> String {
        match &self.backend {
            Backend::Mongo(config) => {
                format!("{} ({})", super::backends::mongo::redact(&config.uri), config.name)
            }
            Backend::Provided(store) => store.backend_name().to_string(),
        }
    }
}
