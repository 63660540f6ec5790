// SPDX-License-Identifier: Apache-2.0

//! Connection registry
//!
//! Centralized management of all open schema connections.
//! This is the SINGLE SOURCE OF TRUTH for live adapter state; nothing else
//! holds pools.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::time::{timeout, Duration};
use tracing::instrument;

use crate::adapter::{open_adapter, SchemaAdapter};
use crate::error::{MetaError, MetaResult};
use crate::model::{ConnectionId, ConnectionSettings};

/// Tracks the open adapter for each connection id.
///
/// Opening is explicit: nothing connects lazily, and a closed connection
/// stays closed until `open` is called again.
pub struct ConnectionRegistry {
    adapters: RwLock<HashMap<ConnectionId, Arc<dyn SchemaAdapter>>>,
}

impl ConnectionRegistry {
    const CONNECT_TIMEOUT_MS: u64 = 15000;

    pub fn new() -> Self {
        Self {
            adapters: RwLock::new(HashMap::new()),
        }
    }

    /// Connects to the database described by `settings` and registers the
    /// adapter under the settings' id. Opening an already-open connection is
    /// a no-op.
    #[instrument(skip(self, settings), fields(connection = %settings.id, kind = settings.kind.as_str()))]
    pub async fn open(&self, settings: &ConnectionSettings) -> MetaResult<()> {
        {
            let adapters = self.adapters.read().await;
            if adapters.contains_key(&settings.id) {
                return Ok(());
            }
        }

        let adapter = match timeout(
            Duration::from_millis(Self::CONNECT_TIMEOUT_MS),
            open_adapter(settings),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(MetaError::connection_failed(format!(
                    "connection attempt timed out after {}ms",
                    Self::CONNECT_TIMEOUT_MS
                )))
            }
        };

        let mut adapters = self.adapters.write().await;
        // A concurrent open may have won the race; keep the first adapter
        // and discard ours.
        if adapters.contains_key(&settings.id) {
            drop(adapters);
            adapter.close().await;
            return Ok(());
        }
        adapters.insert(settings.id, adapter);
        Ok(())
    }

    /// Closes and deregisters one connection.
    #[instrument(skip(self), fields(connection = %id))]
    pub async fn close(&self, id: ConnectionId) -> MetaResult<()> {
        let adapter = {
            let mut adapters = self.adapters.write().await;
            adapters
                .remove(&id)
                .ok_or_else(|| MetaError::connection_not_found(id.to_string()))?
        };
        adapter.close().await;
        Ok(())
    }

    /// Closes every open connection. Used on shutdown.
    pub async fn close_all(&self) {
        let drained: Vec<Arc<dyn SchemaAdapter>> = {
            let mut adapters = self.adapters.write().await;
            adapters.drain().map(|(_, adapter)| adapter).collect()
        };
        for adapter in drained {
            adapter.close().await;
        }
    }

    pub async fn get(&self, id: ConnectionId) -> MetaResult<Arc<dyn SchemaAdapter>> {
        let adapters = self.adapters.read().await;
        adapters
            .get(&id)
            .cloned()
            .ok_or_else(|| MetaError::connection_not_found(id.to_string()))
    }

    pub async fn is_open(&self, id: ConnectionId) -> bool {
        self.adapters.read().await.contains_key(&id)
    }

    /// Connects and immediately disconnects, without registering anything.
    #[instrument(skip(self, settings), fields(kind = settings.kind.as_str()))]
    pub async fn test_connection(&self, settings: &ConnectionSettings) -> MetaResult<()> {
        let adapter = match timeout(
            Duration::from_millis(Self::CONNECT_TIMEOUT_MS),
            open_adapter(settings),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(MetaError::connection_failed(format!(
                    "connection attempt timed out after {}ms",
                    Self::CONNECT_TIMEOUT_MS
                )))
            }
        };
        adapter.close().await;
        Ok(())
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
