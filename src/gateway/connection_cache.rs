//! Memoized catalog connections.
//!
//! Connections are keyed by host in a bounded LRU. Concurrent callers for the
//! same host share a single connect, while a slow connect to one host never
//! holds up callers of another. Failed connects are logged and never cached.

use std::num::NonZeroUsize;
use std::sync::Arc;

use tracing::{debug, error, info};

use super::slot_cache::SlotCache;
use super::GatewayError;
use crate::biomart::{MartConnection, MartService};

pub struct ConnectionCache {
    service: Arc<dyn MartService>,
    connections: SlotCache<String, Arc<dyn MartConnection>>,
}

impl ConnectionCache {
    pub fn new(service: Arc<dyn MartService>, capacity: NonZeroUsize) -> Self {
        Self {
            service,
            connections: SlotCache::new(capacity),
        }
    }

    /// Return the cached connection for `host`, connecting on first use.
    pub async fn get_connection(
        &self,
        host: &str,
    ) -> Result<Arc<dyn MartConnection>, GatewayError> {
        let lookup = self
            .connections
            .get_or_try_init(&host.to_string(), || async {
                info!("Connecting to BioMart server at {}", host);
                self.service.connect(host).await.map_err(|e| {
                    error!("Error connecting to Biomart server: {}", e);
                    e
                })
            })
            .await?;

        if !lookup.built {
            debug!("Reusing connection to {}", lookup.value.host());
        }
        Ok(lookup.value)
    }

    /// Number of hosts currently holding a connection.
    pub async fn len(&self) -> usize {
        self.connections.len().await
    }

    #[cfg(test)]
    async fn contains(&self, host: &str) -> bool {
        self.connections.contains(&host.to_string()).await
    }
}
