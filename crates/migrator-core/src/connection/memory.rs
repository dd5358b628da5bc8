//! In-process record store

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::{Connection, RecordStore, StoreConnector};
use crate::error::{MigratorError, Result};
use crate::profile::Profile;

/// Record store held in memory, ordered by connection id
///
/// Clones share the same rows.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    rows: Arc<RwLock<BTreeMap<String, Connection>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with `connections`
    pub fn with_connections(connections: impl IntoIterator<Item = Connection>) -> Self {
        let rows = connections
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();
        Self {
            rows: Arc::new(RwLock::new(rows)),
        }
    }

    /// Get a connection by id
    pub async fn get(&self, id: &str) -> Option<Connection> {
        self.rows.read().await.get(id).cloned()
    }

    /// Number of stored connections
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Whether the store has no connections
    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list_connections(&self) -> Result<Vec<Connection>> {
        Ok(self.rows.read().await.values().cloned().collect())
    }

    async fn get_existing_connection_ids(&self, ids: &[String]) -> Result<Vec<String>> {
        let rows = self.rows.read().await;
        Ok(ids.iter().filter(|id| rows.contains_key(*id)).cloned().collect())
    }

    async fn insert_connection(&self, connection: &Connection) -> Result<()> {
        connection.validate()?;

        let mut rows = self.rows.write().await;
        if rows.contains_key(&connection.id) {
            return Err(MigratorError::StoreError(format!(
                "duplicate connection id: {}",
                connection.id
            )));
        }
        rows.insert(connection.id.clone(), connection.clone());

        debug!("Inserted connection: {}", connection.id);
        Ok(())
    }

    async fn update_connection(&self, connection: &Connection) -> Result<()> {
        connection.validate()?;

        let mut rows = self.rows.write().await;
        match rows.get_mut(&connection.id) {
            Some(row) => {
                *row = connection.clone();
                debug!("Updated connection: {}", connection.id);
                Ok(())
            }
            None => Err(MigratorError::StoreError(format!(
                "connection not found: {}",
                connection.id
            ))),
        }
    }

    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }
}

/// Connector handing out [`MemoryStore`]s registered per profile id
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    stores: HashMap<String, MemoryStore>,
}

impl MemoryConnector {
    /// Create a connector with no stores
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `store` for the profile with `profile_id`
    pub fn with_store(mut self, profile_id: impl Into<String>, store: MemoryStore) -> Self {
        self.stores.insert(profile_id.into(), store);
        self
    }
}

#[async_trait]
impl StoreConnector for MemoryConnector {
    async fn connect(&self, profile: &Profile) -> Result<Box<dyn RecordStore>> {
        self.stores
            .get(&profile.id)
            .cloned()
            .map(|store| Box::new(store) as Box<dyn RecordStore>)
            .ok_or_else(|| {
                MigratorError::StoreError(format!(
                    "failed to connect to {}:{}/{}",
                    profile.db_host, profile.db_port, profile.db_name
                ))
            })
    }
}
