//! Record store abstraction consumed by the migration engine
//!
//! The engine never sees SQL or drivers. A [`StoreConnector`] opens a
//! [`RecordStore`] for a profile; the store exposes the handful of row
//! operations export and import need. Futures are cancelled by dropping
//! them, so callers bound latency with `tokio::time::timeout` around a whole
//! engine call.

use async_trait::async_trait;

use super::Connection;
use crate::error::Result;
use crate::profile::Profile;

/// Row access for one environment's connection table
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All connections, in the store's natural order
    async fn list_connections(&self) -> Result<Vec<Connection>>;

    /// The subset of `ids` that already exist
    async fn get_existing_connection_ids(&self, ids: &[String]) -> Result<Vec<String>>;

    /// Insert a new connection
    async fn insert_connection(&self, connection: &Connection) -> Result<()>;

    /// Replace an existing connection
    async fn update_connection(&self, connection: &Connection) -> Result<()>;

    /// Check connectivity
    async fn test_connection(&self) -> Result<()>;
}

/// Opens record stores from profile coordinates
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self, profile: &Profile) -> Result<Box<dyn RecordStore>>;
}
