//! Storage trait definitions

use crate::error::Result;
use async_trait::async_trait;

/// String-to-string secret storage
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Get the value for a key, `KeyNotFound` if absent
    async fn get(&self, key: &str) -> Result<String>;

    /// Check if a key exists
    async fn has(&self, key: &str) -> bool;

    /// All keys, in no particular order
    async fn list(&self) -> Vec<String>;

    /// Store a value and persist before returning
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Store several values
    ///
    /// Implementations that persist as a whole should write all of them at
    /// once, so either every pair is stored or none is.
    async fn set_many(&self, pairs: &[(&str, &str)]) -> Result<()> {
        for (key, value) in pairs {
            self.set(key, value).await?;
        }
        Ok(())
    }

    /// Remove a key and persist, `KeyNotFound` if absent
    async fn delete(&self, key: &str) -> Result<()>;

    /// Remove everything and persist
    async fn clear(&self) -> Result<()>;
}
