//! Profile persistence on top of the vault

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::types::{Profile, ProfileSecretKeys, ProfileSummary};
use crate::error::{MigratorError, Result};
use crate::storage::SecretStore;

/// Storage key prefix for profiles
const PROFILE_PREFIX: &str = "profile:";

/// Suffix of the metadata entry
const META_SUFFIX: &str = ":meta";

/// Profile manager
pub struct ProfileManager {
    /// Storage backend
    storage: Arc<dyn SecretStore>,
}

impl ProfileManager {
    /// Create a new profile manager
    pub fn new(storage: Arc<dyn SecretStore>) -> Self {
        Self { storage }
    }

    /// Save a profile's metadata, password, and domain key
    pub async fn save(&self, profile: &Profile) -> Result<()> {
        if profile.id.is_empty() {
            return Err(MigratorError::InvalidProfile(
                "profile ID is required".to_string(),
            ));
        }

        let keys = profile.secret_keys();
        let meta = serde_json::to_string(profile)?;

        self.storage
            .set_many(&[
                (keys.meta.as_str(), meta.as_str()),
                (keys.password.as_str(), profile.db_password.as_str()),
                (keys.domain_key.as_str(), profile.domain_key.as_str()),
            ])
            .await?;

        info!("Saved profile: {} ({})", profile.name, profile.id);
        Ok(())
    }

    /// Load a full profile including its secrets
    pub async fn load(&self, id: &str) -> Result<Profile> {
        let keys = ProfileSecretKeys::for_id(id);

        let meta = match self.storage.get(&keys.meta).await {
            Ok(meta) => meta,
            Err(MigratorError::KeyNotFound(_)) => {
                return Err(MigratorError::ProfileNotFound(id.to_string()))
            }
            Err(e) => return Err(e),
        };

        let mut profile: Profile = serde_json::from_str(&meta)?;
        profile.db_password = self.optional(&keys.password).await?;
        profile.domain_key = self.optional(&keys.domain_key).await?;

        debug!("Loaded profile: {}", id);
        Ok(profile)
    }

    /// List all profiles, sorted by name
    pub async fn list(&self) -> Result<Vec<ProfileSummary>> {
        let mut summaries = Vec::new();

        for key in self.storage.list().await {
            if !(key.starts_with(PROFILE_PREFIX) && key.ends_with(META_SUFFIX)) {
                continue;
            }

            let meta = match self.storage.get(&key).await {
                Ok(meta) => meta,
                // Removed between list and get
                Err(MigratorError::KeyNotFound(_)) => continue,
                Err(e) => return Err(e),
            };

            match serde_json::from_str::<Profile>(&meta) {
                Ok(profile) => summaries.push(profile.summary()),
                Err(e) => warn!("Skipping unreadable profile entry {}: {}", key, e),
            }
        }

        summaries.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(summaries)
    }

    /// Delete a profile and all of its entries
    pub async fn delete(&self, id: &str) -> Result<()> {
        let keys = ProfileSecretKeys::for_id(id);

        if !self.storage.has(&keys.meta).await {
            return Err(MigratorError::ProfileNotFound(id.to_string()));
        }

        for key in [&keys.password, &keys.domain_key, &keys.meta] {
            match self.storage.delete(key).await {
                Ok(()) | Err(MigratorError::KeyNotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }

        info!("Deleted profile: {}", id);
        Ok(())
    }

    async fn optional(&self, key: &str) -> Result<String> {
        match self.storage.get(key).await {
            Ok(value) => Ok(value),
            Err(MigratorError::KeyNotFound(_)) => Ok(String::new()),
            Err(e) => Err(e),
        }
    }
}
