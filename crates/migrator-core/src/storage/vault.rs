//! Password-protected key-value vault
//!
//! On-disk layout inside the storage directory:
//! - `salt`: 16 random bytes, written once on first open
//! - `credentials.enc`: `nonce || AES-256-GCM(json map)`, rewritten whole on
//!   every mutation via a temp file and rename, owner-only permissions
//!
//! The data file is only created on the first mutation. A wrong master
//! password is detected when the existing data file fails to authenticate.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use super::file::{create_private_dir, write_private_file};
use super::SecretStore;
use crate::crypto::{
    derive_key, generate_salt, open, seal, EncryptedData, KeyDerivationParams, MasterKey, SALT_LEN,
};
use crate::error::{MigratorError, Result};

/// Encrypted data file name
pub const DATA_FILE: &str = "credentials.enc";

/// Salt file name
pub const SALT_FILE: &str = "salt";

/// Encrypted key-value vault
pub struct Vault {
    /// Directory holding the salt and data files
    storage_dir: PathBuf,
    /// Key derived from the master password
    master_key: MasterKey,
    /// Decrypted mapping, mirrored to disk after every mutation
    entries: RwLock<HashMap<String, String>>,
}

impl Vault {
    /// Open (or create) the vault in `storage_dir` with default KDF costs
    pub async fn open(storage_dir: impl Into<PathBuf>, master_password: &str) -> Result<Self> {
        Self::open_with_params(storage_dir, master_password, KeyDerivationParams::default()).await
    }

    /// Open (or create) the vault with explicit KDF costs
    pub async fn open_with_params(
        storage_dir: impl Into<PathBuf>,
        master_password: &str,
        params: KeyDerivationParams,
    ) -> Result<Self> {
        let storage_dir = storage_dir.into();
        create_private_dir(&storage_dir).await?;

        let salt = load_or_create_salt(&storage_dir.join(SALT_FILE)).await?;
        let master_key = derive_key(master_password, &salt, params)?;

        let data_path = storage_dir.join(DATA_FILE);
        let entries = if tokio::fs::try_exists(&data_path).await? {
            load_entries(&data_path, &master_key).await?
        } else {
            debug!("No existing vault data file found");
            HashMap::new()
        };

        info!("Vault opened with {} entries at {:?}", entries.len(), storage_dir);

        Ok(Self {
            storage_dir,
            master_key,
            entries: RwLock::new(entries),
        })
    }

    /// Whether a vault data file already exists in `storage_dir`
    pub fn exists(storage_dir: &Path) -> bool {
        storage_dir.join(DATA_FILE).exists()
    }

    /// Get the storage directory path
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    fn data_file_path(&self) -> PathBuf {
        self.storage_dir.join(DATA_FILE)
    }

    /// Seal `entries` and atomically replace the data file
    async fn persist(&self, entries: &HashMap<String, String>) -> Result<()> {
        let plaintext = Zeroizing::new(serde_json::to_vec(entries)?);
        let sealed = seal(&plaintext, &self.master_key)?;

        write_private_file(&self.data_file_path(), &sealed.to_bytes()).await?;

        debug!("Saved {} entries to vault", entries.len());
        Ok(())
    }
}

#[async_trait]
impl SecretStore for Vault {
    async fn get(&self, key: &str) -> Result<String> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .cloned()
            .ok_or_else(|| MigratorError::KeyNotFound(key.to_string()))
    }

    async fn has(&self, key: &str) -> bool {
        self.entries.read().await.contains_key(key)
    }

    async fn list(&self) -> Vec<String> {
        self.entries.read().await.keys().cloned().collect()
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().await;

        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.persist(&next).await?;
        *entries = next;

        debug!("Stored key: {}", key);
        Ok(())
    }

    async fn set_many(&self, pairs: &[(&str, &str)]) -> Result<()> {
        let mut entries = self.entries.write().await;

        let mut next = entries.clone();
        for (key, value) in pairs {
            next.insert(key.to_string(), value.to_string());
        }
        self.persist(&next).await?;
        *entries = next;

        debug!("Stored {} keys", pairs.len());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().await;

        if !entries.contains_key(key) {
            return Err(MigratorError::KeyNotFound(key.to_string()));
        }

        let mut next = entries.clone();
        next.remove(key);
        self.persist(&next).await?;
        *entries = next;

        debug!("Deleted key: {}", key);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut entries = self.entries.write().await;

        let next = HashMap::new();
        self.persist(&next).await?;
        *entries = next;

        debug!("Cleared all entries");
        Ok(())
    }
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("storage_dir", &self.storage_dir)
            .finish_non_exhaustive()
    }
}

async fn load_or_create_salt(path: &Path) -> Result<[u8; SALT_LEN]> {
    if tokio::fs::try_exists(path).await? {
        let bytes = tokio::fs::read(path).await?;
        return <[u8; SALT_LEN]>::try_from(bytes.as_slice()).map_err(|_| {
            MigratorError::StorageError(format!(
                "Salt file {:?} is corrupt: expected {} bytes, found {}",
                path,
                SALT_LEN,
                bytes.len()
            ))
        });
    }

    let salt = generate_salt();
    write_private_file(path, &salt).await?;
    debug!("Created new salt at {:?}", path);
    Ok(salt)
}

async fn load_entries(path: &Path, key: &MasterKey) -> Result<HashMap<String, String>> {
    let contents = tokio::fs::read(path).await?;
    let encrypted = EncryptedData::from_bytes(&contents).map_err(|_| {
        MigratorError::StorageError(format!("Vault data file {:?} is truncated", path))
    })?;

    let plaintext = match open(&encrypted, key) {
        Ok(plaintext) => Zeroizing::new(plaintext),
        Err(_) => {
            warn!("Vault data file failed authentication");
            return Err(MigratorError::InvalidPassword);
        }
    };

    let entries: HashMap<String, String> = serde_json::from_slice(&plaintext)?;
    debug!("Loaded {} entries from vault", entries.len());
    Ok(entries)
}
