//! Environment profile types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::crypto::DomainKey;
use crate::error::{MigratorError, Result};

/// Default database port
pub const DEFAULT_DB_PORT: u16 = 5432;

/// Default SSL mode
pub const DEFAULT_DB_SSL_MODE: &str = "disable";

/// Connection coordinates and keys for one environment
///
/// Serializing a profile yields its non-secret metadata only; the database
/// password and domain key are kept in their own vault entries.
#[derive(Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    /// Human-readable name (e.g., "Dev Environment")
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    pub db_host: String,
    pub db_port: u16,
    pub db_name: String,
    pub db_user: String,
    #[serde(skip)]
    pub db_password: String,
    /// disable, require, verify-ca, verify-full
    pub db_ssl_mode: String,

    /// Base64 domain key for this environment's encrypted fields
    #[serde(skip)]
    pub domain_key: String,

    /// Prefix applied to connection ids when importing into this environment
    #[serde(default)]
    pub connection_prefix: String,
}

impl Profile {
    /// Create a new profile with a random id and default settings
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            created_at: now,
            updated_at: now,
            db_host: String::new(),
            db_port: DEFAULT_DB_PORT,
            db_name: String::new(),
            db_user: String::new(),
            db_password: String::new(),
            db_ssl_mode: DEFAULT_DB_SSL_MODE.to_string(),
            domain_key: String::new(),
            connection_prefix: String::new(),
        }
    }

    /// Check that the profile is usable for migration
    pub fn validate(&self) -> Result<()> {
        if self.db_host.is_empty() {
            return Err(MigratorError::InvalidProfile(
                "database host is required".to_string(),
            ));
        }
        if self.db_port == 0 {
            return Err(MigratorError::InvalidProfile(
                "invalid database port: 0".to_string(),
            ));
        }
        if self.db_name.is_empty() {
            return Err(MigratorError::InvalidProfile(
                "database name is required".to_string(),
            ));
        }
        if self.db_user.is_empty() {
            return Err(MigratorError::InvalidProfile(
                "database user is required".to_string(),
            ));
        }
        if self.domain_key.is_empty() {
            return Err(MigratorError::InvalidProfile(
                "domain key is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse this profile's domain key
    pub fn parse_domain_key(&self) -> Result<DomainKey> {
        DomainKey::parse(&self.domain_key)
            .map_err(|e| e.key_context(&format!("domain key of profile {}", self.name)))
    }

    /// PostgreSQL URL for drivers
    pub fn dsn(&self) -> Result<String> {
        let ssl_mode = if self.db_ssl_mode.is_empty() {
            DEFAULT_DB_SSL_MODE
        } else {
            &self.db_ssl_mode
        };

        let mut url = Url::parse(&format!(
            "postgres://{}:{}/",
            self.db_host, self.db_port
        ))
        .map_err(|e| MigratorError::InvalidProfile(format!("invalid host: {}", e)))?;

        url.set_path(&self.db_name);
        url.query_pairs_mut().append_pair("sslmode", ssl_mode);

        let credentials_ok = url.set_username(&self.db_user).is_ok()
            && (self.db_password.is_empty() || url.set_password(Some(&self.db_password)).is_ok());
        if !credentials_ok {
            return Err(MigratorError::InvalidProfile(
                "cannot build connection URL".to_string(),
            ));
        }

        Ok(url.into())
    }

    /// Update the modification time
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Vault keys holding this profile's data
    pub fn secret_keys(&self) -> ProfileSecretKeys {
        ProfileSecretKeys::for_id(&self.id)
    }

    /// Lightweight view safe for display and logging
    pub fn summary(&self) -> ProfileSummary {
        ProfileSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            db_host: self.db_host.clone(),
            db_port: self.db_port,
            db_name: self.db_name.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl std::fmt::Debug for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profile")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("db_host", &self.db_host)
            .field("db_port", &self.db_port)
            .field("db_name", &self.db_name)
            .field("db_user", &self.db_user)
            .field("db_password", &"[REDACTED]")
            .field("db_ssl_mode", &self.db_ssl_mode)
            .field("domain_key", &"[REDACTED]")
            .field("connection_prefix", &self.connection_prefix)
            .finish()
    }
}

/// Vault keys for one profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSecretKeys {
    /// Non-secret metadata as JSON
    pub meta: String,
    pub password: String,
    pub domain_key: String,
}

impl ProfileSecretKeys {
    pub fn for_id(id: &str) -> Self {
        Self {
            meta: format!("profile:{}:meta", id),
            password: format!("profile:{}:password", id),
            domain_key: format!("profile:{}:domain_key", id),
        }
    }
}

/// Profile fields without secrets, for listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub id: String,
    pub name: String,
    pub db_host: String,
    pub db_port: u16,
    pub db_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
