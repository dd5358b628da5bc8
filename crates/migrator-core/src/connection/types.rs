//! Connection record types

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MigratorError, Result};

/// Common connection types
pub mod conn_type {
    pub const POSTGRES: &str = "postgres";
    pub const MYSQL: &str = "mysql";
    pub const MSSQL: &str = "mssql";
    pub const HTTP: &str = "http";
    pub const SSH: &str = "ssh";
    pub const SFTP: &str = "sftp";
    pub const AWS: &str = "aws";
    pub const GENERIC: &str = "generic";
}

/// One connection row in a record store
///
/// `password` and `extra` are the only fields that may hold secrets. Inside a
/// store they are usually tokens under that store's domain key; inside the
/// engine they are plaintext.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Identifier, unique within one store
    pub id: String,
    pub conn_type: String,
    pub description: Option<String>,
    pub host: Option<String>,
    /// Database name or schema
    pub schema: Option<String>,
    pub login: Option<String>,
    pub password: Option<String>,
    pub port: Option<u16>,
    /// JSON string with additional parameters
    pub extra: Option<String>,
    /// Whether `password` is stored encrypted
    #[serde(default)]
    pub is_encrypted: bool,
    /// Whether `extra` is stored encrypted
    #[serde(default)]
    pub is_extra_encrypted: bool,
}

impl Connection {
    /// Create a connection with just an id and type
    pub fn new(id: impl Into<String>, conn_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            conn_type: conn_type.into(),
            ..Default::default()
        }
    }

    /// Check required fields
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(MigratorError::StoreError(
                "connection ID is required".to_string(),
            ));
        }
        if self.conn_type.is_empty() {
            return Err(MigratorError::StoreError(format!(
                "connection type is required for {}",
                self.id
            )));
        }
        Ok(())
    }

    /// Snapshot this connection for export, stamped with the current time
    pub fn to_export_record(&self) -> ExportRecord {
        ExportRecord {
            conn_id: self.id.clone(),
            conn_type: self.conn_type.clone(),
            description: self.description.clone(),
            host: self.host.clone(),
            schema: self.schema.clone(),
            login: self.login.clone(),
            password: self.password.clone(),
            port: self.port,
            extra: self.extra.clone(),
            is_encrypted: self.is_encrypted,
            is_extra_encrypted: self.is_extra_encrypted,
            exported_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// Human-readable summary without secrets
impl std::fmt::Display for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Connection{{ID: {}, Type: {}, Host: {}, Port: {}}}",
            self.id,
            self.conn_type,
            self.host.as_deref().unwrap_or(""),
            self.port.map(|p| p.to_string()).unwrap_or_default()
        )
    }
}

/// A connection as captured for the interchange file
///
/// Secrets are plaintext here; the whole record is encrypted as one token
/// when written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    /// Carried in the interchange row, not in the encrypted payload
    #[serde(skip)]
    pub conn_id: String,
    pub conn_type: String,
    pub description: Option<String>,
    pub host: Option<String>,
    pub schema: Option<String>,
    pub login: Option<String>,
    pub password: Option<String>,
    pub port: Option<u16>,
    pub extra: Option<String>,
    /// Whether the password was encrypted in the source store
    #[serde(default)]
    pub is_encrypted: bool,
    /// Whether extra was encrypted in the source store
    #[serde(default)]
    pub is_extra_encrypted: bool,
    /// RFC 3339 capture time
    pub exported_at: String,
}

impl ExportRecord {
    /// Turn the record back into a plaintext connection
    pub fn to_connection(&self) -> Connection {
        Connection {
            id: self.conn_id.clone(),
            conn_type: self.conn_type.clone(),
            description: self.description.clone(),
            host: self.host.clone(),
            schema: self.schema.clone(),
            login: self.login.clone(),
            password: self.password.clone(),
            port: self.port,
            extra: self.extra.clone(),
            // Set again when re-encrypted for the target
            is_encrypted: false,
            is_extra_encrypted: false,
        }
    }
}
