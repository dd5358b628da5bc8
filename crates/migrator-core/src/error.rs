//! Error types for migrator-core

use thiserror::Error;

/// Result type alias for migrator operations
pub type Result<T> = std::result::Result<T, MigratorError>;

/// Migrator error types
#[derive(Error, Debug)]
pub enum MigratorError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid master password")]
    InvalidPassword,

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Unknown collision strategy: {0} (expected stop, skip or overwrite)")]
    InvalidStrategy(String),

    #[error("Connections already exist: {}", .0.join(", "))]
    Collision(Vec<String>),

    #[error("Record store error: {0}")]
    StoreError(String),

    #[error("Failed to write connection {id}: {message}")]
    RecordWrite { id: String, message: String },

    #[error("Invalid interchange file: {0}")]
    Interchange(String),

    #[error("Encryption failed: {0}")]
    EncryptionError(String),

    #[error("Decryption failed: {0}")]
    DecryptionError(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl MigratorError {
    /// Whether this error means a token failed its structural or integrity checks
    pub fn is_token_integrity(&self) -> bool {
        matches!(self, Self::InvalidToken(_) | Self::TokenExpired)
    }

    /// Name the key an `InvalidKey` error is about
    pub(crate) fn key_context(self, label: &str) -> Self {
        match self {
            Self::InvalidKey(msg) => Self::InvalidKey(format!("{}: {}", label, msg)),
            other => other,
        }
    }
}
