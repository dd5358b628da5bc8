//! # migrator-core
//!
//! Moving connection records between environments that each seal their
//! secrets under their own domain key:
//! - Fernet-compatible token codec (AES-128-CBC + HMAC-SHA256)
//! - Password-protected vault (Argon2id + AES-256-GCM) holding profiles
//! - Export to and import from an encrypted CSV interchange file with
//!   stop/skip/overwrite collision handling
//!
//! Record stores are reached through the [`StoreConnector`] trait; the
//! in-memory [`MemoryConnector`] ships for tests and embedding.

pub mod connection;
pub mod crypto;
pub mod error;
pub mod migration;
pub mod profile;
pub mod settings;
pub mod storage;

pub use connection::{Connection, ExportRecord, MemoryConnector, MemoryStore, RecordStore, StoreConnector};
pub use crypto::{decrypt, decrypt_string, encrypt, encrypt_string, generate_key, validate_key, DomainKey, MasterKey};
pub use error::{MigratorError, Result};
pub use migration::{
    CollisionStrategy, ExportRequest, ExportResult, ImportRequest, ImportResult, InterchangeEntry,
    Migrator,
};
pub use profile::{Profile, ProfileManager, ProfileSummary};
pub use settings::{Settings, SettingsManager};
pub use storage::{SecretStore, Vault};
