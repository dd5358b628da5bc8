//! Environment profiles and their vault persistence

mod manager;
mod types;

pub use manager::ProfileManager;
pub use types::{Profile, ProfileSecretKeys, ProfileSummary, DEFAULT_DB_PORT, DEFAULT_DB_SSL_MODE};
