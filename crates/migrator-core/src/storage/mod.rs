//! Local encrypted storage for credential material
//!
//! The vault keeps every secret in one AES-256-GCM sealed JSON file keyed
//! by the master password.

mod file;
mod traits;
mod vault;

pub(crate) use file::{create_private_dir, write_private_file};
#[cfg(test)]
pub(crate) use file::temp_path;
pub use traits::SecretStore;
pub use vault::{Vault, DATA_FILE, SALT_FILE};
