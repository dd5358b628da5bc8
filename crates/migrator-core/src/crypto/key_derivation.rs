//! Password-based key derivation using Argon2id

use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use rand::RngCore;

use super::secure_memory::MASTER_KEY_LEN;
use super::MasterKey;
use crate::error::{MigratorError, Result};

/// Salt length in bytes
pub const SALT_LEN: usize = 16;

/// Parameters for Argon2id key derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDerivationParams {
    /// Memory cost in KiB (default: 65536 = 64MB)
    pub memory_cost: u32,
    /// Time cost / iterations (default: 1)
    pub time_cost: u32,
    /// Parallelism (default: 4)
    pub parallelism: u32,
}

impl Default for KeyDerivationParams {
    fn default() -> Self {
        Self {
            memory_cost: 65536, // 64 MB
            time_cost: 1,
            parallelism: 4,
        }
    }
}

/// Generate a cryptographically secure random salt
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive a 256-bit master key from a password using Argon2id
///
/// # Arguments
/// * `password` - The user's master password
/// * `salt` - Raw salt bytes (use `generate_salt()` to create one)
/// * `params` - Cost parameters; must match across every open of the same vault
///
/// # Returns
/// A 32-byte master key suitable for AES-256 encryption
pub fn derive_key(password: &str, salt: &[u8], params: KeyDerivationParams) -> Result<MasterKey> {
    let argon2_params = Params::new(
        params.memory_cost,
        params.time_cost,
        params.parallelism,
        Some(MASTER_KEY_LEN),
    )
    .map_err(|e| MigratorError::KeyDerivationError(e.to_string()))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key = MasterKey::zeroed();
    argon2
        .hash_password_into(password.as_bytes(), salt, key.as_mut_bytes())
        .map_err(|e| MigratorError::KeyDerivationError(e.to_string()))?;

    Ok(key)
}
