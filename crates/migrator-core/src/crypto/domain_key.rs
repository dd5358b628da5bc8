//! 256-bit per-environment keys used by the token codec
//!
//! A key is 32 raw bytes: the first half signs, the second half encrypts.
//! Externally it travels as URL-safe base64 with padding; standard base64 is
//! also accepted on input.

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{MigratorError, Result};

/// Raw key length in bytes
pub const DOMAIN_KEY_LEN: usize = 32;

/// Symmetric key scoped to one environment (or to one interchange file)
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DomainKey {
    key: [u8; DOMAIN_KEY_LEN],
}

impl DomainKey {
    /// Generate a fresh key from the OS random source
    pub fn generate() -> Self {
        let mut key = [0u8; DOMAIN_KEY_LEN];
        rand::rngs::OsRng.fill_bytes(&mut key);
        Self { key }
    }

    /// Build a key from raw bytes
    pub fn from_bytes(key: [u8; DOMAIN_KEY_LEN]) -> Self {
        Self { key }
    }

    /// Parse the external base64 form (URL-safe first, then standard)
    pub fn parse(encoded: &str) -> Result<Self> {
        let mut decoded = URL_SAFE
            .decode(encoded)
            .or_else(|_| STANDARD.decode(encoded))
            .map_err(|_| {
                MigratorError::InvalidKey("must be 32 bytes base64-encoded".to_string())
            })?;

        let parsed = <[u8; DOMAIN_KEY_LEN]>::try_from(decoded.as_slice());
        decoded.zeroize();

        parsed.map(Self::from_bytes).map_err(|_| {
            MigratorError::InvalidKey("must be 32 bytes base64-encoded".to_string())
        })
    }

    /// URL-safe base64 with padding (44 characters)
    pub fn to_base64(&self) -> String {
        URL_SAFE.encode(self.key)
    }

    pub(crate) fn signing_key(&self) -> &[u8] {
        &self.key[..16]
    }

    pub(crate) fn encryption_key(&self) -> &[u8] {
        &self.key[16..]
    }
}

impl Clone for DomainKey {
    fn clone(&self) -> Self {
        Self { key: self.key }
    }
}

impl PartialEq for DomainKey {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for DomainKey {}

impl std::fmt::Debug for DomainKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Generate a new key in its external representation
pub fn generate_key() -> String {
    DomainKey::generate().to_base64()
}

/// True iff `encoded` decodes (either base64 alphabet) to exactly 32 bytes
pub fn validate_key(encoded: &str) -> bool {
    DomainKey::parse(encoded).is_ok()
}
