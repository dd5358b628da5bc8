//! Cryptographic primitives
//!
//! This module provides:
//! - The Fernet-compatible token codec used for connection secrets and interchange files
//! - AES-256-GCM sealing for the local vault
//! - Argon2id key derivation from the master password
//! - Secure memory handling with zeroize

mod domain_key;
mod encryption;
mod key_derivation;
mod secure_memory;
mod token;

pub use domain_key::{generate_key, validate_key, DomainKey, DOMAIN_KEY_LEN};
pub use encryption::{open, seal, EncryptedData, NONCE_LEN};
pub use key_derivation::{derive_key, generate_salt, KeyDerivationParams, SALT_LEN};
pub use secure_memory::{MasterKey, MASTER_KEY_LEN};
pub use token::{
    decrypt, decrypt_string, decrypt_with_ttl, encrypt, encrypt_string, token_timestamp,
    MIN_TOKEN_LEN, TOKEN_VERSION,
};
