//! AES-256-GCM authenticated encryption for whole-file blobs
//!
//! Blob format: `nonce (12) || ciphertext || auth_tag (16)`
//! - Nonce: 12 random bytes per seal, never reused
//! - Auth tag: appended by GCM, checked on open

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::RngCore;

use super::MasterKey;
use crate::error::{MigratorError, Result};

/// GCM nonce length
pub const NONCE_LEN: usize = 12;

const TAG_LEN: usize = 16;

/// Sealed data: nonce plus ciphertext with the tag appended
#[derive(Debug, Clone)]
pub struct EncryptedData {
    /// Nonce (12 bytes for GCM)
    pub nonce: [u8; NONCE_LEN],
    /// Ciphertext followed by the 16-byte tag
    pub ciphertext: Vec<u8>,
}

impl EncryptedData {
    /// Serialize as `nonce || ciphertext`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(NONCE_LEN + self.ciphertext.len());
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Parse `nonce || ciphertext`
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < NONCE_LEN + TAG_LEN {
            return Err(MigratorError::DecryptionError(format!(
                "Ciphertext too short: {} bytes",
                bytes.len()
            )));
        }

        let (nonce_bytes, ciphertext) = bytes.split_at(NONCE_LEN);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(nonce_bytes);

        Ok(Self {
            nonce,
            ciphertext: ciphertext.to_vec(),
        })
    }
}

/// Encrypt plaintext using AES-256-GCM with a fresh random nonce
pub fn seal(plaintext: &[u8], key: &MasterKey) -> Result<EncryptedData> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| MigratorError::EncryptionError(e.to_string()))?;

    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|e| MigratorError::EncryptionError(e.to_string()))?;

    Ok(EncryptedData { nonce, ciphertext })
}

/// Decrypt and authenticate; any tampering or a wrong key fails here
pub fn open(encrypted: &EncryptedData, key: &MasterKey) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| MigratorError::DecryptionError(e.to_string()))?;

    cipher
        .decrypt(Nonce::from_slice(&encrypted.nonce), encrypted.ciphertext.as_slice())
        .map_err(|e| MigratorError::DecryptionError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key(byte: u8) -> MasterKey {
        MasterKey::new([byte; 32])
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let key = test_key(1);
        let sealed = seal(b"{\"a\":\"1\"}", &key).unwrap();
        let parsed = EncryptedData::from_bytes(&sealed.to_bytes()).unwrap();

        assert_eq!(open(&parsed, &key).unwrap(), b"{\"a\":\"1\"}");
    }

    #[test]
    fn test_different_nonces() {
        let key = test_key(1);
        let a = seal(b"same plaintext", &key).unwrap();
        let b = seal(b"same plaintext", &key).unwrap();

        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_wrong_key_fails() {
        let sealed = seal(b"secret data", &test_key(1)).unwrap();
        assert!(open(&sealed, &test_key(2)).is_err());
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = test_key(1);
        let mut sealed = seal(b"secret data", &key).unwrap();
        sealed.ciphertext[0] ^= 0xFF;

        assert!(open(&sealed, &key).is_err());
    }

    #[test]
    fn test_short_blob_rejected() {
        assert!(EncryptedData::from_bytes(&[0u8; NONCE_LEN + TAG_LEN - 1]).is_err());
        assert!(EncryptedData::from_bytes(&[0u8; NONCE_LEN + TAG_LEN]).is_ok());
    }
}
