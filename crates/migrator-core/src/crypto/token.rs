//! Authenticated, timestamped token codec
//!
//! Token layout before base64 (URL-safe, padded):
//! `version (1) || timestamp_be (8) || iv (16) || ciphertext (n*16) || hmac (32)`
//!
//! - ciphertext: AES-128-CBC with PKCS#7 padding, keyed by the cipher half
//!   of the [`DomainKey`]
//! - hmac: HMAC-SHA256 over everything before it, keyed by the signing half
//!
//! The layout is byte-compatible with Fernet tokens, so values written by
//! other Fernet implementations decode here and vice versa.

use std::time::Duration;

use aes::Aes128;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use super::DomainKey;
use crate::error::{MigratorError, Result};

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;
type HmacSha256 = Hmac<Sha256>;

/// Format version byte
pub const TOKEN_VERSION: u8 = 0x80;

const TIMESTAMP_LEN: usize = 8;
const IV_LEN: usize = 16;
const BLOCK_LEN: usize = 16;
const HMAC_LEN: usize = 32;
const HEADER_LEN: usize = 1 + TIMESTAMP_LEN + IV_LEN;

/// Smallest possible decoded token: header, one cipher block, tag
pub const MIN_TOKEN_LEN: usize = HEADER_LEN + BLOCK_LEN + HMAC_LEN;

/// Tokens stamped further than this into the future are rejected by TTL checks
const MAX_CLOCK_SKEW_SECS: u64 = 60;

/// Encrypt `plaintext` into a new token
pub fn encrypt(key: &DomainKey, plaintext: &[u8]) -> Result<String> {
    let mut iv = [0u8; IV_LEN];
    rand::rngs::OsRng.fill_bytes(&mut iv);
    encrypt_at(key, plaintext, now_secs(), &iv)
}

/// Encrypt a string and return the token
pub fn encrypt_string(key: &DomainKey, plaintext: &str) -> Result<String> {
    encrypt(key, plaintext.as_bytes())
}

/// Verify and decrypt a token
pub fn decrypt(key: &DomainKey, token: &str) -> Result<Vec<u8>> {
    let verified = verify(key, token)?;
    verified.open(key)
}

/// Decrypt a token whose plaintext is UTF-8
pub fn decrypt_string(key: &DomainKey, token: &str) -> Result<String> {
    let plaintext = decrypt(key, token)?;
    String::from_utf8(plaintext)
        .map_err(|e| MigratorError::DecryptionError(format!("Invalid UTF-8: {}", e)))
}

/// Decrypt a token, rejecting it when older than `ttl`
pub fn decrypt_with_ttl(key: &DomainKey, token: &str, ttl: Duration) -> Result<Vec<u8>> {
    decrypt_at(key, token, ttl, now_secs())
}

/// Creation time of a token, after its signature has been verified
pub fn token_timestamp(key: &DomainKey, token: &str) -> Result<DateTime<Utc>> {
    let verified = verify(key, token)?;
    i64::try_from(verified.timestamp)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(|| MigratorError::InvalidToken("timestamp out of range".to_string()))
}

fn encrypt_at(key: &DomainKey, plaintext: &[u8], timestamp: u64, iv: &[u8; IV_LEN]) -> Result<String> {
    let ciphertext = Aes128CbcEnc::new_from_slices(key.encryption_key(), iv)
        .map_err(|e| MigratorError::EncryptionError(e.to_string()))?
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut token = Vec::with_capacity(HEADER_LEN + ciphertext.len() + HMAC_LEN);
    token.push(TOKEN_VERSION);
    token.extend_from_slice(&timestamp.to_be_bytes());
    token.extend_from_slice(iv);
    token.extend_from_slice(&ciphertext);

    let mut mac = HmacSha256::new_from_slice(key.signing_key())
        .map_err(|e| MigratorError::EncryptionError(e.to_string()))?;
    mac.update(&token);
    token.extend_from_slice(&mac.finalize().into_bytes());

    Ok(URL_SAFE.encode(token))
}

fn decrypt_at(key: &DomainKey, token: &str, ttl: Duration, now: u64) -> Result<Vec<u8>> {
    let verified = verify(key, token)?;

    if verified.timestamp.saturating_add(ttl.as_secs()) < now {
        return Err(MigratorError::TokenExpired);
    }
    if now.saturating_add(MAX_CLOCK_SKEW_SECS) < verified.timestamp {
        return Err(MigratorError::InvalidToken(
            "timestamp is in the future".to_string(),
        ));
    }

    verified.open(key)
}

/// A token whose structure and signature have been checked
struct VerifiedToken {
    timestamp: u64,
    iv: [u8; IV_LEN],
    ciphertext: Vec<u8>,
}

impl VerifiedToken {
    fn open(&self, key: &DomainKey) -> Result<Vec<u8>> {
        if self.ciphertext.len() % BLOCK_LEN != 0 {
            return Err(MigratorError::InvalidToken(
                "ciphertext is not a whole number of blocks".to_string(),
            ));
        }

        Aes128CbcDec::new_from_slices(key.encryption_key(), &self.iv)
            .map_err(|e| MigratorError::DecryptionError(e.to_string()))?
            .decrypt_padded_vec_mut::<Pkcs7>(&self.ciphertext)
            .map_err(|_| MigratorError::InvalidToken("invalid padding".to_string()))
    }
}

/// Decode, check structure, and verify the HMAC before anything is decrypted
fn verify(key: &DomainKey, token: &str) -> Result<VerifiedToken> {
    let data = URL_SAFE
        .decode(token)
        .or_else(|_| STANDARD.decode(token))
        .map_err(|_| MigratorError::InvalidToken("not valid base64".to_string()))?;

    if data.len() < MIN_TOKEN_LEN {
        return Err(MigratorError::InvalidToken(format!(
            "too short: {} bytes",
            data.len()
        )));
    }
    if data[0] != TOKEN_VERSION {
        return Err(MigratorError::InvalidToken(format!(
            "unknown version 0x{:02x}",
            data[0]
        )));
    }

    let (signed, tag) = data.split_at(data.len() - HMAC_LEN);

    let mut mac = HmacSha256::new_from_slice(key.signing_key())
        .map_err(|e| MigratorError::DecryptionError(e.to_string()))?;
    mac.update(signed);
    mac.verify_slice(tag)
        .map_err(|_| MigratorError::InvalidToken("signature mismatch".to_string()))?;

    let mut timestamp = [0u8; TIMESTAMP_LEN];
    timestamp.copy_from_slice(&signed[1..1 + TIMESTAMP_LEN]);
    let mut iv = [0u8; IV_LEN];
    iv.copy_from_slice(&signed[1 + TIMESTAMP_LEN..HEADER_LEN]);

    Ok(VerifiedToken {
        timestamp: u64::from_be_bytes(timestamp),
        iv,
        ciphertext: signed[HEADER_LEN..].to_vec(),
    })
}

fn now_secs() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}
