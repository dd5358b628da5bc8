//! Key material that is wiped from memory when dropped

use zeroize::Zeroizing;

/// Length of the vault key in bytes
pub const MASTER_KEY_LEN: usize = 32;

/// AES-256 key for the vault, derived from the master password
///
/// Every copy, including clones, is zeroed on drop.
#[derive(Clone)]
pub struct MasterKey(Zeroizing<[u8; MASTER_KEY_LEN]>);

impl MasterKey {
    pub fn new(key: [u8; MASTER_KEY_LEN]) -> Self {
        Self(Zeroizing::new(key))
    }

    /// All-zero key to be filled in place by a KDF
    pub(crate) fn zeroed() -> Self {
        Self::new([0u8; MASTER_KEY_LEN])
    }

    pub fn as_bytes(&self) -> &[u8; MASTER_KEY_LEN] {
        &self.0
    }

    pub(crate) fn as_mut_bytes(&mut self) -> &mut [u8; MASTER_KEY_LEN] {
        &mut self.0
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey([REDACTED])")
    }
}
