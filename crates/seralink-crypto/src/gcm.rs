//! AES-128-GCM sealing and opening.
//!
//! The secured channel's one AEAD construction: AES-128-GCM with a 16-byte
//! IV and a 16-byte authentication tag appended to the ciphertext. No
//! associated data is used.
//!
//! # Envelope layout
//!
//! ```text
//! [Ciphertext: plaintext length] || [Tag: 16 bytes]
//! ```

extern crate alloc;
use alloc::vec::Vec;

use aes::Aes128;
use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{AesGcm, Nonce};

use crate::CryptoError;

/// Key size in bytes (AES-128).
pub const KEY_SIZE: usize = 16;

/// IV size in bytes.
pub const IV_SIZE: usize = 16;

/// Authentication tag size in bytes.
pub const TAG_SIZE: usize = 16;

/// AES block size in bytes; the per-message AEAD overhead equals one block.
pub const BLOCK_SIZE: usize = 16;

type Aes128Gcm16 = AesGcm<Aes128, U16>;

/// Encrypt `plaintext`, returning `ciphertext || tag`.
///
/// GCM runs in counter mode, so the ciphertext has exactly the plaintext's
/// length; the envelope is `plaintext.len() + TAG_SIZE` bytes.
#[must_use]
pub fn gcm_seal(key: &[u8; KEY_SIZE], iv: &[u8; IV_SIZE], plaintext: &[u8]) -> Vec<u8> {
    let cipher = Aes128Gcm16::new(key.into());
    // Only fails for plaintexts beyond the GCM length bound (~64 GiB),
    // far past any message this stack can carry.
    cipher
        .encrypt(Nonce::<U16>::from_slice(iv), plaintext)
        .expect("plaintext within AES-GCM length limit")
}

/// Decrypt and authenticate `ciphertext || tag`, returning the plaintext.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidLength`] if `data` is shorter than one
/// tag, and [`CryptoError::AuthenticationFailed`] if the tag does not
/// verify; callers must not distinguish why.
pub fn gcm_open(
    key: &[u8; KEY_SIZE],
    iv: &[u8; IV_SIZE],
    data: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    if data.len() < TAG_SIZE {
        return Err(CryptoError::InvalidLength {
            reason: "envelope shorter than one authentication tag",
        });
    }
    let cipher = Aes128Gcm16::new(key.into());
    cipher
        .decrypt(Nonce::<U16>::from_slice(iv), data)
        .map_err(|_| CryptoError::AuthenticationFailed)
}
