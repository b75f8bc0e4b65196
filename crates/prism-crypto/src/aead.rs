//! Authenticated encryption using `XChaCha20-Poly1305`
//!
//! Functions are pure; the nonce is supplied by the caller. The provider
//! draws a random nonce from its environment when the caller has none.

use chacha20poly1305::{
    XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit, Payload},
};

use crate::{error::CryptoError, keys::SymmetricKey};

/// Size of the `XChaCha20` nonce (24 bytes)
pub const AEAD_NONCE_SIZE: usize = 24;

/// Poly1305 tag size (16 bytes)
pub const AEAD_TAG_SIZE: usize = 16;

/// Encrypt `plaintext` under `key`, binding `associated_data`.
///
/// Returns the ciphertext including the 16-byte Poly1305 tag.
///
/// # Security
///
/// - The caller MUST NOT reuse a nonce with the same key. Random 24-byte
///   nonces make collisions negligible.
pub fn encrypt(
    plaintext: &[u8],
    key: &SymmetricKey,
    associated_data: &[u8],
    nonce: &[u8; AEAD_NONCE_SIZE],
) -> Vec<u8> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());

    let Ok(ciphertext) = cipher
        .encrypt(XNonce::from_slice(nonce), Payload { msg: plaintext, aad: associated_data })
    else {
        unreachable!("XChaCha20-Poly1305 encryption cannot fail with valid inputs");
    };

    ciphertext
}

/// Decrypt and authenticate `ciphertext`.
///
/// # Errors
///
/// - `CryptoError::InvalidKeyLength` if `nonce` is not 24 bytes
/// - `CryptoError::Authentication` if the tag does not verify (wrong key,
///   wrong associated data, or tampering)
pub fn decrypt(
    ciphertext: &[u8],
    key: &SymmetricKey,
    nonce: &[u8],
    associated_data: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    if nonce.len() != AEAD_NONCE_SIZE {
        return Err(CryptoError::InvalidKeyLength {
            expected: AEAD_NONCE_SIZE,
            actual: nonce.len(),
        });
    }

    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    cipher
        .decrypt(XNonce::from_slice(nonce), Payload { msg: ciphertext, aad: associated_data })
        .map_err(|_| CryptoError::Authentication)
}
