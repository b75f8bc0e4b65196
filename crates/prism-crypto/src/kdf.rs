//! Counter-based subkey derivation and password-based keys.

use argon2::Argon2;
use hkdf::Hkdf;
use sha2::Sha256;

use crate::{
    error::CryptoError,
    keys::{KEY_SIZE, SymmetricKey},
};

/// Label used for ratchet subkey derivation
const SUBKEY_LABEL: &[u8] = b"prismSubkeyV1";

/// Size of the application context tag (8 bytes)
pub const CONTEXT_SIZE: usize = 8;

/// Size of the random salt for password-based keys (16 bytes)
pub const PASSWORD_SALT_SIZE: usize = 16;

/// Derive a one-shot subkey from a base key and a counter.
///
/// This is the forward ratchet step: every message counter maps to its own
/// key, and the base key cannot be recovered from any subkey.
///
/// # Security
///
/// - Deterministic: same `(base, counter, context)` always yields the same key
/// - Different counters produce unrelated keys (HKDF-Expand is a PRF)
/// - Different contexts separate applications sharing a base key
pub fn derive_subkey(
    base_key: &SymmetricKey,
    counter: u64,
    context: &[u8; CONTEXT_SIZE],
) -> SymmetricKey {
    let hkdf = Hkdf::<Sha256>::new(None, base_key.as_bytes());

    // Capacity: 13 (label) + 8 (context) + 8 (counter) = 29
    let mut info = Vec::with_capacity(SUBKEY_LABEL.len() + CONTEXT_SIZE + 8);
    info.extend_from_slice(SUBKEY_LABEL);
    info.extend_from_slice(context);
    info.extend_from_slice(&counter.to_be_bytes());

    let mut subkey = [0u8; KEY_SIZE];
    let Ok(()) = hkdf.expand(&info, &mut subkey) else {
        unreachable!("32 bytes is a valid HKDF-SHA256 output length");
    };

    SymmetricKey::from_bytes(subkey)
}

/// Derive a symmetric key from a password with Argon2id.
///
/// # Errors
///
/// - `CryptoError::PasswordHash` if Argon2 rejects the inputs
pub fn derive_password_key(
    password: &[u8],
    salt: &[u8; PASSWORD_SALT_SIZE],
) -> Result<SymmetricKey, CryptoError> {
    let mut key = [0u8; KEY_SIZE];
    Argon2::default()
        .hash_password_into(password, salt, &mut key)
        .map_err(|err| CryptoError::PasswordHash { reason: err.to_string() })?;
    Ok(SymmetricKey::from_bytes(key))
}
