//! Anonymous public-key sealing.
//!
//! A sealed box addressed to an X25519 public key. The sender generates a
//! fresh ephemeral keypair per message, so the ciphertext reveals nothing
//! about the sender's long-term keys.
//!
//! Wire layout: `[ephemeral_pk: 32][ciphertext + tag]`
//!
//! Key and nonce come from HKDF-SHA256 over the shared secret, salted with
//! `ephemeral_pk || recipient_pk` so a sealed box cannot be re-targeted.

use hkdf::Hkdf;
use sha2::Sha256;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

use crate::{
    aead::{self, AEAD_NONCE_SIZE, AEAD_TAG_SIZE},
    error::{CryptoError, fixed},
    keys::{KEY_SIZE, SecretKey, SymmetricKey},
};

/// Label for the sealing key
const SEAL_KEY_LABEL: &[u8] = b"prismSealKeyV1";

/// Label for the sealing nonce
const SEAL_NONCE_LABEL: &[u8] = b"prismSealNonceV1";

/// Bytes a sealed box adds on top of its plaintext
pub const SEAL_OVERHEAD: usize = KEY_SIZE + AEAD_TAG_SIZE;

/// Seal `plaintext` to `recipient_public` using the caller's ephemeral secret.
///
/// # Errors
///
/// - `CryptoError::InvalidKey` if the recipient key is a low-order point
pub fn seal(
    plaintext: &[u8],
    recipient_public: &[u8; KEY_SIZE],
    ephemeral_secret: [u8; KEY_SIZE],
) -> Result<Vec<u8>, CryptoError> {
    let ephemeral = StaticSecret::from(ephemeral_secret);
    let ephemeral_public = X25519PublicKey::from(&ephemeral).to_bytes();

    let shared = ephemeral.diffie_hellman(&X25519PublicKey::from(*recipient_public));
    if !shared.was_contributory() {
        return Err(CryptoError::InvalidKey { reason: "recipient key is a low-order point" });
    }

    let (key, nonce) = seal_key_nonce(shared.as_bytes(), &ephemeral_public, recipient_public);

    let mut sealed = Vec::with_capacity(SEAL_OVERHEAD + plaintext.len());
    sealed.extend_from_slice(&ephemeral_public);
    sealed.extend_from_slice(&aead::encrypt(plaintext, &key, &[], &nonce));
    Ok(sealed)
}

/// Open a sealed box with the recipient's keypair.
///
/// # Errors
///
/// - `CryptoError::Decryption` if the box is too short, was sealed to another
///   key, or was tampered with
pub fn unseal(
    sealed: &[u8],
    recipient_public: &[u8; KEY_SIZE],
    recipient_secret: &SecretKey,
) -> Result<Vec<u8>, CryptoError> {
    if sealed.len() < SEAL_OVERHEAD {
        return Err(CryptoError::Decryption);
    }

    let (ephemeral_public, ciphertext) = sealed.split_at(KEY_SIZE);
    let ephemeral_public: [u8; KEY_SIZE] = fixed(ephemeral_public)?;

    let secret = StaticSecret::from(*recipient_secret.as_bytes());
    let shared = secret.diffie_hellman(&X25519PublicKey::from(ephemeral_public));
    if !shared.was_contributory() {
        return Err(CryptoError::Decryption);
    }

    let (key, nonce) = seal_key_nonce(shared.as_bytes(), &ephemeral_public, recipient_public);

    aead::decrypt(ciphertext, &key, &nonce, &[]).map_err(|_| CryptoError::Decryption)
}

fn seal_key_nonce(
    shared: &[u8; KEY_SIZE],
    ephemeral_public: &[u8; KEY_SIZE],
    recipient_public: &[u8; KEY_SIZE],
) -> (SymmetricKey, [u8; AEAD_NONCE_SIZE]) {
    let mut salt = [0u8; 2 * KEY_SIZE];
    salt[..KEY_SIZE].copy_from_slice(ephemeral_public);
    salt[KEY_SIZE..].copy_from_slice(recipient_public);

    let hkdf = Hkdf::<Sha256>::new(Some(&salt[..]), shared);

    let mut key = [0u8; KEY_SIZE];
    let Ok(()) = hkdf.expand(SEAL_KEY_LABEL, &mut key) else {
        unreachable!("32 bytes is a valid HKDF-SHA256 output length");
    };

    let mut nonce = [0u8; AEAD_NONCE_SIZE];
    let Ok(()) = hkdf.expand(SEAL_NONCE_LABEL, &mut nonce) else {
        unreachable!("24 bytes is a valid HKDF-SHA256 output length");
    };

    (SymmetricKey::from_bytes(key), nonce)
}
