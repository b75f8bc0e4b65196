//! Key material types and the identity-to-encryption key conversion.
//!
//! Secret types zeroize on drop and redact themselves in `Debug` output.
//! Public keys are plain `[u8; 32]` arrays.

use std::fmt;

use ed25519_dalek::{SigningKey, VerifyingKey};
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::Zeroize;

use crate::error::{CryptoError, fixed};

/// Size of every public key, secret key and symmetric key (32 bytes)
pub const KEY_SIZE: usize = 32;

/// Size of an Ed25519 detached signature (64 bytes)
pub const SIGNATURE_SIZE: usize = 64;

/// 32 bytes of secret key material.
///
/// For identity keys this is the Ed25519 seed; for encryption and exchange
/// keys it is the X25519 scalar.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey([u8; KEY_SIZE]);

impl SecretKey {
    /// Wrap raw secret bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Wrap a secret from a slice, checking its length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        fixed(bytes).map(Self)
    }

    /// Raw secret bytes. Callers must not log or persist these casually.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// A 32-byte symmetric key (session tx/rx keys and derived subkeys).
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey([u8; KEY_SIZE]);

impl SymmetricKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Wrap a key from a slice, checking its length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        fixed(bytes).map(Self)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(<redacted>)")
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Long-term Ed25519 identity keypair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityKeyPair {
    /// Ed25519 verifying key (the identity public key, `Ipk`)
    pub public: [u8; KEY_SIZE],
    /// Ed25519 seed (the identity secret key, `Isk`)
    pub secret: SecretKey,
}

impl IdentityKeyPair {
    /// Build an identity keypair from a 32-byte seed.
    pub fn from_seed(seed: [u8; KEY_SIZE]) -> Self {
        let signing_key = SigningKey::from_bytes(&seed);
        Self { public: signing_key.verifying_key().to_bytes(), secret: SecretKey::from_bytes(seed) }
    }

    /// Reload an identity from stored parts.
    ///
    /// # Errors
    ///
    /// - `CryptoError::InvalidKeyLength` if either part is not 32 bytes
    /// - `CryptoError::InvalidKey` if the secret does not derive the public key
    pub fn from_parts(public: &[u8], secret: &[u8]) -> Result<Self, CryptoError> {
        let public: [u8; KEY_SIZE] = fixed(public)?;
        let pair = Self::from_seed(fixed(secret)?);

        if pair.public != public {
            return Err(CryptoError::InvalidKey {
                reason: "identity secret does not match identity public key",
            });
        }

        Ok(pair)
    }

    pub(crate) fn signing_key(&self) -> SigningKey {
        SigningKey::from_bytes(self.secret.as_bytes())
    }
}

/// X25519 keypair derived from an identity, used for anonymous sealing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionKeyPair {
    /// X25519 public key (`Epk`)
    pub public: [u8; KEY_SIZE],
    /// X25519 secret scalar (`Esk`)
    pub secret: SecretKey,
}

/// Ephemeral X25519 keypair generated per session attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeKeyPair {
    /// Session public key, sent to the peer during the handshake
    pub public: [u8; KEY_SIZE],
    /// Session secret key
    pub secret: SecretKey,
}

impl ExchangeKeyPair {
    /// Build an exchange keypair from a 32-byte X25519 secret.
    pub fn from_secret(secret: [u8; KEY_SIZE]) -> Self {
        let static_secret = StaticSecret::from(secret);
        let public = X25519PublicKey::from(&static_secret).to_bytes();
        Self { public, secret: SecretKey::from_bytes(static_secret.to_bytes()) }
    }
}

/// Directional session keys produced by the key exchange.
///
/// # Invariants
///
/// For two honest parties A (initiator) and B (responder) exchanging with
/// each other's session public keys: `A.tx == B.rx` and `A.rx == B.tx`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKeys {
    /// Base key for messages we send
    pub tx: SymmetricKey,
    /// Base key for messages we receive
    pub rx: SymmetricKey,
}

/// Convert an Ed25519 identity public key into its X25519 counterpart.
///
/// # Errors
///
/// - `CryptoError::InvalidKeyLength` if `identity_public` is not 32 bytes
/// - `CryptoError::InvalidKey` if the bytes are not a valid Edwards point
pub fn identity_public_to_encryption(identity_public: &[u8]) -> Result<[u8; KEY_SIZE], CryptoError> {
    let bytes: [u8; KEY_SIZE] = fixed(identity_public)?;
    let verifying_key = VerifyingKey::from_bytes(&bytes)
        .map_err(|_| CryptoError::InvalidKey { reason: "not a valid Ed25519 public key" })?;
    Ok(verifying_key.to_montgomery().to_bytes())
}

/// Convert an Ed25519 identity secret (seed) into its X25519 counterpart.
pub fn identity_secret_to_encryption(identity_secret: &SecretKey) -> SecretKey {
    let signing_key = SigningKey::from_bytes(identity_secret.as_bytes());
    let scalar = StaticSecret::from(signing_key.to_scalar_bytes());
    SecretKey::from_bytes(scalar.to_bytes())
}

/// Derive the full encryption keypair for an identity.
pub fn encryption_keypair(identity: &IdentityKeyPair) -> Result<EncryptionKeyPair, CryptoError> {
    Ok(EncryptionKeyPair {
        public: identity_public_to_encryption(&identity.public)?,
        secret: identity_secret_to_encryption(&identity.secret),
    })
}
