//! Prism Cryptographic Primitives
//!
//! The primitive adapter consumed by the message layers and the session
//! manager. Everything here is either a pure function over caller-supplied
//! keys and bytes, or a method on a [`CryptoProvider`] handle that draws
//! randomness and time from an [`Environment`].
//!
//! # Key Hierarchy
//!
//! ```text
//! Identity (Ed25519) ──birational map──▶ Encryption (X25519)
//!        │                                      │
//!        │ sign / verify                        │ seal / unseal
//!        ▼                                      ▼
//!   Package signature                    SealedPackage
//!
//! Session (ephemeral X25519) ──X25519 + HKDF──▶ { tx, rx }
//!                                                  │
//!                                                  ▼ HKDF(counter, context)
//!                                            per-message subkey
//!                                                  │
//!                                                  ▼
//!                                        XChaCha20-Poly1305 ciphertext
//! ```
//!
//! # Security
//!
//! Forward ratchet:
//! - Each counter yields an independent subkey via a one-way KDF
//! - Compromise of one subkey reveals neither the base key nor other subkeys
//!
//! Authenticity:
//! - `XChaCha20-Poly1305` binds ciphertext to the counter (associated data)
//! - Ed25519 detached signatures bind packages to the sender identity
//!
//! Anonymity:
//! - Sealing uses a fresh ephemeral X25519 key per message; the sender's
//!   identity is not recoverable from the sealed bytes

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod aead;
pub mod encoding;
pub mod env;
pub mod error;
pub mod exchange;
pub mod kdf;
pub mod keys;
pub mod provider;
pub mod seal;
pub mod signature;

pub use aead::{AEAD_NONCE_SIZE, AEAD_TAG_SIZE};
pub use env::{Environment, SystemEnv};
#[cfg(feature = "test-utils")]
pub use env::SeededEnv;
pub use error::CryptoError;
pub use kdf::{CONTEXT_SIZE, PASSWORD_SALT_SIZE};
pub use keys::{
    EncryptionKeyPair, ExchangeKeyPair, IdentityKeyPair, KEY_SIZE, SIGNATURE_SIZE, SecretKey,
    SessionKeys, SymmetricKey,
};
pub use provider::{CryptoProvider, DalekProvider};
