//! Session key exchange with asymmetric roles.
//!
//! Both sides compute the same X25519 shared point, then expand it with
//! HKDF-SHA256 into 64 bytes. The salt is `initiator_pk || responder_pk`, so
//! both sides agree on the input regardless of who computes it. The initiator
//! reads the output as `rx || tx` and the responder as `tx || rx`, which gives
//! the directional symmetry `initiator.tx == responder.rx`.

use hkdf::Hkdf;
use sha2::Sha256;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::Zeroize;

use crate::{
    error::{CryptoError, fixed},
    keys::{ExchangeKeyPair, KEY_SIZE, SessionKeys, SymmetricKey},
};

/// Label used for session key expansion
const SESSION_KEYS_LABEL: &[u8] = b"prismSessionKeysV1";

/// Which side of the handshake we are on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Sent the first session public key (the "client" side)
    Initiator,
    /// Answered with its own session public key (the "server" side)
    Responder,
}

/// Derive session keys as the handshake initiator.
///
/// # Errors
///
/// - `CryptoError::KeyExchange` if the peer key has the wrong length or is a
///   low-order point
pub fn derive_as_initiator(
    own: &ExchangeKeyPair,
    peer_public: &[u8],
) -> Result<SessionKeys, CryptoError> {
    derive(own, peer_public, Role::Initiator)
}

/// Derive session keys as the handshake responder.
///
/// # Errors
///
/// - `CryptoError::KeyExchange` if the peer key has the wrong length or is a
///   low-order point
pub fn derive_as_responder(
    own: &ExchangeKeyPair,
    peer_public: &[u8],
) -> Result<SessionKeys, CryptoError> {
    derive(own, peer_public, Role::Responder)
}

fn derive(
    own: &ExchangeKeyPair,
    peer_public: &[u8],
    role: Role,
) -> Result<SessionKeys, CryptoError> {
    let peer: [u8; KEY_SIZE] = fixed(peer_public)
        .map_err(|_| CryptoError::KeyExchange { reason: "peer session key must be 32 bytes" })?;

    let secret = StaticSecret::from(*own.secret.as_bytes());
    let shared = secret.diffie_hellman(&X25519PublicKey::from(peer));
    if !shared.was_contributory() {
        return Err(CryptoError::KeyExchange { reason: "peer session key is a low-order point" });
    }

    let (initiator_pk, responder_pk) = match role {
        Role::Initiator => (own.public, peer),
        Role::Responder => (peer, own.public),
    };

    let mut salt = [0u8; 2 * KEY_SIZE];
    salt[..KEY_SIZE].copy_from_slice(&initiator_pk);
    salt[KEY_SIZE..].copy_from_slice(&responder_pk);

    let hkdf = Hkdf::<Sha256>::new(Some(&salt[..]), shared.as_bytes());
    let mut okm = [0u8; 2 * KEY_SIZE];
    let Ok(()) = hkdf.expand(SESSION_KEYS_LABEL, &mut okm) else {
        unreachable!("64 bytes is a valid HKDF-SHA256 output length");
    };

    let first = fixed::<KEY_SIZE>(&okm[..KEY_SIZE])?;
    let second = fixed::<KEY_SIZE>(&okm[KEY_SIZE..])?;
    okm.zeroize();

    let keys = match role {
        Role::Initiator => SessionKeys {
            rx: SymmetricKey::from_bytes(first),
            tx: SymmetricKey::from_bytes(second),
        },
        Role::Responder => SessionKeys {
            tx: SymmetricKey::from_bytes(first),
            rx: SymmetricKey::from_bytes(second),
        },
    };

    Ok(keys)
}
