//! Ed25519 detached signatures

use ed25519_dalek::{Signature, Signer, VerifyingKey};

use crate::keys::{IdentityKeyPair, KEY_SIZE, SIGNATURE_SIZE};

/// Sign `data` with the identity secret key.
pub fn sign_detached(data: &[u8], identity: &IdentityKeyPair) -> [u8; SIGNATURE_SIZE] {
    identity.signing_key().sign(data).to_bytes()
}

/// Verify a detached signature.
///
/// Uses strict verification (rejects small-order keys and non-canonical
/// signatures). Malformed key or signature bytes verify as `false`.
pub fn verify_detached(signature: &[u8], data: &[u8], public_key: &[u8]) -> bool {
    let Ok(public_key) = <[u8; KEY_SIZE]>::try_from(public_key) else {
        return false;
    };
    let Ok(signature) = <[u8; SIGNATURE_SIZE]>::try_from(signature) else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&public_key) else {
        return false;
    };

    verifying_key.verify_strict(data, &Signature::from_bytes(&signature)).is_ok()
}
