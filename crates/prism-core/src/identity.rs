//! Long-term identities: our own keys and a peer's public keys.

use prism_crypto::{EncryptionKeyPair, IdentityKeyPair, KEY_SIZE};

/// Our own identity plus the encryption keypair derived from it.
///
/// # Invariants
///
/// `encryption` is always the birational image of `identity`; both are set
/// once by [`crate::Prism::create_user`] and never change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonalKeys {
    identity: IdentityKeyPair,
    encryption: EncryptionKeyPair,
}

impl PersonalKeys {
    pub(crate) fn new(identity: IdentityKeyPair, encryption: EncryptionKeyPair) -> Self {
        Self { identity, encryption }
    }

    /// Identity public key (`Ipk`), the stable name of this user.
    pub fn ipk(&self) -> &[u8; KEY_SIZE] {
        &self.identity.public
    }

    /// Encryption public key (`Epk`), the address peers seal to.
    pub fn epk(&self) -> &[u8; KEY_SIZE] {
        &self.encryption.public
    }

    /// Signing keypair.
    pub fn identity(&self) -> &IdentityKeyPair {
        &self.identity
    }

    /// Sealed-box keypair.
    pub fn encryption(&self) -> &EncryptionKeyPair {
        &self.encryption
    }

    /// Public half, as a peer would see it.
    pub fn to_peer(&self) -> PeerKeys {
        PeerKeys { ipk: self.identity.public, epk: self.encryption.public }
    }
}

/// A peer's public identity and derived encryption key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerKeys {
    /// Identity public key
    pub ipk: [u8; KEY_SIZE],
    /// Encryption public key derived from `ipk`
    pub epk: [u8; KEY_SIZE],
}
