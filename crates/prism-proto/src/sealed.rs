//! Outermost layer: the anonymously sealed package.

use prism_crypto::{CryptoProvider, EncryptionKeyPair};

use crate::{errors::Result, package::Package};

/// A [`Package`] sealed to the recipient's encryption key.
///
/// `data` is the only thing that crosses the wire. It carries no framing of
/// its own and reveals neither sender nor recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPackage {
    /// Sealed-box ciphertext
    pub data: Vec<u8>,
}

impl SealedPackage {
    /// Open the sealed box and decode the package inside.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Decryption` if the box was not sealed to `recipient`
    ///   or was modified
    /// - `ProtocolError::Codec` if the opened bytes are not a package
    pub fn unseal<P: CryptoProvider>(
        &self,
        provider: &P,
        recipient: &EncryptionKeyPair,
    ) -> Result<Package> {
        let opened = provider.unseal_anonymous(&self.data, recipient)?;
        Package::deserialize(&opened)
    }
}
