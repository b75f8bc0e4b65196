//! Third layer: the signed package.

use prism_crypto::CryptoProvider;

use crate::{
    codec,
    encrypted::EncryptedMessage,
    errors::{ProtocolError, Result},
    sealed::SealedPackage,
};

/// An [`EncryptedMessage`] signed by its sender.
///
/// Wire form: `pack([data, signature, sender_ipk])`.
///
/// # Security
///
/// `sender_ipk` is only a claim until [`Package::unpack`] verifies the
/// signature against it. Nothing inside `data` is interpreted before that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    /// Serialized [`EncryptedMessage`]
    pub data: Vec<u8>,
    /// Ed25519 detached signature over `data`
    pub signature: Vec<u8>,
    /// Declared sender identity public key
    pub sender_ipk: Vec<u8>,
}

impl Package {
    /// Encode the package.
    pub fn serialize(&self) -> Vec<u8> {
        codec::pack(&[&self.data, &self.signature, &self.sender_ipk])
    }

    /// Decode a package.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Codec` on framing errors or a part count other than 3
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let [data, signature, sender_ipk] = codec::unpack_exact::<3>(bytes)?;
        Ok(Self { data, signature, sender_ipk })
    }

    /// Verify the signature, then decode the inner envelope.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Precondition` if `sender_ipk` is empty
    /// - `ProtocolError::Signature` if the signature does not verify
    /// - `ProtocolError::Codec` / `ProtocolError::MalformedField` if the
    ///   signed bytes are not a valid envelope
    pub fn unpack<P: CryptoProvider>(&self, provider: &P) -> Result<EncryptedMessage> {
        if self.sender_ipk.is_empty() {
            return Err(ProtocolError::Precondition { reason: "sender identity key is not set" });
        }

        if !provider.verify_detached(&self.signature, &self.data, &self.sender_ipk) {
            return Err(ProtocolError::Signature);
        }

        EncryptedMessage::deserialize(&self.data)
    }

    /// Seal this package to the recipient's encryption public key.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Crypto` if the recipient key is unusable
    pub fn seal<P: CryptoProvider>(&self, provider: &P, recipient_epk: &[u8]) -> Result<SealedPackage> {
        let data = provider.seal_anonymous(&self.serialize(), recipient_epk)?;
        Ok(SealedPackage { data })
    }
}
