//! The primitive capability set consumed by the message layers.
//!
//! [`CryptoProvider`] is the seam between the protocol and the cryptography.
//! Layers never touch a cipher directly; they call the provider handle they
//! were given. [`DalekProvider`] is the production implementation over the
//! `RustCrypto`/dalek stack and is generic over an [`Environment`] so tests can
//! pin randomness and time.

use crate::{
    aead::{self, AEAD_NONCE_SIZE},
    encoding,
    env::Environment,
    error::CryptoError,
    exchange,
    kdf::{self, CONTEXT_SIZE, PASSWORD_SALT_SIZE},
    keys::{
        self, EncryptionKeyPair, ExchangeKeyPair, IdentityKeyPair, KEY_SIZE, SIGNATURE_SIZE,
        SecretKey, SessionKeys, SymmetricKey,
    },
    seal,
};

/// Cryptographic capabilities required by the protocol.
///
/// Every method is safe to call concurrently from multiple threads; the
/// handle holds no per-call state.
pub trait CryptoProvider: Clone + Send + Sync + 'static {
    /// Generate a fresh Ed25519 identity keypair.
    fn generate_signing_keypair(&self) -> IdentityKeyPair;

    /// Convert an identity public key to its X25519 encryption public key.
    ///
    /// # Errors
    ///
    /// - `CryptoError::InvalidKeyLength` / `CryptoError::InvalidKey` for bad
    ///   input
    fn signing_pk_to_encryption_pk(&self, identity_public: &[u8])
    -> Result<[u8; KEY_SIZE], CryptoError>;

    /// Convert an identity secret key to its X25519 encryption secret key.
    fn signing_sk_to_encryption_sk(&self, identity_secret: &SecretKey) -> SecretKey;

    /// Generate an ephemeral X25519 keypair for a session handshake.
    fn generate_exchange_keypair(&self) -> ExchangeKeyPair;

    /// Derive `{rx, tx}` as the handshake initiator.
    ///
    /// # Errors
    ///
    /// - `CryptoError::KeyExchange` if the peer key is unusable
    fn derive_session_keys_as_initiator(
        &self,
        own: &ExchangeKeyPair,
        peer_public: &[u8],
    ) -> Result<SessionKeys, CryptoError>;

    /// Derive `{rx, tx}` as the handshake responder.
    ///
    /// # Errors
    ///
    /// - `CryptoError::KeyExchange` if the peer key is unusable
    fn derive_session_keys_as_responder(
        &self,
        own: &ExchangeKeyPair,
        peer_public: &[u8],
    ) -> Result<SessionKeys, CryptoError>;

    /// Derive the per-message subkey for `counter`.
    fn derive_subkey(
        &self,
        base_key: &SymmetricKey,
        counter: u64,
        context: &[u8; CONTEXT_SIZE],
    ) -> SymmetricKey;

    /// Encrypt with `XChaCha20-Poly1305`.
    ///
    /// Draws a random nonce when `nonce` is `None`. Returns the ciphertext
    /// and the nonce that was used.
    fn aead_encrypt(
        &self,
        plaintext: &[u8],
        key: &SymmetricKey,
        associated_data: &[u8],
        nonce: Option<[u8; AEAD_NONCE_SIZE]>,
    ) -> (Vec<u8>, [u8; AEAD_NONCE_SIZE]);

    /// Decrypt and authenticate with `XChaCha20-Poly1305`.
    ///
    /// # Errors
    ///
    /// - `CryptoError::Authentication` if the tag does not verify
    /// - `CryptoError::InvalidKeyLength` if the nonce is not 24 bytes
    fn aead_decrypt(
        &self,
        ciphertext: &[u8],
        key: &SymmetricKey,
        nonce: &[u8],
        associated_data: &[u8],
    ) -> Result<Vec<u8>, CryptoError>;

    /// Produce a detached Ed25519 signature.
    fn sign_detached(&self, data: &[u8], identity: &IdentityKeyPair) -> [u8; SIGNATURE_SIZE];

    /// Verify a detached Ed25519 signature. Malformed inputs verify `false`.
    fn verify_detached(&self, signature: &[u8], data: &[u8], public_key: &[u8]) -> bool;

    /// Seal `plaintext` anonymously to an X25519 public key.
    ///
    /// # Errors
    ///
    /// - `CryptoError::InvalidKeyLength` / `CryptoError::InvalidKey` if the
    ///   recipient key is unusable
    fn seal_anonymous(&self, plaintext: &[u8], recipient_public: &[u8])
    -> Result<Vec<u8>, CryptoError>;

    /// Open an anonymous sealed box.
    ///
    /// # Errors
    ///
    /// - `CryptoError::Decryption` if the box cannot be opened
    fn unseal_anonymous(
        &self,
        sealed: &[u8],
        recipient: &EncryptionKeyPair,
    ) -> Result<Vec<u8>, CryptoError>;

    /// Derive a symmetric key from a password.
    ///
    /// Generates a fresh salt when `salt` is `None`. Returns the key and the
    /// salt needed to reproduce it.
    ///
    /// # Errors
    ///
    /// - `CryptoError::PasswordHash` if the KDF rejects the inputs
    fn create_symmetric_key(
        &self,
        password: &[u8],
        salt: Option<[u8; PASSWORD_SALT_SIZE]>,
    ) -> Result<(SymmetricKey, [u8; PASSWORD_SALT_SIZE]), CryptoError>;

    /// Wall-clock milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;

    /// Encode text as UTF-8 bytes.
    #[allow(clippy::wrong_self_convention)]
    fn from_text(&self, text: &str) -> Vec<u8> {
        encoding::from_text(text)
    }

    /// Decode UTF-8 bytes into text.
    ///
    /// # Errors
    ///
    /// - `CryptoError::InvalidEncoding` if the bytes are not valid UTF-8
    fn to_text(&self, bytes: &[u8]) -> Result<String, CryptoError> {
        encoding::to_text(bytes)
    }

    /// Encode bytes as base64.
    fn to_base64(&self, bytes: &[u8]) -> String {
        encoding::to_base64(bytes)
    }

    /// Decode base64 into bytes.
    ///
    /// # Errors
    ///
    /// - `CryptoError::InvalidEncoding` if the input is not valid base64
    #[allow(clippy::wrong_self_convention)]
    fn from_base64(&self, encoded: &str) -> Result<Vec<u8>, CryptoError> {
        encoding::from_base64(encoded)
    }
}

/// Production provider over `ed25519-dalek`, `x25519-dalek` and `RustCrypto`.
#[derive(Debug, Clone)]
pub struct DalekProvider<E: Environment> {
    env: E,
}

impl<E: Environment> DalekProvider<E> {
    /// Create a provider that draws randomness and time from `env`.
    pub fn new(env: E) -> Self {
        Self { env }
    }

    /// The environment backing this provider.
    pub fn env(&self) -> &E {
        &self.env
    }
}

impl<E: Environment> CryptoProvider for DalekProvider<E> {
    fn generate_signing_keypair(&self) -> IdentityKeyPair {
        IdentityKeyPair::from_seed(self.env.random_array())
    }

    fn signing_pk_to_encryption_pk(
        &self,
        identity_public: &[u8],
    ) -> Result<[u8; KEY_SIZE], CryptoError> {
        keys::identity_public_to_encryption(identity_public)
    }

    fn signing_sk_to_encryption_sk(&self, identity_secret: &SecretKey) -> SecretKey {
        keys::identity_secret_to_encryption(identity_secret)
    }

    fn generate_exchange_keypair(&self) -> ExchangeKeyPair {
        ExchangeKeyPair::from_secret(self.env.random_array())
    }

    fn derive_session_keys_as_initiator(
        &self,
        own: &ExchangeKeyPair,
        peer_public: &[u8],
    ) -> Result<SessionKeys, CryptoError> {
        exchange::derive_as_initiator(own, peer_public)
    }

    fn derive_session_keys_as_responder(
        &self,
        own: &ExchangeKeyPair,
        peer_public: &[u8],
    ) -> Result<SessionKeys, CryptoError> {
        exchange::derive_as_responder(own, peer_public)
    }

    fn derive_subkey(
        &self,
        base_key: &SymmetricKey,
        counter: u64,
        context: &[u8; CONTEXT_SIZE],
    ) -> SymmetricKey {
        kdf::derive_subkey(base_key, counter, context)
    }

    fn aead_encrypt(
        &self,
        plaintext: &[u8],
        key: &SymmetricKey,
        associated_data: &[u8],
        nonce: Option<[u8; AEAD_NONCE_SIZE]>,
    ) -> (Vec<u8>, [u8; AEAD_NONCE_SIZE]) {
        let nonce = nonce.unwrap_or_else(|| self.env.random_array());
        (aead::encrypt(plaintext, key, associated_data, &nonce), nonce)
    }

    fn aead_decrypt(
        &self,
        ciphertext: &[u8],
        key: &SymmetricKey,
        nonce: &[u8],
        associated_data: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        aead::decrypt(ciphertext, key, nonce, associated_data)
    }

    fn sign_detached(&self, data: &[u8], identity: &IdentityKeyPair) -> [u8; SIGNATURE_SIZE] {
        crate::signature::sign_detached(data, identity)
    }

    fn verify_detached(&self, signature: &[u8], data: &[u8], public_key: &[u8]) -> bool {
        crate::signature::verify_detached(signature, data, public_key)
    }

    fn seal_anonymous(
        &self,
        plaintext: &[u8],
        recipient_public: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let recipient_public: [u8; KEY_SIZE] = crate::error::fixed(recipient_public)?;
        seal::seal(plaintext, &recipient_public, self.env.random_array())
    }

    fn unseal_anonymous(
        &self,
        sealed: &[u8],
        recipient: &EncryptionKeyPair,
    ) -> Result<Vec<u8>, CryptoError> {
        seal::unseal(sealed, &recipient.public, &recipient.secret)
    }

    fn create_symmetric_key(
        &self,
        password: &[u8],
        salt: Option<[u8; PASSWORD_SALT_SIZE]>,
    ) -> Result<(SymmetricKey, [u8; PASSWORD_SALT_SIZE]), CryptoError> {
        let salt = salt.unwrap_or_else(|| self.env.random_array());
        Ok((kdf::derive_password_key(password, &salt)?, salt))
    }

    fn now_millis(&self) -> u64 {
        self.env.wall_clock_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::SystemEnv;

    fn provider() -> DalekProvider<SystemEnv> {
        DalekProvider::new(SystemEnv::new())
    }

    #[test]
    fn generated_identities_are_distinct() {
        let p = provider();
        assert_ne!(p.generate_signing_keypair().public, p.generate_signing_keypair().public);
    }

    #[test]
    fn identity_converts_to_working_seal_keys() {
        let p = provider();
        let bob = p.generate_signing_keypair();
        let bob_enc = keys::encryption_keypair(&bob).unwrap();

        let epk = p.signing_pk_to_encryption_pk(&bob.public).unwrap();
        assert_eq!(epk, bob_enc.public);

        let sealed = p.seal_anonymous(b"hi bob", &epk).unwrap();
        assert_eq!(p.unseal_anonymous(&sealed, &bob_enc).unwrap(), b"hi bob");
    }

    #[test]
    fn session_keys_are_symmetric() {
        let p = provider();
        let alice = p.generate_exchange_keypair();
        let bob = p.generate_exchange_keypair();

        let a = p.derive_session_keys_as_initiator(&alice, &bob.public).unwrap();
        let b = p.derive_session_keys_as_responder(&bob, &alice.public).unwrap();

        assert_eq!(a.tx, b.rx);
        assert_eq!(a.rx, b.tx);
    }

    #[test]
    fn aead_draws_random_nonce_when_absent() {
        let p = provider();
        let key = SymmetricKey::from_bytes([9; KEY_SIZE]);

        let (ct1, n1) = p.aead_encrypt(b"same", &key, b"1", None);
        let (ct2, n2) = p.aead_encrypt(b"same", &key, b"1", None);
        assert_ne!(n1, n2);
        assert_ne!(ct1, ct2);

        assert_eq!(p.aead_decrypt(&ct1, &key, &n1, b"1").unwrap(), b"same");
    }

    #[test]
    fn aead_uses_supplied_nonce() {
        let p = provider();
        let key = SymmetricKey::from_bytes([9; KEY_SIZE]);
        let (_, nonce) = p.aead_encrypt(b"data", &key, b"", Some([3; AEAD_NONCE_SIZE]));
        assert_eq!(nonce, [3; AEAD_NONCE_SIZE]);
    }

    #[test]
    fn seal_rejects_short_recipient_key() {
        let p = provider();
        let result = p.seal_anonymous(b"data", &[1u8; 16]);
        assert_eq!(result, Err(CryptoError::InvalidKeyLength { expected: 32, actual: 16 }));
    }

    #[test]
    fn symmetric_key_reproducible_from_salt() {
        let p = provider();
        let (key, salt) = p.create_symmetric_key(b"Password#123", None).unwrap();
        let (again, same_salt) = p.create_symmetric_key(b"Password#123", Some(salt)).unwrap();
        assert_eq!(key, again);
        assert_eq!(salt, same_salt);
    }

    #[test]
    fn encoding_helpers_delegate() {
        let p = provider();
        let bytes = p.from_text("Hello World!");
        assert_eq!(p.to_text(&bytes).unwrap(), "Hello World!");
        assert_eq!(p.from_base64(&p.to_base64(&bytes)).unwrap(), bytes);
    }
}
