//! Identity, handshake and the send/receive pipelines.
//!
//! Send runs the layers inside out:
//!
//! ```text
//! data ─▶ Message ─▶ EncryptedMessage ─▶ Package ─▶ SealedPackage ─▶ wire
//! ```
//!
//! Receive is split in two because routing is learned from the envelope:
//! [`Prism::receive_open`] unseals and verifies, exposing the sender and type
//! tag; the caller picks the session, then [`Prism::receive_decrypt`] removes
//! the last layer.

use std::fmt::Write as _;

use prism_crypto::{
    CryptoError, CryptoProvider, EncryptionKeyPair, IdentityKeyPair, KEY_SIZE, SessionKeys,
    exchange::Role,
};
use prism_proto::{
    DecryptMode, EncryptedMessage, Message, MessageInput, Package, ProtocolError, SealedPackage,
    SendMode,
};

use crate::{
    config::PrismConfig,
    error::SessionError,
    identity::{PeerKeys, PersonalKeys},
    session::{Endpoints, Session, SessionInit},
};

/// Result alias for session manager operations
pub type Result<T> = std::result::Result<T, SessionError>;

/// Every layer built by a send, innermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layers {
    /// Application payload
    pub message: Message,
    /// Encryption envelope (timestamp as signed)
    pub encrypted: EncryptedMessage,
    /// Signed package
    pub package: Package,
    /// Sealed package
    pub sealed: SealedPackage,
}

/// Output of a send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    /// Bytes to transmit
    pub wire: Vec<u8>,
    /// Intermediate layers, for inspection and tests
    pub layers: Layers,
}

/// A message that has been unsealed and signature-checked but not decrypted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opened {
    /// Verified sender identity public key
    pub sender_ipk: [u8; KEY_SIZE],
    /// Application type tag
    pub message_type: String,
    /// Sender timestamp (Unix ms)
    pub timestamp: u64,
    /// Signed package as received
    pub package: Package,
    /// Envelope, `data` still ciphertext if it was sent encrypted
    pub encrypted: EncryptedMessage,
}

impl Opened {
    /// Envelope payload; ciphertext unless sent unencrypted.
    pub fn data(&self) -> &[u8] {
        &self.encrypted.data
    }

    /// Ratchet counter carried by the envelope.
    pub fn count(&self) -> u64 {
        self.encrypted.count
    }

    /// True when [`Opened::data`] is ciphertext.
    pub fn is_encrypted(&self) -> bool {
        self.encrypted.is_encrypted()
    }
}

/// A fully decoded incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    /// Decrypted payload
    pub message: Message,
    /// Verified sender identity public key
    pub sender_ipk: [u8; KEY_SIZE],
    /// Application type tag
    pub message_type: String,
    /// Sender timestamp (Unix ms)
    pub timestamp: u64,
    /// Ratchet counter the sender used (0 if unencrypted)
    pub count: u64,
}

/// How [`Prism::receive_decrypt`] removes the envelope.
#[derive(Debug, Clone, Copy)]
pub enum ReceiveMode<'a> {
    /// Decrypt with this session's receive chain; unencrypted envelopes from
    /// the session peer are read as plaintext
    Session(&'a Session),
    /// The message was sent unencrypted (handshake bootstrap)
    Plaintext,
}

/// The session manager.
///
/// Holds the provider handle and configuration; every operation borrows it
/// immutably, so one instance can be shared across threads when its provider
/// is `Sync`.
#[derive(Debug, Clone)]
pub struct Prism<P: CryptoProvider> {
    provider: P,
    config: PrismConfig,
}

impl<P: CryptoProvider> Prism<P> {
    /// Create a manager with the default configuration.
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, PrismConfig::default())
    }

    /// Create a manager with an explicit configuration.
    pub fn with_config(provider: P, config: PrismConfig) -> Self {
        Self { provider, config }
    }

    /// Provider handle.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Active configuration.
    pub fn config(&self) -> &PrismConfig {
        &self.config
    }

    /// Create our identity, or reload it from an existing signing keypair.
    ///
    /// # Errors
    ///
    /// - `SessionError::Crypto` if an existing identity public key is not a
    ///   valid Ed25519 point
    pub fn create_user(&self, existing: Option<IdentityKeyPair>) -> Result<PersonalKeys> {
        let identity = existing.unwrap_or_else(|| self.provider.generate_signing_keypair());
        let encryption = EncryptionKeyPair {
            public: self.provider.signing_pk_to_encryption_pk(&identity.public)?,
            secret: self.provider.signing_sk_to_encryption_sk(&identity.secret),
        };

        tracing::debug!(ipk = %hex_prefix(&identity.public), "created user");
        Ok(PersonalKeys::new(identity, encryption))
    }

    /// Derive a peer's encryption key from its identity public key.
    ///
    /// # Errors
    ///
    /// - `SessionError::Crypto` if `peer_ipk` is not 32 bytes or not a valid
    ///   Ed25519 point
    pub fn create_peer(&self, peer_ipk: &[u8]) -> Result<PeerKeys> {
        let epk = self.provider.signing_pk_to_encryption_pk(peer_ipk)?;
        let ipk: [u8; KEY_SIZE] = peer_ipk.try_into().map_err(|_| {
            CryptoError::InvalidKeyLength { expected: KEY_SIZE, actual: peer_ipk.len() }
        })?;
        Ok(PeerKeys { ipk, epk })
    }

    /// Start a session attempt with a fresh ephemeral keypair.
    pub fn initialize_session(&self, user: &PersonalKeys, peer: &PeerKeys) -> SessionInit {
        SessionInit {
            personal: user.clone(),
            peer: *peer,
            exchange: self.provider.generate_exchange_keypair(),
        }
    }

    /// Complete the exchange as the responder.
    ///
    /// # Errors
    ///
    /// - `SessionError::Crypto` (`KeyExchange`) if the peer session key is
    ///   malformed or low-order
    pub fn recipient_exchange_session(
        &self,
        init: SessionInit,
        peer_session_pk: &[u8],
    ) -> Result<Session> {
        let keys = self.provider.derive_session_keys_as_responder(&init.exchange, peer_session_pk)?;
        Ok(establish(init, keys, Role::Responder))
    }

    /// Complete the exchange as the initiator.
    ///
    /// # Errors
    ///
    /// - `SessionError::Crypto` (`KeyExchange`) if the peer session key is
    ///   malformed or low-order
    pub fn sender_exchange_session(
        &self,
        init: SessionInit,
        peer_session_pk: &[u8],
    ) -> Result<Session> {
        let keys = self.provider.derive_session_keys_as_initiator(&init.exchange, peer_session_pk)?;
        Ok(establish(init, keys, Role::Initiator))
    }

    /// Send a signed and sealed but not symmetrically encrypted message.
    ///
    /// Used before a shared key exists, e.g. to announce our session public
    /// key. Does not touch the send counter.
    ///
    /// # Errors
    ///
    /// - `SessionError::Protocol` (`UnsupportedInput`) if `data` cannot be
    ///   encoded
    /// - `SessionError::MessageTooLarge` if the payload exceeds the limit
    pub fn send_unencrypted<S: Endpoints>(
        &self,
        session: &S,
        data: impl Into<MessageInput>,
        message_type: &str,
    ) -> Result<Sent> {
        let sent = self.build(session, data, message_type, SendMode::Unencrypted)?;
        tracing::debug!(message_type, size = sent.wire.len(), "sent unencrypted message");
        Ok(sent)
    }

    /// Send an encrypted message under the next ratchet subkey.
    ///
    /// The counter becomes `count` when given and non-zero, otherwise
    /// `tx_count + 1`; counter 0 belongs to unencrypted envelopes. The subkey
    /// is derived from `tx` and that counter, and the counter is committed to
    /// the session only after the message is built.
    ///
    /// # Errors
    ///
    /// - `SessionError::CounterExhausted` if `tx_count` is `u64::MAX` and no
    ///   override is given
    /// - `SessionError::MessageTooLarge` if the payload exceeds the limit
    /// - `SessionError::Protocol` (`UnsupportedInput`) if `data` cannot be
    ///   encoded
    ///
    /// # Security
    ///
    /// An override that does not advance the counter reuses a subkey
    /// (the AEAD nonce is still fresh). It is accepted and logged at `warn`.
    pub fn send(
        &self,
        session: &mut Session,
        data: impl Into<MessageInput>,
        message_type: &str,
        count: Option<u64>,
    ) -> Result<Sent> {
        let counter = match count.filter(|&requested| requested != 0) {
            Some(requested) => {
                if requested <= session.tx_count {
                    tracing::warn!(
                        previous = session.tx_count,
                        requested,
                        "send counter override does not advance; subkey will be reused"
                    );
                }
                requested
            },
            None => session.tx_count.checked_add(1).ok_or(SessionError::CounterExhausted)?,
        };

        let subkey = self.provider.derive_subkey(&session.keys.tx, counter, &self.config.kdf_context);
        let sent =
            self.build(&*session, data, message_type, SendMode::Encrypted { key: &subkey, counter })?;

        session.tx_count = counter;
        tracing::debug!(message_type, counter, size = sent.wire.len(), "sent encrypted message");
        Ok(sent)
    }

    /// Unseal and verify a wire message without decrypting it.
    ///
    /// # Errors
    ///
    /// - `SessionError::WireTooLarge` if `wire` exceeds the configured limit
    /// - `SessionError::Protocol` with kind `Decryption` (not for us or
    ///   tampered), `Signature` (forged or corrupted), or `MalformedEncoding`
    pub fn receive_open(&self, user: &PersonalKeys, wire: &[u8]) -> Result<Opened> {
        if wire.len() > self.config.max_wire_size {
            return Err(SessionError::WireTooLarge {
                size: wire.len(),
                max: self.config.max_wire_size,
            });
        }

        let sealed = SealedPackage { data: wire.to_vec() };
        let opened = sealed
            .unseal(&self.provider, user.encryption())
            .and_then(|package| {
                let encrypted = package.unpack(&self.provider)?;
                Ok((package, encrypted))
            })
            .inspect_err(|err| tracing::warn!(error = %err, "rejected incoming message"))?;
        let (package, encrypted) = opened;

        let sender_ipk: [u8; KEY_SIZE] =
            package.sender_ipk.as_slice().try_into().map_err(|_| ProtocolError::MalformedField {
                field: "sender_ipk",
                reason: format!("expected {KEY_SIZE} bytes, got {}", package.sender_ipk.len()),
            })?;

        tracing::debug!(
            sender = %hex_prefix(&sender_ipk),
            message_type = %encrypted.message_type,
            count = encrypted.count,
            "opened message"
        );

        Ok(Opened {
            sender_ipk,
            message_type: encrypted.message_type.clone(),
            timestamp: encrypted.timestamp,
            package,
            encrypted,
        })
    }

    /// Remove the envelope from an opened message.
    ///
    /// In [`ReceiveMode::Session`] the receive subkey is derived from the
    /// session's `rx` key and the counter the envelope carries. An envelope
    /// with an empty nonce was sent unencrypted and is read as plaintext. The
    /// session is only read.
    ///
    /// # Errors
    ///
    /// - `SessionError::IdentityMismatch` if the sender is not the session peer
    /// - `SessionError::Protocol` with kind `Precondition` for
    ///   [`ReceiveMode::Plaintext`] on an encrypted envelope, or
    ///   `Authentication` if the ciphertext does not verify
    pub fn receive_decrypt(&self, opened: &Opened, mode: ReceiveMode<'_>) -> Result<Received> {
        let message = match mode {
            ReceiveMode::Session(session) => {
                if opened.sender_ipk != session.peer.ipk {
                    tracing::warn!(
                        sender = %hex_prefix(&opened.sender_ipk),
                        peer = %hex_prefix(&session.peer.ipk),
                        "message sender is not the session peer"
                    );
                    return Err(SessionError::IdentityMismatch);
                }

                if opened.is_encrypted() {
                    let subkey = self.provider.derive_subkey(
                        &session.keys.rx,
                        opened.encrypted.count,
                        &self.config.kdf_context,
                    );
                    opened.encrypted.decrypt(&self.provider, DecryptMode::Key(&subkey))
                } else {
                    opened.encrypted.decrypt(&self.provider, DecryptMode::Plaintext)
                }
            },
            ReceiveMode::Plaintext => opened.encrypted.decrypt(&self.provider, DecryptMode::Plaintext),
        }
        .inspect_err(|err| tracing::warn!(error = %err, "failed to decrypt message"))?;

        Ok(Received {
            message,
            sender_ipk: opened.sender_ipk,
            message_type: opened.message_type.clone(),
            timestamp: opened.timestamp,
            count: opened.encrypted.count,
        })
    }

    /// Run the send pipeline for one message.
    fn build<S: Endpoints + ?Sized>(
        &self,
        session: &S,
        data: impl Into<MessageInput>,
        message_type: &str,
        mode: SendMode<'_>,
    ) -> Result<Sent> {
        let message = Message::create(data)?;
        if message.data.len() > self.config.max_message_size {
            return Err(SessionError::MessageTooLarge {
                size: message.data.len(),
                max: self.config.max_message_size,
            });
        }

        let mut encrypted = message.encrypt(&self.provider, message_type, mode);
        let package = encrypted.pack(&self.provider, session.personal().identity());
        let sealed = package.seal(&self.provider, &session.peer().epk)?;

        Ok(Sent { wire: sealed.data.clone(), layers: Layers { message, encrypted, package, sealed } })
    }
}

fn establish(init: SessionInit, keys: SessionKeys, role: Role) -> Session {
    tracing::debug!(?role, "session established");
    Session {
        personal: init.personal,
        peer: init.peer,
        exchange: init.exchange,
        keys,
        tx_count: 0,
        role,
    }
}

/// First four bytes of a public key as hex, for log fields.
fn hex_prefix(key: &[u8; KEY_SIZE]) -> String {
    key[..4].iter().fold(String::with_capacity(8), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}
