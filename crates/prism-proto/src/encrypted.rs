//! Second layer: the authenticated-encryption envelope.

use prism_crypto::{AEAD_NONCE_SIZE, CryptoProvider, IdentityKeyPair, SymmetricKey};

use crate::{
    codec,
    errors::{ProtocolError, Result},
    message::Message,
    package::Package,
};

/// How [`EncryptedMessage::decrypt`] should treat the envelope.
#[derive(Debug, Clone, Copy)]
pub enum DecryptMode<'a> {
    /// AEAD-decrypt with the subkey for this envelope's counter
    Key(&'a SymmetricKey),
    /// The envelope was sent unencrypted; take `data` verbatim
    Plaintext,
}

/// A message wrapped for transport.
///
/// Wire form: `pack([data, nonce, count, message_type, timestamp])` with the
/// three scalar fields as decimal ASCII / UTF-8 text.
///
/// # Invariants
///
/// - `nonce` is empty iff the envelope was produced by the unencrypted path;
///   otherwise it is exactly 24 bytes. Enforced by [`EncryptedMessage::deserialize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedMessage {
    /// Ciphertext (encrypted path) or plaintext (unencrypted path)
    pub data: Vec<u8>,
    /// AEAD nonce, empty on the unencrypted path
    pub nonce: Vec<u8>,
    /// Ratchet counter the sender derived its subkey from
    pub count: u64,
    /// Application-defined type tag, used by receivers for routing
    pub message_type: String,
    /// Sender wall-clock time (Unix ms) at the last serialization
    pub timestamp: u64,
}

impl EncryptedMessage {
    /// True when `data` is ciphertext.
    pub fn is_encrypted(&self) -> bool {
        !self.nonce.is_empty()
    }

    /// Refresh `timestamp` to `now` and encode.
    pub fn serialize(&mut self, now: u64) -> Vec<u8> {
        self.timestamp = now;
        self.encode()
    }

    /// Encode without touching the timestamp.
    pub fn encode(&self) -> Vec<u8> {
        let count = self.count.to_string();
        let timestamp = self.timestamp.to_string();
        codec::pack(&[
            self.data.as_slice(),
            self.nonce.as_slice(),
            count.as_bytes(),
            self.message_type.as_bytes(),
            timestamp.as_bytes(),
        ])
    }

    /// Decode an envelope.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Codec` on framing errors or a part count other than 5
    /// - `ProtocolError::MalformedField` on a nonce that is neither empty nor
    ///   24 bytes, a non-decimal counter or timestamp, or a non-UTF-8 type
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let [data, nonce, count, message_type, timestamp] = codec::unpack_exact::<5>(bytes)?;

        if !nonce.is_empty() && nonce.len() != AEAD_NONCE_SIZE {
            return Err(ProtocolError::MalformedField {
                field: "nonce",
                reason: format!("expected 0 or {AEAD_NONCE_SIZE} bytes, got {}", nonce.len()),
            });
        }

        Ok(Self {
            data,
            nonce,
            count: parse_decimal("count", &count)?,
            message_type: String::from_utf8(message_type).map_err(|err| {
                ProtocolError::MalformedField { field: "type", reason: err.to_string() }
            })?,
            timestamp: parse_decimal("timestamp", &timestamp)?,
        })
    }

    /// Recover the inner [`Message`].
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Precondition` if the mode contradicts the envelope
    ///   (a key for an unencrypted envelope, or plaintext for an encrypted one)
    /// - `ProtocolError::Authentication` if the key, counter or ciphertext do
    ///   not match
    pub fn decrypt<P: CryptoProvider>(&self, provider: &P, mode: DecryptMode<'_>) -> Result<Message> {
        match (mode, self.is_encrypted()) {
            (DecryptMode::Key(key), true) => {
                let associated_data = self.count.to_string();
                let plaintext =
                    provider.aead_decrypt(&self.data, key, &self.nonce, associated_data.as_bytes())?;
                Ok(Message::deserialize(&plaintext))
            },
            (DecryptMode::Plaintext, false) => Ok(Message::deserialize(&self.data)),
            (DecryptMode::Key(_), false) => Err(ProtocolError::Precondition {
                reason: "decryption key supplied for an unencrypted envelope",
            }),
            (DecryptMode::Plaintext, true) => Err(ProtocolError::Precondition {
                reason: "plaintext requested for an encrypted envelope",
            }),
        }
    }

    /// Sign this envelope and wrap it in a [`Package`].
    ///
    /// Refreshes `timestamp` from the provider clock before signing, so the
    /// signed bytes carry the time of packing.
    pub fn pack<P: CryptoProvider>(&mut self, provider: &P, sender: &IdentityKeyPair) -> Package {
        let data = self.serialize(provider.now_millis());
        let signature = provider.sign_detached(&data, sender);
        Package { data, signature: signature.to_vec(), sender_ipk: sender.public.to_vec() }
    }
}

/// Parse a strictly decimal ASCII field (no sign, no whitespace).
fn parse_decimal(field: &'static str, bytes: &[u8]) -> Result<u64> {
    let malformed = |reason: String| ProtocolError::MalformedField { field, reason };

    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return Err(malformed(format!("not a decimal number: {:?}", String::from_utf8_lossy(bytes))));
    }

    // All ASCII digits, so the bytes are valid UTF-8
    let text = std::str::from_utf8(bytes).map_err(|err| malformed(err.to_string()))?;
    text.parse().map_err(|err: std::num::ParseIntError| malformed(err.to_string()))
}

#[cfg(test)]
mod tests {
    use prism_crypto::{DalekProvider, SeededEnv};

    use super::*;
    use crate::{errors::CodecError, message::SendMode};

    fn provider() -> DalekProvider<SeededEnv> {
        DalekProvider::new(SeededEnv::new(11))
    }

    fn sample() -> EncryptedMessage {
        EncryptedMessage {
            data: b"payload".to_vec(),
            nonce: vec![9; AEAD_NONCE_SIZE],
            count: 42,
            message_type: "m".to_owned(),
            timestamp: 1_700_000_000_000,
        }
    }

    #[test]
    fn encode_writes_decimal_text_fields() {
        let parts = codec::unpack(&sample().encode()).unwrap();
        assert_eq!(parts[2], b"42");
        assert_eq!(parts[3], b"m");
        assert_eq!(parts[4], b"1700000000000");
    }

    #[test]
    fn deserialize_inverts_encode() {
        let envelope = sample();
        assert_eq!(EncryptedMessage::deserialize(&envelope.encode()).unwrap(), envelope);
    }

    #[test]
    fn serialize_refreshes_timestamp() {
        let mut envelope = sample();
        let bytes = envelope.serialize(5);
        assert_eq!(envelope.timestamp, 5);
        assert_eq!(EncryptedMessage::deserialize(&bytes).unwrap().timestamp, 5);
    }

    #[test]
    fn wrong_part_count_is_rejected() {
        let bytes = codec::pack(&[b"a", b"b"]);
        assert_eq!(
            EncryptedMessage::deserialize(&bytes),
            Err(ProtocolError::Codec(CodecError::PartCount { expected: 5, actual: 2 }))
        );
    }

    #[test]
    fn non_decimal_count_is_rejected() {
        let bytes = codec::pack(&[b"d".as_slice(), b"", b"+1", b"m", b"0"]);
        let err = EncryptedMessage::deserialize(&bytes).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedField { field: "count", .. }));
    }

    #[test]
    fn odd_nonce_length_is_rejected() {
        let bytes = codec::pack(&[b"d".as_slice(), b"short", b"1", b"m", b"0"]);
        let err = EncryptedMessage::deserialize(&bytes).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedField { field: "nonce", .. }));
    }

    #[test]
    fn decrypt_recovers_message() {
        let provider = provider();
        let key = SymmetricKey::from_bytes([3; 32]);
        let message = Message::create("Hello World!").unwrap();

        let envelope = message.encrypt(&provider, "m", SendMode::Encrypted { key: &key, counter: 1 });
        assert_eq!(envelope.decrypt(&provider, DecryptMode::Key(&key)).unwrap(), message);
    }

    #[test]
    fn tampered_counter_fails_authentication() {
        let provider = provider();
        let key = SymmetricKey::from_bytes([3; 32]);
        let message = Message::create("Hello World!").unwrap();

        let mut envelope =
            message.encrypt(&provider, "m", SendMode::Encrypted { key: &key, counter: 1 });
        envelope.count = 2;
        assert_eq!(
            envelope.decrypt(&provider, DecryptMode::Key(&key)),
            Err(ProtocolError::Authentication)
        );
    }

    #[test]
    fn mode_mismatch_is_a_precondition_error() {
        let provider = provider();
        let key = SymmetricKey::from_bytes([3; 32]);
        let message = Message::create("hi").unwrap();

        let plain = message.encrypt(&provider, "m", SendMode::Unencrypted);
        let err = plain.decrypt(&provider, DecryptMode::Key(&key)).unwrap_err();
        assert!(matches!(err, ProtocolError::Precondition { .. }));

        let sealed = message.encrypt(&provider, "m", SendMode::Encrypted { key: &key, counter: 1 });
        let err = sealed.decrypt(&provider, DecryptMode::Plaintext).unwrap_err();
        assert!(matches!(err, ProtocolError::Precondition { .. }));
    }

    #[test]
    fn pack_signs_the_serialized_envelope() {
        let provider = provider();
        let alice = provider.generate_signing_keypair();
        let mut envelope = sample();

        let package = envelope.pack(&provider, &alice);
        assert_eq!(package.data, envelope.encode());
        assert_eq!(package.sender_ipk, alice.public);
        assert!(provider.verify_detached(&package.signature, &package.data, &alice.public));
    }
}
