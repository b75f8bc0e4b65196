//! Innermost layer: the application payload.

use prism_crypto::{CryptoProvider, SymmetricKey};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    encrypted::EncryptedMessage,
    errors::{ProtocolError, Result},
};

/// Content accepted by [`Message::create`].
#[derive(Debug, Clone, PartialEq)]
pub enum MessageInput {
    /// Raw bytes, taken verbatim
    Bytes(Vec<u8>),
    /// Text, stored as UTF-8
    Text(String),
    /// Structured value, stored as compact JSON
    Json(Value),
}

impl From<Vec<u8>> for MessageInput {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for MessageInput {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

impl From<String> for MessageInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for MessageInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<Value> for MessageInput {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

/// How [`Message::encrypt`] wraps the payload.
#[derive(Debug, Clone, Copy)]
pub enum SendMode<'a> {
    /// AEAD-encrypt under a per-message subkey, binding `counter` as
    /// associated data
    Encrypted {
        /// Per-message subkey
        key: &'a SymmetricKey,
        /// Counter the subkey was derived from
        counter: u64,
    },
    /// Carry the payload verbatim (handshake bootstrap). Still signed and
    /// sealed by the outer layers.
    Unencrypted,
}

/// Opaque application payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    /// Payload bytes
    pub data: Vec<u8>,
}

impl Message {
    /// Normalize bytes, text or a structured value into a message.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::UnsupportedInput` for JSON scalars (`null`, booleans,
    ///   numbers), which have no byte form in this protocol
    pub fn create(input: impl Into<MessageInput>) -> Result<Self> {
        let data = match input.into() {
            MessageInput::Bytes(bytes) => bytes,
            MessageInput::Text(text) => text.into_bytes(),
            MessageInput::Json(Value::String(text)) => text.into_bytes(),
            MessageInput::Json(value @ (Value::Object(_) | Value::Array(_))) => {
                serde_json::to_vec(&value)
                    .map_err(|err| ProtocolError::UnsupportedInput { reason: err.to_string() })?
            },
            MessageInput::Json(scalar) => {
                return Err(ProtocolError::UnsupportedInput {
                    reason: format!("JSON scalar {scalar} is not a message body"),
                });
            },
        };

        Ok(Self { data })
    }

    /// JSON-encode any serializable value into a message.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::UnsupportedInput` if the value cannot be serialized
    ///   or serializes to a JSON scalar
    pub fn from_json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let value = serde_json::to_value(value)
            .map_err(|err| ProtocolError::UnsupportedInput { reason: err.to_string() })?;
        Self::create(value)
    }

    /// Decode the payload as UTF-8 text.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::MalformedField` if the payload is not UTF-8
    pub fn to_text(&self) -> Result<String> {
        String::from_utf8(self.data.clone())
            .map_err(|err| ProtocolError::MalformedField { field: "message", reason: err.to_string() })
    }

    /// Decode the payload as JSON.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::MalformedField` if the payload is not valid JSON for `T`
    pub fn to_json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.data)
            .map_err(|err| ProtocolError::MalformedField { field: "message", reason: err.to_string() })
    }

    /// Bytes of this layer. The message is the innermost layer, so this is
    /// the payload itself.
    pub fn serialize(&self) -> &[u8] {
        &self.data
    }

    /// Inverse of [`Message::serialize`].
    pub fn deserialize(bytes: &[u8]) -> Self {
        Self { data: bytes.to_vec() }
    }

    /// Wrap this message in an [`EncryptedMessage`].
    ///
    /// In [`SendMode::Encrypted`] the ciphertext is bound to the decimal text
    /// of `counter`, so a receiver deriving its key from a different counter
    /// fails authentication. [`SendMode::Unencrypted`] yields an empty nonce
    /// and counter 0.
    pub fn encrypt<P: CryptoProvider>(
        &self,
        provider: &P,
        message_type: impl Into<String>,
        mode: SendMode<'_>,
    ) -> EncryptedMessage {
        let timestamp = provider.now_millis();
        let message_type = message_type.into();

        match mode {
            SendMode::Encrypted { key, counter } => {
                let associated_data = counter.to_string();
                let (data, nonce) =
                    provider.aead_encrypt(&self.data, key, associated_data.as_bytes(), None);
                EncryptedMessage {
                    data,
                    nonce: nonce.to_vec(),
                    count: counter,
                    message_type,
                    timestamp,
                }
            },
            SendMode::Unencrypted => EncryptedMessage {
                data: self.data.clone(),
                nonce: Vec::new(),
                count: 0,
                message_type,
                timestamp,
            },
        }
    }
}
