//! Session announcement payloads for the bootstrap handshake.
//!
//! ```text
//! Alice (initiator)                                  Bob (responder)
//!   initialize_session
//!   send_unencrypted(IC: {pk_A, name, greeting}) ──▶ receive_open / Plaintext
//!                                                    initialize_session
//!                                                    recipient_exchange_session(pk_A)
//!   receive_open / Plaintext ◀── send_unencrypted(RC: {pk_B, name, greeting})
//!   sender_exchange_session(pk_B)
//! ```
//!
//! Both announcements are signed and sealed like any other message, so each
//! side learns the other's session key from an authenticated source.

use prism_crypto::KEY_SIZE;
use prism_proto::{ProtocolError, codec};

/// Type tag of the initiator's announcement
pub const INITIATE_CHAT: &str = "ic";

/// Type tag of the responder's reply
pub const RESPOND_CHAT: &str = "rc";

/// One side's session announcement.
///
/// Wire form: `pack([session_pk, name, greeting])`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    /// Sender's ephemeral session public key
    pub session_pk: [u8; KEY_SIZE],
    /// Display name
    pub name: String,
    /// Free-form greeting
    pub greeting: String,
}

impl Announcement {
    /// Encode for use as a message payload.
    pub fn encode(&self) -> Vec<u8> {
        codec::pack(&[self.session_pk.as_slice(), self.name.as_bytes(), self.greeting.as_bytes()])
    }

    /// Decode a message payload.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Codec` on framing errors or a part count other than 3
    /// - `ProtocolError::MalformedField` if the key is not 32 bytes or the
    ///   text fields are not UTF-8
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let [session_pk, name, greeting] = codec::unpack_exact::<3>(bytes)?;

        let session_pk = <[u8; KEY_SIZE]>::try_from(session_pk.as_slice()).map_err(|_| {
            ProtocolError::MalformedField {
                field: "session_pk",
                reason: format!("expected {KEY_SIZE} bytes, got {}", session_pk.len()),
            }
        })?;

        Ok(Self { session_pk, name: utf8("name", name)?, greeting: utf8("greeting", greeting)? })
    }
}

fn utf8(field: &'static str, bytes: Vec<u8>) -> Result<String, ProtocolError> {
    String::from_utf8(bytes)
        .map_err(|err| ProtocolError::MalformedField { field, reason: err.to_string() })
}
