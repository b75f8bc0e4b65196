//! Error types for the session manager.

use prism_crypto::CryptoError;
use prism_proto::{ErrorKind, ProtocolError, errors::crypto_kind};
use thiserror::Error;

/// Errors from identity, handshake and send/receive operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Envelope layer failure (codec, signature, AEAD, unseal)
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Key material rejected (bad identity key, failed key exchange)
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// The send counter cannot advance past `u64::MAX`
    #[error("send counter exhausted; establish a new session")]
    CounterExhausted,

    /// Outgoing payload exceeds the configured limit
    #[error("message of {size} bytes exceeds limit of {max}")]
    MessageTooLarge {
        /// Payload size
        size: usize,
        /// Configured limit
        max: usize,
    },

    /// Incoming wire buffer exceeds the configured limit
    #[error("wire buffer of {size} bytes exceeds limit of {max}")]
    WireTooLarge {
        /// Buffer size
        size: usize,
        /// Configured limit
        max: usize,
    },

    /// Opened message was signed by someone other than the session peer
    #[error("message sender does not match the session peer")]
    IdentityMismatch,
}

impl SessionError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Protocol(err) => err.kind(),
            Self::Crypto(err) => crypto_kind(err),
            Self::WireTooLarge { .. } => ErrorKind::MalformedEncoding,
            Self::CounterExhausted | Self::MessageTooLarge { .. } | Self::IdentityMismatch => {
                ErrorKind::Precondition
            },
        }
    }

    /// Returns true if an incoming message should be dropped as forged,
    /// corrupted or misaddressed.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::MalformedEncoding
                | ErrorKind::Authentication
                | ErrorKind::Signature
                | ErrorKind::Decryption
        )
    }
}
