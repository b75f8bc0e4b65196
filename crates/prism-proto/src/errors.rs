//! Error types for the codec and the envelope layers.

use prism_crypto::CryptoError;
use thiserror::Error;

/// Convenience alias for envelope operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Coarse classification shared by every error in the stack.
///
/// Callers that only need to decide "drop the message" versus "fix the call
/// site" match on this instead of the concrete variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Message content could not be normalized to bytes
    UnsupportedInput,
    /// Framing or a decoded field is invalid
    MalformedEncoding,
    /// AEAD tag did not verify
    Authentication,
    /// Detached signature did not verify
    Signature,
    /// Anonymous sealed box could not be opened
    Decryption,
    /// Peer key material was rejected during session derivation
    KeyExchange,
    /// The operation was called with arguments that contradict its input
    Precondition,
}

/// Framing violations found while unpacking a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Header byte announcing a zero-byte length field
    #[error("zero length-of-length header at offset {offset}")]
    ZeroLengthHeader {
        /// Offset of the header byte
        offset: usize,
    },

    /// Length field cut short by the end of the buffer
    #[error("length field truncated at offset {offset}: need {needed} bytes, have {available}")]
    LengthTruncated {
        /// Offset of the first length byte
        offset: usize,
        /// Bytes announced by the header
        needed: usize,
        /// Bytes left in the buffer
        available: usize,
    },

    /// Declared part length runs past the end of the buffer
    #[error("part truncated at offset {offset}: declared {declared} bytes, have {available}")]
    PartTruncated {
        /// Offset of the first part byte
        offset: usize,
        /// Declared part length
        declared: u64,
        /// Bytes left in the buffer
        available: usize,
    },

    /// Declared part length does not fit in memory
    #[error("length field at offset {offset} overflows")]
    LengthOverflow {
        /// Offset of the first length byte
        offset: usize,
    },

    /// Buffer unpacked cleanly but into the wrong number of parts
    #[error("expected {expected} parts, found {actual}")]
    PartCount {
        /// Parts the layer requires
        expected: usize,
        /// Parts actually present
        actual: usize,
    },
}

/// Errors raised by the envelope layers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Message content kind cannot be encoded
    #[error("unsupported message input: {reason}")]
    UnsupportedInput {
        /// What was rejected
        reason: String,
    },

    /// Codec framing violated
    #[error("malformed encoding: {0}")]
    Codec(#[from] CodecError),

    /// A decoded field has the wrong shape (non-decimal counter, bad nonce
    /// length, invalid UTF-8)
    #[error("malformed {field}: {reason}")]
    MalformedField {
        /// Field name
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// AEAD authentication failed
    #[error("ciphertext authentication failed")]
    Authentication,

    /// Package signature did not verify against the declared sender
    #[error("package signature did not verify")]
    Signature,

    /// Sealed package could not be opened
    #[error("sealed package could not be opened")]
    Decryption,

    /// Operation invoked with arguments that contradict the envelope
    #[error("precondition failed: {reason}")]
    Precondition {
        /// Which precondition was violated
        reason: &'static str,
    },

    /// Other primitive failure (bad key material)
    #[error("crypto error: {0}")]
    Crypto(CryptoError),
}

impl From<CryptoError> for ProtocolError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::Authentication => Self::Authentication,
            CryptoError::Decryption => Self::Decryption,
            other => Self::Crypto(other),
        }
    }
}

impl ProtocolError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedInput { .. } => ErrorKind::UnsupportedInput,
            Self::Codec(_) | Self::MalformedField { .. } => ErrorKind::MalformedEncoding,
            Self::Authentication => ErrorKind::Authentication,
            Self::Signature => ErrorKind::Signature,
            Self::Decryption => ErrorKind::Decryption,
            Self::Precondition { .. } => ErrorKind::Precondition,
            Self::Crypto(err) => crypto_kind(err),
        }
    }

    /// Returns true if the input was forged, corrupted or misaddressed.
    ///
    /// These are the errors a receiver should treat as "drop the message".
    /// Everything else points at the local caller.
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

/// Map a primitive error onto the shared taxonomy.
pub fn crypto_kind(err: &CryptoError) -> ErrorKind {
    match err {
        CryptoError::Authentication => ErrorKind::Authentication,
        CryptoError::Decryption => ErrorKind::Decryption,
        CryptoError::KeyExchange { .. } => ErrorKind::KeyExchange,
        CryptoError::InvalidEncoding { .. } => ErrorKind::MalformedEncoding,
        CryptoError::InvalidKeyLength { .. }
        | CryptoError::InvalidKey { .. }
        | CryptoError::PasswordHash { .. } => ErrorKind::Precondition,
    }
}
