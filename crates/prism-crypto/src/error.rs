//! Error types for primitive operations

use thiserror::Error;

/// Errors from cryptographic primitive operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// AEAD tag mismatch: wrong key, wrong associated data, or tampering
    #[error("authentication failed")]
    Authentication,

    /// Anonymous unseal failed (wrong recipient key or tampered ciphertext)
    #[error("decryption failed")]
    Decryption,

    /// Session key exchange rejected the peer key material
    #[error("key exchange failed: {reason}")]
    KeyExchange {
        /// Why the exchange was rejected
        reason: &'static str,
    },

    /// Key or signature material has the wrong length
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected length in bytes
        expected: usize,
        /// Actual length in bytes
        actual: usize,
    },

    /// Key bytes have the right length but are not a valid key
    #[error("invalid key: {reason}")]
    InvalidKey {
        /// Why the key was rejected
        reason: &'static str,
    },

    /// Text or base64 input could not be decoded
    #[error("invalid encoding: {reason}")]
    InvalidEncoding {
        /// Decoder error message
        reason: String,
    },

    /// Password hashing rejected its parameters
    #[error("password key derivation failed: {reason}")]
    PasswordHash {
        /// Hasher error message
        reason: String,
    },
}

impl CryptoError {
    /// Returns true if this error indicates tampered or misaddressed data
    /// rather than a local misuse of the API.
    pub fn is_integrity_failure(&self) -> bool {
        match self {
            Self::Authentication | Self::Decryption => true,

            Self::KeyExchange { .. }
            | Self::InvalidKeyLength { .. }
            | Self::InvalidKey { .. }
            | Self::InvalidEncoding { .. }
            | Self::PasswordHash { .. } => false,
        }
    }
}

/// Convert a byte slice into a fixed-size array, reporting the length
/// mismatch as [`CryptoError::InvalidKeyLength`].
pub(crate) fn fixed<const N: usize>(bytes: &[u8]) -> Result<[u8; N], CryptoError> {
    bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidKeyLength { expected: N, actual: bytes.len() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tamper_errors_are_integrity_failures() {
        assert!(CryptoError::Authentication.is_integrity_failure());
        assert!(CryptoError::Decryption.is_integrity_failure());
    }

    #[test]
    fn misuse_errors_are_not_integrity_failures() {
        assert!(!CryptoError::InvalidKeyLength { expected: 32, actual: 31 }.is_integrity_failure());
        assert!(!CryptoError::KeyExchange { reason: "low order point" }.is_integrity_failure());
    }

    #[test]
    fn fixed_rejects_wrong_length() {
        let result = fixed::<32>(&[0u8; 31]);
        assert_eq!(result, Err(CryptoError::InvalidKeyLength { expected: 32, actual: 31 }));
    }

    #[test]
    fn error_display() {
        let err = CryptoError::InvalidKeyLength { expected: 32, actual: 16 };
        assert_eq!(err.to_string(), "invalid key length: expected 32, got 16");
    }
}
