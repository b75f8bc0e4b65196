//! Text and base64 conversion helpers

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::error::CryptoError;

/// Encode text as UTF-8 bytes.
pub fn from_text(text: &str) -> Vec<u8> {
    text.as_bytes().to_vec()
}

/// Decode UTF-8 bytes into text.
///
/// # Errors
///
/// - `CryptoError::InvalidEncoding` if the bytes are not valid UTF-8
pub fn to_text(bytes: &[u8]) -> Result<String, CryptoError> {
    String::from_utf8(bytes.to_vec())
        .map_err(|err| CryptoError::InvalidEncoding { reason: err.to_string() })
}

/// Encode bytes as standard padded base64.
pub fn to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode standard padded base64.
///
/// # Errors
///
/// - `CryptoError::InvalidEncoding` if the input is not valid base64
pub fn from_base64(encoded: &str) -> Result<Vec<u8>, CryptoError> {
    STANDARD.decode(encoded).map_err(|err| CryptoError::InvalidEncoding { reason: err.to_string() })
}
