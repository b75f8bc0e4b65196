//! Runtime configuration.

use prism_crypto::CONTEXT_SIZE;

/// Tunables for a [`crate::Prism`] instance.
///
/// Both peers of a session must agree on `kdf_context`; a mismatch makes
/// every encrypted message fail authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrismConfig {
    /// Application tag mixed into every ratchet subkey derivation
    pub kdf_context: [u8; CONTEXT_SIZE],

    /// Largest payload accepted by the send paths, in bytes
    pub max_message_size: usize,

    /// Largest wire buffer accepted by [`crate::Prism::receive_open`], in bytes
    pub max_wire_size: usize,
}

impl PrismConfig {
    /// Default ratchet context tag
    pub const DEFAULT_KDF_CONTEXT: [u8; CONTEXT_SIZE] = *b"PRISMCHT";

    /// Default payload limit of 16 mebibytes
    pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

    /// Headroom for envelope framing, signature, keys and sealing on top of
    /// the payload limit
    pub const WIRE_HEADROOM: usize = 64 * 1024;

    /// Replace the ratchet context tag.
    #[must_use]
    pub fn with_kdf_context(mut self, context: [u8; CONTEXT_SIZE]) -> Self {
        self.kdf_context = context;
        self
    }

    /// Replace the payload limit, keeping the wire limit in step.
    #[must_use]
    pub fn with_max_message_size(mut self, max: usize) -> Self {
        self.max_message_size = max;
        self.max_wire_size = max.saturating_add(Self::WIRE_HEADROOM);
        self
    }
}

impl Default for PrismConfig {
    fn default() -> Self {
        Self {
            kdf_context: Self::DEFAULT_KDF_CONTEXT,
            max_message_size: Self::DEFAULT_MAX_MESSAGE_SIZE,
            max_wire_size: Self::DEFAULT_MAX_MESSAGE_SIZE + Self::WIRE_HEADROOM,
        }
    }
}
