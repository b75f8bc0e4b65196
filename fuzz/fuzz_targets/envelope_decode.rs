//! Fuzz target for the envelope decoders
//!
//! Arbitrary bytes through `EncryptedMessage::deserialize`,
//! `Package::deserialize` and `Announcement::decode`. None may panic, and a
//! decoded envelope must keep the nonce invariant (0 or 24 bytes).

#![no_main]

use libfuzzer_sys::fuzz_target;
use prism_core::Announcement;
use prism_crypto::AEAD_NONCE_SIZE;
use prism_proto::{EncryptedMessage, Package};

fuzz_target!(|data: &[u8]| {
    if let Ok(envelope) = EncryptedMessage::deserialize(data) {
        assert!(envelope.nonce.is_empty() || envelope.nonce.len() == AEAD_NONCE_SIZE);
        assert_eq!(EncryptedMessage::deserialize(&envelope.encode()).ok(), Some(envelope));
    }

    if let Ok(package) = Package::deserialize(data) {
        assert_eq!(Package::deserialize(&package.serialize()).ok(), Some(package));
    }

    let _ = Announcement::decode(data);
});
