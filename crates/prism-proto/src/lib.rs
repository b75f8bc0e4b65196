//! Prism wire protocol.
//!
//! A message travels through four layers, each owning the bytes of the layer
//! it wraps:
//!
//! ```text
//! Message ──encrypt──▶ EncryptedMessage ──pack──▶ Package ──seal──▶ SealedPackage
//!    ▲                        │                     │                    │
//!    └───────decrypt──────────┘◀──────unpack────────┘◀──────unseal───────┘
//! ```
//!
//! - [`Message`]: opaque payload bytes
//! - [`EncryptedMessage`]: payload plus nonce, ratchet counter, type tag and
//!   timestamp; `data` is ciphertext unless sent on the unencrypted path
//! - [`Package`]: serialized envelope plus the sender's detached signature
//!   and declared identity key
//! - [`SealedPackage`]: the package sealed anonymously to the recipient; this
//!   is the only thing on the wire
//!
//! Multi-part layers are framed with the [`codec`] module. Every layer
//! operation takes the [`prism_crypto::CryptoProvider`] handle explicitly.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod codec;
pub mod encrypted;
pub mod errors;
pub mod message;
pub mod package;
pub mod sealed;

pub use codec::{pack, unpack};
pub use encrypted::{DecryptMode, EncryptedMessage};
pub use errors::{CodecError, ErrorKind, ProtocolError, Result};
pub use message::{Message, MessageInput, SendMode};
pub use package::Package;
pub use sealed::SealedPackage;
