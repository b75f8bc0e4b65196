//! Prism session manager.
//!
//! Two parties establish a session through an asymmetric key exchange, then
//! exchange signed, sealed and (after the handshake) forward-ratcheted
//! messages.
//!
//! # Lifecycle
//!
//! ```text
//! create_user / create_peer
//!         │
//!         ▼
//! initialize_session ──▶ SessionInit ──send_unencrypted──▶ announce session pk
//!         │
//!         ▼ sender_exchange_session (initiator)
//!           recipient_exchange_session (responder)
//!      Session ──send──▶ wire ──receive_open──▶ Opened ──receive_decrypt──▶ Received
//! ```
//!
//! # Ratchet
//!
//! Every encrypted send derives a one-shot subkey from the session's `tx` key
//! and a counter. The receiver derives the same subkey from its `rx` key and
//! the counter carried in the envelope. The counter is authenticated as AEAD
//! associated data.
//!
//! # Concurrency
//!
//! [`Prism`] is immutable after construction. `send` takes `&mut Session`, so
//! the borrow checker serializes sends on one session; receives only read it.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod handshake;
pub mod identity;
pub mod prism;
pub mod session;

pub use config::PrismConfig;
pub use error::SessionError;
pub use handshake::Announcement;
pub use identity::{PeerKeys, PersonalKeys};
pub use prism::{Layers, Opened, Prism, ReceiveMode, Received, Result, Sent};
pub use session::{Endpoints, Session, SessionInit};
