//! Session handshake state.
//!
//! ```text
//! initialize_session        *_exchange_session
//!   ──────────▶ SessionInit ──────────────────▶ Session
//!              (pk, sk)                         (pk, sk, tx, rx, tx_count)
//! ```
//!
//! `SessionInit` has no `tx`/`rx` fields at all, so an encrypted send before
//! the exchange completes does not type-check. Only unencrypted bootstrap
//! messages can be sent from it.

use prism_crypto::{ExchangeKeyPair, KEY_SIZE, SessionKeys, SymmetricKey, exchange::Role};

use crate::identity::{PeerKeys, PersonalKeys};

/// Who is talking to whom. Implemented by both handshake states so the
/// unencrypted send path accepts either.
pub trait Endpoints {
    /// Our own keys
    fn personal(&self) -> &PersonalKeys;

    /// The peer's public keys
    fn peer(&self) -> &PeerKeys;

    /// Our ephemeral session public key, announced during the handshake
    fn session_public(&self) -> &[u8; KEY_SIZE];
}

/// A session attempt whose key exchange has not completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInit {
    pub(crate) personal: PersonalKeys,
    pub(crate) peer: PeerKeys,
    pub(crate) exchange: ExchangeKeyPair,
}

impl SessionInit {
    /// Send counter before the exchange; always 0.
    pub fn tx_count(&self) -> u64 {
        0
    }
}

impl Endpoints for SessionInit {
    fn personal(&self) -> &PersonalKeys {
        &self.personal
    }

    fn peer(&self) -> &PeerKeys {
        &self.peer
    }

    fn session_public(&self) -> &[u8; KEY_SIZE] {
        &self.exchange.public
    }
}

/// An established session.
///
/// # Invariants
///
/// - For honest peers A and B of one session: `A.tx == B.rx`, `A.rx == B.tx`
/// - `tx_count` is the last counter used to derive a send subkey. Only the
///   send path moves it, and only after a send succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub(crate) personal: PersonalKeys,
    pub(crate) peer: PeerKeys,
    pub(crate) exchange: ExchangeKeyPair,
    pub(crate) keys: SessionKeys,
    pub(crate) tx_count: u64,
    pub(crate) role: Role,
}

impl Session {
    /// Base key for outgoing messages.
    pub fn tx(&self) -> &SymmetricKey {
        &self.keys.tx
    }

    /// Base key for incoming messages.
    pub fn rx(&self) -> &SymmetricKey {
        &self.keys.rx
    }

    /// Last counter used for a send subkey (0 before the first send).
    pub fn tx_count(&self) -> u64 {
        self.tx_count
    }

    /// Which side of the handshake we took.
    pub fn role(&self) -> Role {
        self.role
    }
}

impl Endpoints for Session {
    fn personal(&self) -> &PersonalKeys {
        &self.personal
    }

    fn peer(&self) -> &PeerKeys {
        &self.peer
    }

    fn session_public(&self) -> &[u8; KEY_SIZE] {
        &self.exchange.public
    }
}
