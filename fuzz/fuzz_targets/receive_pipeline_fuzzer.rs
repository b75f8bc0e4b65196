//! Fuzz target for the receive pipeline (unseal -> verify -> decrypt)
//!
//! # Strategy
//!
//! - Raw bytes: arbitrary buffers straight into `receive_open`
//! - Mutated wire: a valid encrypted message with bytes flipped, truncated
//!   or extended
//!
//! # Invariants
//!
//! - The pipeline never panics
//! - A mutated wire buffer never yields a different plaintext than was sent
//! - A failed receive never changes the receiver's session

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use prism_core::{Endpoints, Prism, ReceiveMode};
use prism_crypto::{DalekProvider, SeededEnv};

#[derive(Debug, Clone, Arbitrary)]
struct Scenario {
    seed: u64,
    payload: Vec<u8>,
    input: WireInput,
}

#[derive(Debug, Clone, Arbitrary)]
enum WireInput {
    RawBytes(Vec<u8>),
    FlipBits { index: u16, mask: u8 },
    Truncate(u16),
    Append(Vec<u8>),
}

fuzz_target!(|scenario: Scenario| {
    let prism = Prism::new(DalekProvider::new(SeededEnv::new(scenario.seed)));

    let Ok(alice) = prism.create_user(None) else { return };
    let Ok(bob) = prism.create_user(None) else { return };
    let alice_init = prism.initialize_session(&alice, &bob.to_peer());
    let bob_init = prism.initialize_session(&bob, &alice.to_peer());
    let alice_pk = *alice_init.session_public();
    let bob_pk = *bob_init.session_public();
    let Ok(mut alice_session) = prism.sender_exchange_session(alice_init, &bob_pk) else { return };
    let Ok(bob_session) = prism.recipient_exchange_session(bob_init, &alice_pk) else { return };
    let before = bob_session.clone();

    let Ok(sent) = prism.send(&mut alice_session, scenario.payload.clone(), "m", None) else {
        return;
    };

    let wire = match scenario.input {
        WireInput::RawBytes(bytes) => bytes,
        WireInput::FlipBits { index, mask } => {
            let mut wire = sent.wire.clone();
            let i = index as usize % wire.len();
            wire[i] ^= mask.max(1);
            wire
        },
        WireInput::Truncate(len) => sent.wire[..len as usize % sent.wire.len()].to_vec(),
        WireInput::Append(extra) => {
            let mut wire = sent.wire.clone();
            wire.extend_from_slice(&extra);
            wire
        },
    };

    let result = prism
        .receive_open(&bob, &wire)
        .and_then(|opened| prism.receive_decrypt(&opened, ReceiveMode::Session(&bob_session)));

    if let Ok(received) = result {
        assert_eq!(received.message.data, scenario.payload, "forged plaintext accepted");
    }
    assert_eq!(bob_session, before, "receive mutated the session");
});
