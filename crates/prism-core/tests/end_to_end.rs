//! Two-party end-to-end scenarios
//!
//! Alice and Bob share one seeded environment, so every key, nonce and
//! timestamp is reproducible across runs.

use prism_core::{
    Announcement, Endpoints, PersonalKeys, Prism, ReceiveMode, Session, SessionError, handshake,
};
use prism_crypto::{CryptoProvider, DalekProvider, SeededEnv, exchange::Role};
use prism_proto::{ErrorKind, ProtocolError};
use serde::{Deserialize, Serialize};

type TestPrism = Prism<DalekProvider<SeededEnv>>;

fn prism(seed: u64) -> TestPrism {
    Prism::new(DalekProvider::new(SeededEnv::new(seed)))
}

/// Alice and Bob with an established session (Alice initiator).
fn established(prism: &TestPrism) -> (PersonalKeys, Session, PersonalKeys, Session) {
    let alice = prism.create_user(None).unwrap();
    let bob = prism.create_user(None).unwrap();

    let alice_init = prism.initialize_session(&alice, &prism.create_peer(bob.ipk()).unwrap());
    let bob_init = prism.initialize_session(&bob, &prism.create_peer(alice.ipk()).unwrap());
    let alice_pk = *alice_init.session_public();
    let bob_pk = *bob_init.session_public();

    let alice_session = prism.sender_exchange_session(alice_init, &bob_pk).unwrap();
    let bob_session = prism.recipient_exchange_session(bob_init, &alice_pk).unwrap();
    (alice, alice_session, bob, bob_session)
}

#[test]
fn alice_sends_hello_world_to_bob() {
    let prism = prism(1);
    let (alice, mut alice_session, bob, bob_session) = established(&prism);

    let sent = prism.send(&mut alice_session, "Hello World!", "m", None).unwrap();
    assert_eq!(alice_session.tx_count(), 1);

    let opened = prism.receive_open(&bob, &sent.wire).unwrap();
    assert_eq!(opened.message_type, "m");
    assert_eq!(&opened.sender_ipk, alice.ipk());
    assert!(opened.is_encrypted());

    let received = prism.receive_decrypt(&opened, ReceiveMode::Session(&bob_session)).unwrap();
    assert_eq!(received.message.to_text().unwrap(), "Hello World!");
    assert_eq!(received.count, 1);
}

#[test]
fn bob_replies_on_his_own_chain() {
    let prism = prism(2);
    let (alice, alice_session, bob, mut bob_session) = established(&prism);

    let sent = prism.send(&mut bob_session, "Hi Alice", "m", None).unwrap();
    let opened = prism.receive_open(&alice, &sent.wire).unwrap();
    let received = prism.receive_decrypt(&opened, ReceiveMode::Session(&alice_session)).unwrap();

    assert_eq!(received.message.to_text().unwrap(), "Hi Alice");
    assert_eq!(&received.sender_ipk, bob.ipk());
}

#[test]
fn counter_is_monotonic_and_subkeys_are_distinct() {
    const SENDS: u64 = 5;

    let prism = prism(3);
    let (_, mut alice_session, bob, bob_session) = established(&prism);

    let mut counts = Vec::new();
    for i in 0..SENDS {
        let sent = prism.send(&mut alice_session, format!("message {i}"), "m", None).unwrap();
        counts.push(sent.layers.encrypted.count);

        let opened = prism.receive_open(&bob, &sent.wire).unwrap();
        let received = prism.receive_decrypt(&opened, ReceiveMode::Session(&bob_session)).unwrap();
        assert_eq!(received.message.to_text().unwrap(), format!("message {i}"));
    }

    assert_eq!(alice_session.tx_count(), SENDS);
    assert_eq!(counts, (1..=SENDS).collect::<Vec<_>>());

    let context = &prism.config().kdf_context;
    let subkeys: Vec<_> = counts
        .iter()
        .map(|&c| prism.provider().derive_subkey(alice_session.tx(), c, context))
        .collect();
    for (i, a) in subkeys.iter().enumerate() {
        for b in &subkeys[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn messages_can_be_decrypted_out_of_order() {
    // The receiver derives each subkey from the carried counter, so delivery
    // order does not matter.
    let prism = prism(4);
    let (_, mut alice_session, bob, bob_session) = established(&prism);

    let first = prism.send(&mut alice_session, "first", "m", None).unwrap();
    let second = prism.send(&mut alice_session, "second", "m", None).unwrap();

    for (sent, text) in [(second, "second"), (first, "first")] {
        let opened = prism.receive_open(&bob, &sent.wire).unwrap();
        let received = prism.receive_decrypt(&opened, ReceiveMode::Session(&bob_session)).unwrap();
        assert_eq!(received.message.to_text().unwrap(), text);
    }
}

#[test]
fn unencrypted_bootstrap_recovers_exact_fields() {
    let prism = prism(5);
    let (alice, alice_session, bob, _) = established(&prism);

    let announcement = Announcement {
        session_pk: *alice_session.session_public(),
        name: "Alice".to_owned(),
        greeting: "Hello World!".to_owned(),
    };
    let sent = prism.send_unencrypted(&alice_session, announcement.encode(), "m").unwrap();
    assert_eq!(alice_session.tx_count(), 0);

    let opened = prism.receive_open(&bob, &sent.wire).unwrap();
    assert!(!opened.is_encrypted());
    assert_eq!(opened.data(), announcement.encode());
    assert_eq!(&opened.sender_ipk, alice.ipk());

    let received = prism.receive_decrypt(&opened, ReceiveMode::Plaintext).unwrap();
    assert_eq!(Announcement::decode(&received.message.data).unwrap(), announcement);
}

#[test]
fn session_mode_reads_unencrypted_message_as_plaintext() {
    let prism = prism(6);
    let (_, alice_session, bob, bob_session) = established(&prism);

    let sent = prism.send_unencrypted(&alice_session, "Hello World!", "m").unwrap();
    let opened = prism.receive_open(&bob, &sent.wire).unwrap();
    assert!(!opened.is_encrypted());

    let received = prism.receive_decrypt(&opened, ReceiveMode::Session(&bob_session)).unwrap();
    assert_eq!(received.message.to_text().unwrap(), "Hello World!");
    assert_eq!(received.count, 0);
}

#[test]
fn session_mode_still_checks_sender_of_unencrypted_message() {
    let prism = prism(16);
    let (_, alice_session, bob, _) = established(&prism);
    let (_, _, _, unrelated_session) = established(&prism);

    let sent = prism.send_unencrypted(&alice_session, "Hello World!", "m").unwrap();
    let opened = prism.receive_open(&bob, &sent.wire).unwrap();

    let err = prism.receive_decrypt(&opened, ReceiveMode::Session(&unrelated_session)).unwrap_err();
    assert_eq!(err, SessionError::IdentityMismatch);
}

#[test]
fn plaintext_mode_on_encrypted_message_is_a_precondition_error() {
    let prism = prism(7);
    let (_, mut alice_session, bob, _) = established(&prism);

    let sent = prism.send(&mut alice_session, "secret", "m", None).unwrap();
    let opened = prism.receive_open(&bob, &sent.wire).unwrap();

    let err = prism.receive_decrypt(&opened, ReceiveMode::Plaintext).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Precondition);
}

#[test]
fn ic_rc_handshake_establishes_shared_session() {
    let prism = prism(8);
    let alice = prism.create_user(None).unwrap();
    let bob = prism.create_user(None).unwrap();

    // ALICE knows Bob's Ipk
    let alice_init = prism.initialize_session(&alice, &prism.create_peer(bob.ipk()).unwrap());
    let ic = Announcement {
        session_pk: *alice_init.session_public(),
        name: "Alice".to_owned(),
        greeting: "Let's chat.".to_owned(),
    };
    let to_bob = prism.send_unencrypted(&alice_init, ic.encode(), handshake::INITIATE_CHAT).unwrap();

    // BOB learns Alice's Ipk and session pk from the IC message
    let opened = prism.receive_open(&bob, &to_bob.wire).unwrap();
    assert_eq!(opened.message_type, handshake::INITIATE_CHAT);
    let received = prism.receive_decrypt(&opened, ReceiveMode::Plaintext).unwrap();
    let ic_read = Announcement::decode(&received.message.data).unwrap();
    assert_eq!(ic_read, ic);

    let bob_init = prism.initialize_session(&bob, &prism.create_peer(&received.sender_ipk).unwrap());
    let rc = Announcement {
        session_pk: *bob_init.session_public(),
        name: "Bob".to_owned(),
        greeting: "I Agree!".to_owned(),
    };
    let bob_session = prism.recipient_exchange_session(bob_init, &ic_read.session_pk).unwrap();
    let to_alice =
        prism.send_unencrypted(&bob_session, rc.encode(), handshake::RESPOND_CHAT).unwrap();

    // ALICE completes the exchange with Bob's session pk
    let opened = prism.receive_open(&alice, &to_alice.wire).unwrap();
    assert_eq!(opened.message_type, handshake::RESPOND_CHAT);
    let received = prism.receive_decrypt(&opened, ReceiveMode::Plaintext).unwrap();
    let rc_read = Announcement::decode(&received.message.data).unwrap();
    assert_eq!(rc_read, rc);

    let alice_session = prism.sender_exchange_session(alice_init, &rc_read.session_pk).unwrap();

    assert_eq!(alice_session.role(), Role::Initiator);
    assert_eq!(bob_session.role(), Role::Responder);
    assert_eq!(alice_session.tx(), bob_session.rx());
    assert_eq!(alice_session.rx(), bob_session.tx());
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Chat {
    author: String,
    body: String,
    seq: u32,
}

#[test]
fn stream_of_structured_messages() {
    let prism = prism(9);
    let (_, mut alice_session, bob, bob_session) = established(&prism);

    let chats: Vec<Chat> = (0..3)
        .map(|seq| Chat { author: "Alice".into(), body: format!("line {seq}"), seq })
        .collect();

    for chat in &chats {
        let message = prism_proto::Message::from_json(chat).unwrap();
        let sent = prism.send(&mut alice_session, message.data, "m", None).unwrap();
        let opened = prism.receive_open(&bob, &sent.wire).unwrap();
        let received = prism.receive_decrypt(&opened, ReceiveMode::Session(&bob_session)).unwrap();
        assert_eq!(&received.message.to_json::<Chat>().unwrap(), chat);
    }

    assert_eq!(alice_session.tx_count(), 3);
}

#[test]
fn message_for_someone_else_fails_decryption() {
    let prism = prism(10);
    let (alice, mut alice_session, _, _) = established(&prism);

    let sent = prism.send(&mut alice_session, "for bob", "m", None).unwrap();
    let err = prism.receive_open(&alice, &sent.wire).unwrap_err();
    assert_eq!(err, SessionError::Protocol(ProtocolError::Decryption));
    assert!(err.is_rejection());
}

#[test]
fn tampered_wire_leaves_receiver_session_untouched() {
    let prism = prism(11);
    let (_, mut alice_session, bob, bob_session) = established(&prism);
    let before = bob_session.clone();

    let sent = prism.send(&mut alice_session, "Hello World!", "m", None).unwrap();
    let mut wire = sent.wire.clone();
    wire[40] ^= 0x01;

    assert!(prism.receive_open(&bob, &wire).unwrap_err().is_rejection());
    assert_eq!(bob_session, before);

    // The untampered message still decrypts afterwards
    let opened = prism.receive_open(&bob, &sent.wire).unwrap();
    assert!(prism.receive_decrypt(&opened, ReceiveMode::Session(&bob_session)).is_ok());
}

#[test]
fn wrong_session_is_an_identity_mismatch() {
    let prism = prism(12);
    let (_, mut alice_session, bob, _) = established(&prism);
    let (_, _, _, unrelated_session) = established(&prism);

    let sent = prism.send(&mut alice_session, "Hello World!", "m", None).unwrap();
    let opened = prism.receive_open(&bob, &sent.wire).unwrap();

    let err = prism.receive_decrypt(&opened, ReceiveMode::Session(&unrelated_session)).unwrap_err();
    assert_eq!(err, SessionError::IdentityMismatch);
}

#[test]
fn tampered_counter_fails_authentication() {
    // Re-signing with Alice's own key lets the envelope through verification;
    // the AEAD still binds the ciphertext to the original counter.
    let prism = prism(13);
    let (alice, mut alice_session, bob, bob_session) = established(&prism);

    let sent = prism.send(&mut alice_session, "Hello World!", "m", None).unwrap();
    let mut envelope = sent.layers.encrypted.clone();
    envelope.count += 1;
    let wire = envelope
        .pack(prism.provider(), alice.identity())
        .seal(prism.provider(), bob.epk())
        .unwrap()
        .data;

    let opened = prism.receive_open(&bob, &wire).unwrap();
    let err = prism.receive_decrypt(&opened, ReceiveMode::Session(&bob_session)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);
}

#[test]
fn explicit_rewind_still_round_trips() {
    let prism = prism(14);
    let (_, mut alice_session, bob, bob_session) = established(&prism);

    prism.send(&mut alice_session, "one", "m", None).unwrap();
    prism.send(&mut alice_session, "two", "m", None).unwrap();
    let sent = prism.send(&mut alice_session, "rewound", "m", Some(1)).unwrap();
    assert_eq!(alice_session.tx_count(), 1);

    let opened = prism.receive_open(&bob, &sent.wire).unwrap();
    let received = prism.receive_decrypt(&opened, ReceiveMode::Session(&bob_session)).unwrap();
    assert_eq!(received.message.to_text().unwrap(), "rewound");
    assert_eq!(received.count, 1);
}

#[test]
fn mismatched_kdf_context_fails_authentication() {
    let env = SeededEnv::new(15);
    let sender = Prism::new(DalekProvider::new(env.clone()));
    let receiver = Prism::with_config(
        DalekProvider::new(env),
        prism_core::PrismConfig::default().with_kdf_context(*b"OTHERAPP"),
    );
    let (_, mut alice_session, bob, bob_session) = established(&sender);

    let sent = sender.send(&mut alice_session, "Hello World!", "m", None).unwrap();
    let opened = receiver.receive_open(&bob, &sent.wire).unwrap();
    let err = receiver.receive_decrypt(&opened, ReceiveMode::Session(&bob_session)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);
}
