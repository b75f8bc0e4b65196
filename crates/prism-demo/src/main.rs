//! Prism two-party simulation.
//!
//! Runs the bootstrap handshake between Alice and Bob over an in-memory
//! "wire", then has Alice send a stream of ratcheted messages that Bob opens
//! and decrypts. Every step is logged.
//!
//! # Usage
//!
//! ```bash
//! # Fresh OS randomness
//! prism-demo --messages 5
//!
//! # Reproducible run with wire dumps
//! RUST_LOG=debug prism-demo --seed 42 --show-wire
//! ```

use clap::Parser;
use prism_core::{
    Announcement, Endpoints, PersonalKeys, Prism, PrismConfig, ReceiveMode, Session, SessionError,
    handshake,
};
use prism_crypto::{CONTEXT_SIZE, CryptoProvider, DalekProvider, SeededEnv, SystemEnv};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Prism handshake and chat simulation
#[derive(Parser, Debug)]
#[command(name = "prism-demo")]
#[command(about = "Simulate a Prism session between two parties")]
#[command(version)]
struct Args {
    /// Number of encrypted messages Alice sends after the handshake
    #[arg(short, long, default_value = "3")]
    messages: u32,

    /// Seed for a deterministic run (keys, nonces and clock)
    #[arg(long)]
    seed: Option<u64>,

    /// Ratchet context tag, exactly 8 ASCII bytes
    #[arg(long, default_value = "PRISMCHT", value_parser = parse_context)]
    context: [u8; CONTEXT_SIZE],

    /// Log each wire buffer as base64
    #[arg(long)]
    show_wire: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn parse_context(value: &str) -> Result<[u8; CONTEXT_SIZE], String> {
    <[u8; CONTEXT_SIZE]>::try_from(value.as_bytes())
        .map_err(|_| format!("context must be exactly {CONTEXT_SIZE} bytes, got {}", value.len()))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let config = PrismConfig::default().with_kdf_context(args.context);

    match args.seed {
        Some(seed) => {
            tracing::info!(seed, "Using seeded environment");
            simulate(&Prism::with_config(DalekProvider::new(SeededEnv::new(seed)), config), &args)?;
        },
        None => simulate(&Prism::with_config(DalekProvider::new(SystemEnv::new()), config), &args)?,
    }

    Ok(())
}

fn simulate<P: CryptoProvider>(prism: &Prism<P>, args: &Args) -> Result<(), SessionError> {
    let alice = prism.create_user(None)?;
    let bob = prism.create_user(None)?;
    tracing::info!("Created identities for Alice and Bob");

    let (mut alice_session, bob_session) = bootstrap(prism, &alice, &bob, args)?;
    tracing::info!(
        alice_role = ?alice_session.role(),
        bob_role = ?bob_session.role(),
        "Session established"
    );

    for i in 1..=args.messages {
        let text = format!("Message {i} from Alice");
        let sent = prism.send(&mut alice_session, text.as_str(), "m", None)?;
        log_wire(prism, args, "m", &sent.wire);

        let opened = prism.receive_open(&bob, &sent.wire)?;
        let received = prism.receive_decrypt(&opened, ReceiveMode::Session(&bob_session))?;
        tracing::info!(
            count = received.count,
            timestamp = received.timestamp,
            text = %received.message.to_text()?,
            "Bob received"
        );
    }

    tracing::info!(tx_count = alice_session.tx_count(), "Simulation complete");
    Ok(())
}

/// Run the ic/rc exchange; returns (Alice's session, Bob's session).
fn bootstrap<P: CryptoProvider>(
    prism: &Prism<P>,
    alice: &PersonalKeys,
    bob: &PersonalKeys,
    args: &Args,
) -> Result<(Session, Session), SessionError> {
    // Alice knows only Bob's identity public key
    let alice_init = prism.initialize_session(alice, &prism.create_peer(bob.ipk())?);
    let ic = Announcement {
        session_pk: *alice_init.session_public(),
        name: "Alice".to_owned(),
        greeting: "Let's chat.".to_owned(),
    };
    let to_bob = prism.send_unencrypted(&alice_init, ic.encode(), handshake::INITIATE_CHAT)?;
    log_wire(prism, args, handshake::INITIATE_CHAT, &to_bob.wire);

    // Bob learns Alice's identity and session key from the announcement
    let opened = prism.receive_open(bob, &to_bob.wire)?;
    let received = prism.receive_decrypt(&opened, ReceiveMode::Plaintext)?;
    let ic = Announcement::decode(&received.message.data)?;
    tracing::info!(name = %ic.name, greeting = %ic.greeting, "Bob received initiation");

    let bob_init = prism.initialize_session(bob, &prism.create_peer(&received.sender_ipk)?);
    let rc = Announcement {
        session_pk: *bob_init.session_public(),
        name: "Bob".to_owned(),
        greeting: "I Agree!".to_owned(),
    };
    let bob_session = prism.recipient_exchange_session(bob_init, &ic.session_pk)?;
    let to_alice = prism.send_unencrypted(&bob_session, rc.encode(), handshake::RESPOND_CHAT)?;
    log_wire(prism, args, handshake::RESPOND_CHAT, &to_alice.wire);

    // Alice completes the exchange
    let opened = prism.receive_open(alice, &to_alice.wire)?;
    let received = prism.receive_decrypt(&opened, ReceiveMode::Plaintext)?;
    let rc = Announcement::decode(&received.message.data)?;
    tracing::info!(name = %rc.name, greeting = %rc.greeting, "Alice received response");

    let alice_session = prism.sender_exchange_session(alice_init, &rc.session_pk)?;
    Ok((alice_session, bob_session))
}

fn log_wire<P: CryptoProvider>(prism: &Prism<P>, args: &Args, message_type: &str, wire: &[u8]) {
    if args.show_wire {
        tracing::info!(
            message_type,
            size = wire.len(),
            wire = %prism.provider().to_base64(wire),
            "Wire"
        );
    } else {
        tracing::debug!(message_type, size = wire.len(), "Wire");
    }
}
