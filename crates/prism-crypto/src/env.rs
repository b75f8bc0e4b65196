//! Environment abstraction for deterministic testing.
//!
//! Decouples primitive operations from system resources (wall clock,
//! randomness). Production code uses [`SystemEnv`]; tests and simulations use
//! `SeededEnv` (behind the `test-utils` feature) for reproducible keys, nonces
//! and timestamps.

/// Abstract environment providing randomness and wall-clock time.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `random_bytes()` uses cryptographically secure entropy in production
/// - `wall_clock_millis()` never goes backwards within one environment
pub trait Environment: Clone + Send + Sync + 'static {
    /// Fills the provided buffer with random bytes.
    ///
    /// # Invariants
    ///
    /// - Given the same RNG seed, this produces the same sequence of bytes
    /// - Uses cryptographically secure RNG
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Milliseconds since the Unix epoch.
    fn wall_clock_millis(&self) -> u64;

    /// Fixed-size array of random bytes.
    fn random_array<const N: usize>(&self) -> [u8; N] {
        let mut bytes = [0u8; N];
        self.random_bytes(&mut bytes);
        bytes
    }
}

/// Production environment using the OS RNG and the system clock.
///
/// # Panics
///
/// Panics if the OS RNG fails. Continuing without entropy would compromise
/// every key and nonce produced afterwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer)
            .expect("invariant: OS RNG failure is unrecoverable - keys cannot be generated");
    }

    #[allow(clippy::disallowed_methods)]
    fn wall_clock_millis(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_millis() as u64)
    }
}

#[cfg(feature = "test-utils")]
mod seeded {
    use std::sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    };

    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    use super::Environment;

    /// Deterministic environment for tests.
    ///
    /// A seeded `ChaCha20` RNG plus a virtual clock that starts at a fixed
    /// instant and advances one millisecond per read. Clones share state, so
    /// two parties built from one `SeededEnv` draw from a single stream.
    #[derive(Debug, Clone)]
    pub struct SeededEnv {
        rng: Arc<Mutex<ChaCha20Rng>>,
        clock: Arc<AtomicU64>,
    }

    impl SeededEnv {
        /// Virtual clock origin (2024-01-01T00:00:00Z in Unix milliseconds).
        pub const EPOCH_MILLIS: u64 = 1_704_067_200_000;

        /// Create an environment from a seed.
        #[must_use]
        pub fn new(seed: u64) -> Self {
            Self {
                rng: Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed))),
                clock: Arc::new(AtomicU64::new(Self::EPOCH_MILLIS)),
            }
        }
    }

    impl Environment for SeededEnv {
        fn random_bytes(&self, buffer: &mut [u8]) {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            rng.fill_bytes(buffer);
        }

        fn wall_clock_millis(&self) -> u64 {
            self.clock.fetch_add(1, Ordering::Relaxed)
        }
    }
}

#[cfg(feature = "test-utils")]
pub use seeded::SeededEnv;
