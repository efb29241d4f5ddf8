//! Source of the per-address nonce byte.
//!
//! The byte only has to differ from one state change to the next often
//! enough for slave firmware to spot fresh commands. It is not a security
//! primitive, so a fast seedable PRNG is plenty.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Produces fresh nonce bytes.
pub trait NonceSource: Send {
    /// Draw a uniformly distributed byte.
    fn next_nonce(&mut self) -> u8;
}

impl<R: RngCore + Send> NonceSource for R {
    fn next_nonce(&mut self) -> u8 {
        self.gen()
    }
}

/// Nonce source seeded from the OS.
pub fn entropy_source() -> ChaCha8Rng {
    ChaCha8Rng::from_entropy()
}

/// Deterministic nonce source, for tests and reproducible captures.
pub fn seeded_source(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}
