// src/miner/nonce.rs
//! Random key generation
//!
//! Each attempt hashes a fresh key: the SHA-256 hex digest of a random string
//! of 1 to 128 characters drawn from a fixed 76-symbol alphabet.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

/// Symbols a nonce is drawn from: A-Z, a-z, 0-9 and 14 punctuation marks
pub const NONCE_ALPHABET: &[u8; 76] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()-_+=";

/// Longest nonce, in characters
pub const MAX_NONCE_LEN: usize = 128;

/// SHA-256 of `value`, as lowercase hex
pub fn sha256_hex(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}

/// Produces unpredictable keys for the hash engine
///
/// One generator per worker; not shared between threads.
pub struct NonceGenerator {
    rng: StdRng,
}

impl NonceGenerator {
    /// Generator seeded from the operating system's entropy source
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible generator, for tests and benchmarks
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Draws a raw nonce string
    pub fn nonce(&mut self) -> String {
        let len = self.rng.gen_range(1..=MAX_NONCE_LEN);
        (0..len)
            .map(|_| NONCE_ALPHABET[self.rng.gen_range(0..NONCE_ALPHABET.len())] as char)
            .collect()
    }

    /// Draws a nonce and returns its SHA-256 hex digest, the key fed to the hash
    pub fn generate(&mut self) -> String {
        sha256_hex(&self.nonce())
    }
}

impl Default for NonceGenerator {
    fn default() -> Self {
        Self::new()
    }
}
