// src/miner/algorithm/argon2id.rs
//! Argon2id algorithm implementation
//!
//! Wraps the `argon2` crate with the parameters the authority expects:
//! - time cost 1, parallelism 1, version 0x13
//! - memory cost in KB, supplied per call
//! - 32 or 64 byte output, rendered as hex or as a PHC string

use crate::miner::algorithm::{Algorithm, HashResult};
use crate::types::HashEncoding;
use crate::utils::error::MinerError;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm as Variant, Argon2, Params, Version};

/// Argon2id hash engine
///
/// Stateless apart from its output length and encoding, so one instance is
/// shared by every worker behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Argon2idEngine {
    hash_length: usize,
    encoding: HashEncoding,
}

impl Argon2idEngine {
    /// Iterations per hash, fixed by the protocol
    pub const TIME_COST: u32 = 1;
    /// Lanes per hash, fixed by the protocol
    pub const PARALLELISM: u32 = 1;

    /// Creates an engine producing `hash_length` bytes per hash
    ///
    /// # Errors
    /// [`MinerError::ConfigError`] unless `hash_length` is 32 or 64
    pub fn new(hash_length: usize, encoding: HashEncoding) -> Result<Self, MinerError> {
        if hash_length != 32 && hash_length != 64 {
            return Err(MinerError::ConfigError(format!(
                "hash_length must be 32 or 64 bytes, got {}",
                hash_length
            )));
        }
        Ok(Self {
            hash_length,
            encoding,
        })
    }

    fn hasher(&self, memory_cost: u32) -> Result<Argon2<'static>, MinerError> {
        let params = Params::new(
            memory_cost,
            Self::TIME_COST,
            Self::PARALLELISM,
            Some(self.hash_length),
        )?;
        Ok(Argon2::new(Variant::Argon2id, Version::V0x13, params))
    }
}

impl Algorithm for Argon2idEngine {
    fn hash(&self, key: &str, salt: &[u8], memory_cost: u32) -> Result<HashResult, MinerError> {
        let hasher = self.hasher(memory_cost)?;

        match self.encoding {
            HashEncoding::Hex => {
                let mut output = vec![0u8; self.hash_length];
                hasher.hash_password_into(key.as_bytes(), salt, &mut output)?;
                Ok(HashResult::new(hex::encode(output)))
            }
            HashEncoding::Phc => {
                let salt = SaltString::encode_b64(salt)?;
                let encoded = hasher.hash_password(key.as_bytes(), &salt)?;
                Ok(HashResult::new(encoded.to_string()))
            }
        }
    }

    fn verify(&self, hash: &str, key: &str) -> bool {
        match PasswordHash::new(hash) {
            // Parameters come from the PHC string itself
            Ok(parsed) => Argon2::default()
                .verify_password(key.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                log::debug!("Unparseable hash_to_verify ({}): {}", e, hash);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    const SALT: [u8; 20] = hex!("1234567890abcdef1234567890abcdef12345678");
    const KEY: &str = "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8";
    // Small enough to keep the tests quick, above Argon2's 8 KB floor
    const MEMORY_COST: u32 = 64;

    #[test]
    fn test_hex_output_length() {
        let short = Argon2idEngine::new(32, HashEncoding::Hex).unwrap();
        let long = Argon2idEngine::new(64, HashEncoding::Hex).unwrap();

        let h32 = short.hash(KEY, &SALT, MEMORY_COST).unwrap();
        let h64 = long.hash(KEY, &SALT, MEMORY_COST).unwrap();

        assert_eq!(h32.as_str().len(), 64);
        assert_eq!(h64.as_str().len(), 128);
        assert!(h64.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_is_deterministic() {
        let engine = Argon2idEngine::new(64, HashEncoding::Hex).unwrap();
        let a = engine.hash(KEY, &SALT, MEMORY_COST).unwrap();
        let b = engine.hash(KEY, &SALT, MEMORY_COST).unwrap();
        let other = engine.hash("different key", &SALT, MEMORY_COST).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, other);
    }

    #[test]
    fn test_hex_matches_phc_payload() {
        let hex_engine = Argon2idEngine::new(32, HashEncoding::Hex).unwrap();
        let phc_engine = Argon2idEngine::new(32, HashEncoding::Phc).unwrap();

        let raw = hex_engine.hash(KEY, &SALT, MEMORY_COST).unwrap();
        let phc = phc_engine.hash(KEY, &SALT, MEMORY_COST).unwrap();
        let parsed = PasswordHash::new(phc.as_str()).unwrap();

        assert!(phc.as_str().starts_with("$argon2id$v=19$m=64,t=1,p=1$"));
        assert_eq!(
            hex::encode(parsed.hash.unwrap().as_bytes()),
            raw.as_str(),
            "PHC payload must carry the same bytes as the hex rendering"
        );
    }

    #[test]
    fn test_verify_round_trip() {
        let engine = Argon2idEngine::new(64, HashEncoding::Phc).unwrap();
        let hash = engine.hash(KEY, &SALT, MEMORY_COST).unwrap();

        assert!(engine.verify(hash.as_str(), KEY));
        assert!(!engine.verify(hash.as_str(), "not the key"));
    }

    #[test]
    fn test_verify_rejects_unparseable_hash() {
        let engine = Argon2idEngine::new(64, HashEncoding::Hex).unwrap();
        let hex_hash = engine.hash(KEY, &SALT, MEMORY_COST).unwrap();
        assert!(!engine.verify(hex_hash.as_str(), KEY));
        assert!(!engine.verify("", KEY));
    }

    #[test]
    fn test_invalid_memory_cost_is_hash_error() {
        let engine = Argon2idEngine::new(64, HashEncoding::Hex).unwrap();
        let err = engine.hash(KEY, &SALT, 1).unwrap_err();
        assert!(matches!(err, MinerError::HashComputeError(_)));
    }

    #[test]
    fn test_rejects_unsupported_length() {
        assert!(matches!(
            Argon2idEngine::new(48, HashEncoding::Hex),
            Err(MinerError::ConfigError(_))
        ));
    }
}
