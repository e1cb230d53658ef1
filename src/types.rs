// src/types.rs
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Textual rendering of an Argon2id output
///
/// Matching always runs on the rendered text, so the encoding decides which
/// characters the target patterns are searched in.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashEncoding {
    /// Lowercase hex of the raw output (64 or 128 characters)
    #[default]
    #[clap(name = "hex")]
    Hex,

    /// PHC string: `$argon2id$v=19$m=<kb>,t=1,p=1$<salt b64>$<hash b64>`
    ///
    /// This is the form the authority can re-verify against a key.
    #[clap(name = "phc")]
    Phc,
}

impl fmt::Display for HashEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashEncoding::Hex => write!(f, "hex"),
            HashEncoding::Phc => write!(f, "phc"),
        }
    }
}

impl FromStr for HashEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hex" => Ok(HashEncoding::Hex),
            "phc" | "encoded" => Ok(HashEncoding::Phc),
            _ => Err(format!("Unknown hash encoding: {}", s)),
        }
    }
}

/// Published reward pattern that a hash matched
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    /// `XEN11` anywhere in the trailing window, accepted at any time
    Xen11,
    /// `XUNI<digit>`, accepted only inside the publishing window around the hour
    Xuni,
}

impl Target {
    /// The substring searched for in the trailing window
    pub fn pattern(self) -> &'static str {
        match self {
            Target::Xen11 => "XEN11",
            Target::Xuni => "XUNI",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pattern())
    }
}

/// Reward class of a match
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchKind {
    /// Regular block
    Standard,
    /// `XEN11` hash whose final segment carries at least 50 uppercase letters
    Superblock,
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchKind::Standard => write!(f, "standard"),
            MatchKind::Superblock => write!(f, "superblock"),
        }
    }
}

/// A hash that satisfied one of the target rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Which rule fired
    pub target: Target,
    /// Standard or superblock
    pub kind: MatchKind,
    /// The rendered hash text, sent as `hash_to_verify`
    pub hash: String,
    /// The key (SHA-256 hex of the nonce) that produced the hash
    pub key: String,
    /// Attempts the worker had made when it found this hash
    pub attempts: u64,
    /// Worker that found the hash
    pub worker_id: usize,
}

impl Match {
    /// Identity used to key the submission task for this match
    pub fn id(&self) -> &str {
        &self.hash
    }

    /// Trailing part of the hash, short enough for log lines
    pub fn short_id(&self) -> &str {
        let start = self.hash.len().saturating_sub(16);
        &self.hash[start..]
    }
}

/// A previously mined record returned by the authority's last-block endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    /// Authority-assigned block number
    pub block_id: u64,
    /// Hash that was submitted for the block
    pub hash_to_verify: String,
    /// Key that produced `hash_to_verify`
    pub key: String,
    /// Account credited with the block
    pub account: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_parse_and_display() {
        assert_eq!("HEX".parse::<HashEncoding>().unwrap(), HashEncoding::Hex);
        assert_eq!("phc".parse::<HashEncoding>().unwrap(), HashEncoding::Phc);
        assert!("base64".parse::<HashEncoding>().is_err());
        assert_eq!(HashEncoding::Phc.to_string(), "phc");
    }

    #[test]
    fn test_block_record_wire_shape() {
        let json = r#"{"block_id": 1234, "hash_to_verify": "$argon2id$x", "key": "ab", "account": "0x01"}"#;
        let record: BlockRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.block_id, 1234);
        assert_eq!(record.hash_to_verify, "$argon2id$x");
    }

    #[test]
    fn test_short_id_is_hash_tail() {
        let m = Match {
            target: Target::Xen11,
            kind: MatchKind::Standard,
            hash: "0123456789abcdefXEN11ffffffffffff".into(),
            key: "k".into(),
            attempts: 1,
            worker_id: 0,
        };
        assert_eq!(m.short_id(), "EN11ffffffffffff");
        assert_eq!(m.id(), m.hash);
    }
}
