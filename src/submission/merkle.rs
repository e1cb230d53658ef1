// src/submission/merkle.rs
//! Merkle root over verified records
//!
//! The authority recomputes the root with its own reduction, so this one has
//! to match it exactly:
//! - parents are SHA-256 of the two children's hex *text* concatenated
//! - an odd trailing node is paired with itself
//! - no leaf/node domain separation, leaves keep their input order
//!
//! Only the root is produced; intermediate levels are dropped as soon as the
//! next one is built.

use crate::miner::nonce::sha256_hex;

/// Parent of two nodes: SHA-256 hex of `left ++ right`
pub fn node_hash(left: &str, right: &str) -> String {
    let mut joined = String::with_capacity(left.len() + right.len());
    joined.push_str(left);
    joined.push_str(right);
    sha256_hex(&joined)
}

/// Reduces `leaves` to the root
///
/// A single leaf is its own root. Returns `None` for an empty sequence.
pub fn reduce<S: AsRef<str>>(leaves: &[S]) -> Option<String> {
    let mut level: Vec<String> = leaves.iter().map(|l| l.as_ref().to_owned()).collect();
    if level.is_empty() {
        return None;
    }

    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| match pair {
                [left, right] => node_hash(left, right),
                [single] => node_hash(single, single),
                _ => unreachable!("chunks(2) yields one or two nodes"),
            })
            .collect();
    }
    level.pop()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(s: &str) -> String {
        sha256_hex(s)
    }

    #[test]
    fn test_empty_has_no_root() {
        assert_eq!(reduce::<String>(&[]), None);
    }

    #[test]
    fn test_single_leaf_is_root() {
        let a = leaf("a");
        assert_eq!(reduce(&[a.clone()]).unwrap(), a);
    }

    #[test]
    fn test_two_leaves() {
        let (a, b) = (leaf("a"), leaf("b"));
        let expected = sha256_hex(&format!("{}{}", a, b));
        assert_eq!(reduce(&[a, b]).unwrap(), expected);
    }

    #[test]
    fn test_three_leaves_duplicate_last() {
        let (a, b, c) = (leaf("a"), leaf("b"), leaf("c"));
        let ab = sha256_hex(&format!("{}{}", a, b));
        let cc = sha256_hex(&format!("{}{}", c, c));
        let expected = sha256_hex(&format!("{}{}", ab, cc));
        assert_eq!(reduce(&[a, b, c]).unwrap(), expected);
    }

    #[test]
    fn test_five_leaves_carry_odd_node_up() {
        let leaves: Vec<String> = ["a", "b", "c", "d", "e"].iter().map(|s| leaf(s)).collect();
        let ab = node_hash(&leaves[0], &leaves[1]);
        let cd = node_hash(&leaves[2], &leaves[3]);
        let ee = node_hash(&leaves[4], &leaves[4]);
        let abcd = node_hash(&ab, &cd);
        let eeee = node_hash(&ee, &ee);
        assert_eq!(reduce(&leaves).unwrap(), node_hash(&abcd, &eeee));
    }

    #[test]
    fn test_order_matters_and_is_deterministic() {
        let (a, b) = (leaf("a"), leaf("b"));
        let forward = reduce(&[a.clone(), b.clone()]).unwrap();
        assert_eq!(forward, reduce(&[a.clone(), b.clone()]).unwrap());
        assert_ne!(forward, reduce(&[b, a]).unwrap());
    }

    #[test]
    fn test_text_concatenation_not_bytes() {
        // Hashing decoded bytes would give a different parent
        let (a, b) = (leaf("a"), leaf("b"));
        let mut bytes = hex::decode(&a).unwrap();
        bytes.extend(hex::decode(&b).unwrap());
        let byte_parent = {
            use sha2::{Digest, Sha256};
            hex::encode(Sha256::digest(&bytes))
        };
        assert_ne!(node_hash(&a, &b), byte_parent);
    }
}
