// src/miner/matcher.rs
//! Target pattern detection
//!
//! Classifies a rendered hash against the published targets. Only the last
//! [`TAIL_WINDOW`] characters are searched; `XEN11` is checked before `XUNI`
//! and the first rule that fires wins.

use crate::types::{MatchKind, Target};
use chrono::{Local, Timelike};

/// Number of trailing characters searched for target patterns
pub const TAIL_WINDOW: usize = 87;

/// Minimum uppercase letters in the final segment for a superblock
pub const SUPERBLOCK_UPPERCASE: usize = 50;

/// Rule evaluation order; must not change
const TARGETS: [Target; 2] = [Target::Xen11, Target::Xuni];

/// Result of classifying one hash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    /// Rule that fired
    pub target: Target,
    /// Standard or superblock
    pub kind: MatchKind,
}

/// Checks hashes against the `XEN11` and `XUNI` rules
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchDetector;

impl MatchDetector {
    /// Creates a detector
    pub fn new() -> Self {
        Self
    }

    /// Classifies `hash` using the local wall clock for the `XUNI` window
    pub fn check(&self, hash: &str) -> Option<Detection> {
        self.check_at(hash, Local::now().minute())
    }

    /// Classifies `hash` as if the current minute-of-hour were `minute`
    pub fn check_at(&self, hash: &str, minute: u32) -> Option<Detection> {
        let tail = tail(hash);

        for target in TARGETS {
            if !tail.contains(target.pattern()) {
                continue;
            }
            match target {
                Target::Xen11 => {
                    return Some(Detection {
                        target,
                        kind: classify_xen11(hash),
                    });
                }
                Target::Xuni => {
                    if has_xuni_digit(hash) && in_xuni_window(minute) {
                        return Some(Detection {
                            target,
                            kind: MatchKind::Standard,
                        });
                    }
                }
            }
        }
        None
    }
}

/// Last [`TAIL_WINDOW`] characters of `hash` (all of it when shorter)
fn tail(hash: &str) -> &str {
    match hash.char_indices().rev().nth(TAIL_WINDOW - 1) {
        Some((idx, _)) => &hash[idx..],
        None => hash,
    }
}

/// `XUNI` followed directly by a decimal digit, anywhere in the hash
fn has_xuni_digit(hash: &str) -> bool {
    hash.match_indices("XUNI").any(|(idx, _)| {
        hash[idx + 4..]
            .bytes()
            .next()
            .is_some_and(|b| b.is_ascii_digit())
    })
}

/// Ten minute publishing window straddling each hour boundary
fn in_xuni_window(minute: u32) -> bool {
    minute < 5 || minute >= 55
}

fn classify_xen11(hash: &str) -> MatchKind {
    let last_segment = hash.rsplit('$').next().unwrap_or(hash);
    let uppercase = last_segment
        .chars()
        .filter(|c| c.is_ascii_uppercase())
        .count();

    if uppercase >= SUPERBLOCK_UPPERCASE {
        MatchKind::Superblock
    } else {
        MatchKind::Standard
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn padded(body: &str) -> String {
        format!("{}{}", "0".repeat(100), body)
    }

    #[test]
    fn test_xen11_standard() {
        let hash = padded("abcXYZXEN11ABdef");
        let found = MatchDetector::new().check_at(&hash, 30).unwrap();
        assert_eq!(found.target, Target::Xen11);
        assert_eq!(found.kind, MatchKind::Standard);
    }

    #[test]
    fn test_xen11_superblock() {
        let uppercase_run = "Q".repeat(50);
        let hash = format!("$argon2id$v=19$m=8,t=1,p=1$salt$XEN11{}", uppercase_run);
        let found = MatchDetector::new().check_at(&hash, 30).unwrap();
        assert_eq!(found.kind, MatchKind::Superblock);
    }

    #[test]
    fn test_superblock_counts_only_final_segment() {
        // 60 uppercase letters before the last `$`, only a few after it
        let hash = format!("{}$abXEN11cd", "Z".repeat(60));
        let found = MatchDetector::new().check_at(&hash, 0).unwrap();
        assert_eq!(found.kind, MatchKind::Standard);
    }

    #[test]
    fn test_xen11_outside_tail_is_ignored() {
        let hash = format!("XEN11{}", "0".repeat(TAIL_WINDOW));
        assert_eq!(MatchDetector::new().check_at(&hash, 0), None);

        let hash = format!("XEN11{}", "0".repeat(TAIL_WINDOW - 5));
        assert!(MatchDetector::new().check_at(&hash, 0).is_some());
    }

    #[test]
    fn test_xuni_time_gate() {
        let hash = padded("abcXUNI7def");
        let detector = MatchDetector::new();

        let found = detector.check_at(&hash, 57).unwrap();
        assert_eq!(found.target, Target::Xuni);
        assert_eq!(found.kind, MatchKind::Standard);

        assert_eq!(detector.check_at(&hash, 30), None);
        assert!(detector.check_at(&hash, 0).is_some());
        assert!(detector.check_at(&hash, 4).is_some());
        assert_eq!(detector.check_at(&hash, 5), None);
        assert_eq!(detector.check_at(&hash, 54), None);
        assert!(detector.check_at(&hash, 55).is_some());
    }

    #[test]
    fn test_xuni_requires_digit() {
        let hash = padded("abcXUNIxdef");
        assert_eq!(MatchDetector::new().check_at(&hash, 57), None);
    }

    #[test]
    fn test_xuni_digit_may_sit_outside_tail() {
        // Digit form appears early in the hash, bare XUNI in the tail
        let hash = format!("XUNI3{}XUNIx", "0".repeat(100));
        assert!(MatchDetector::new().check_at(&hash, 58).is_some());
    }

    #[test]
    fn test_xen11_wins_over_xuni() {
        let hash = padded("XUNI1aaXEN11bb");
        let found = MatchDetector::new().check_at(&hash, 59).unwrap();
        assert_eq!(found.target, Target::Xen11);
    }

    #[test]
    fn test_plain_hex_never_matches() {
        let hash = "ab".repeat(64);
        assert_eq!(MatchDetector::new().check_at(&hash, 0), None);
    }
}
