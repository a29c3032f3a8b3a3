//! Sortable unique identifiers.
//!
//! A ULID is 26 characters of Crockford Base32: 10 characters encode a
//! 48-bit millisecond timestamp (most significant bits first) and 16 characters
//! encode 80 bits of randomness. Identifiers minted more than a millisecond
//! apart sort lexicographically by creation time.
//!
//! # Example
//!
//! ```
//! use farmgate_core::ulid;
//!
//! let id = ulid::generate();
//! assert_eq!(id.as_str().len(), 26);
//! assert!(ulid::validate(id.as_str()));
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Crockford Base32 alphabet (no I, L, O, U).
const ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Total encoded length.
pub const ULID_LEN: usize = 26;

const TIME_LEN: usize = 10;
const RANDOM_LEN: usize = 16;
const TIMESTAMP_MASK: u64 = (1 << 48) - 1;
const RANDOM_MASK: u128 = (1 << 80) - 1;

/// Error returned when parsing a string that is not a ULID.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid ULID: {0:?}")]
pub struct InvalidUlid(pub String);

/// A validated, uppercase ULID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ulid(String);

impl Ulid {
    /// Generates a new identifier from the current clock and the thread-local CSPRNG.
    #[must_use]
    pub fn generate() -> Self {
        let randomness = rand::thread_rng().gen::<u128>() & RANDOM_MASK;
        Self::from_parts(now_ms(), randomness)
    }

    /// Encodes an identifier from an explicit timestamp and randomness.
    ///
    /// Only the low 48 bits of `timestamp_ms` and the low 80 bits of
    /// `randomness` are used.
    #[must_use]
    pub fn from_parts(timestamp_ms: u64, randomness: u128) -> Self {
        let mut buf = [0u8; ULID_LEN];

        let mut ts = timestamp_ms & TIMESTAMP_MASK;
        for slot in buf[..TIME_LEN].iter_mut().rev() {
            *slot = ALPHABET[(ts & 0x1f) as usize];
            ts >>= 5;
        }

        let mut rnd = randomness & RANDOM_MASK;
        for slot in buf[TIME_LEN..].iter_mut().rev() {
            *slot = ALPHABET[(rnd & 0x1f) as usize];
            rnd >>= 5;
        }

        // Every byte comes from ALPHABET, which is ASCII.
        Self(buf.iter().map(|&b| char::from(b)).collect())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decodes the millisecond timestamp component.
    #[must_use]
    pub fn timestamp_ms(&self) -> u64 {
        self.0.as_bytes()[..TIME_LEN]
            .iter()
            .filter_map(|&b| decode_char(b))
            .fold(0u64, |acc, v| (acc << 5) | u64::from(v))
    }

    /// Consumes the identifier, returning the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Ulid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Ulid {
    type Err = InvalidUlid;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if validate(s) {
            Ok(Self(s.to_ascii_uppercase()))
        } else {
            Err(InvalidUlid(s.to_string()))
        }
    }
}

impl TryFrom<String> for Ulid {
    type Error = InvalidUlid;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Ulid> for String {
    fn from(id: Ulid) -> Self {
        id.0
    }
}

impl AsRef<str> for Ulid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Generates a new identifier.
#[must_use]
pub fn generate() -> Ulid {
    Ulid::generate()
}

/// Returns `true` if `candidate` is 26 Crockford Base32 characters (case-insensitive).
#[must_use]
pub fn validate(candidate: &str) -> bool {
    candidate.len() == ULID_LEN && candidate.bytes().all(|b| decode_char(b).is_some())
}

/// Returns the uppercased header value if it is a valid ULID, otherwise `fallback()`.
pub fn resolve_incoming<F>(header_value: Option<&str>, fallback: F) -> Ulid
where
    F: FnOnce() -> Ulid,
{
    header_value
        .map(str::trim)
        .and_then(|value| value.parse().ok())
        .unwrap_or_else(fallback)
}

fn decode_char(b: u8) -> Option<u8> {
    let upper = b.to_ascii_uppercase();
    ALPHABET.iter().position(|&c| c == upper).map(|p| p as u8)
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_generate_is_valid() {
        let id = generate();
        assert_eq!(id.as_str().len(), ULID_LEN);
        assert!(validate(id.as_str()));
        assert_eq!(id.as_str(), id.as_str().to_ascii_uppercase());
    }

    #[test]
    fn test_from_parts_zero() {
        let id = Ulid::from_parts(0, 0);
        assert_eq!(id.as_str(), "00000000000000000000000000");
    }

    #[test]
    fn test_from_parts_max() {
        let id = Ulid::from_parts(u64::MAX, u128::MAX);
        assert_eq!(id.as_str(), "7ZZZZZZZZZZZZZZZZZZZZZZZZZ");
    }

    #[test]
    fn test_timestamp_round_trip() {
        let id = Ulid::from_parts(1_469_918_176_385, 42);
        assert_eq!(id.timestamp_ms(), 1_469_918_176_385);
        assert!(id.as_str().starts_with("01ARYZ6S41"));
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        assert!(!validate(""));
        assert!(!validate("01ARYZ6S41"));
        assert!(!validate("01ARYZ6S41TSV4RRFFQ69G5FAVX"));
        // I, L, O and U are not in the alphabet
        assert!(!validate("01ARYZ6S41TSV4RRFFQ69G5FAI"));
        assert!(!validate("01ARYZ6S41TSV4RRFFQ69G5FAL"));
        assert!(!validate("01ARYZ6S41TSV4RRFFQ69G5FAO"));
        assert!(!validate("01ARYZ6S41TSV4RRFFQ69G5FAU"));
        assert!(!validate("01ARYZ6S41TSV4RRFFQ69G5FA-"));
    }

    #[test]
    fn test_validate_is_case_insensitive() {
        assert!(validate("01arYZ6s41tsv4rrffq69g5fav"));
    }

    #[test]
    fn test_resolve_incoming_uppercases_valid_header() {
        let id = resolve_incoming(Some("01arz3ndektsv4rrffq69g5fav"), || {
            panic!("fallback should not run")
        });
        assert_eq!(id.as_str(), "01ARZ3NDEKTSV4RRFFQ69G5FAV");
    }

    #[test]
    fn test_resolve_incoming_falls_back() {
        let fallback = Ulid::from_parts(1, 1);
        assert_eq!(
            resolve_incoming(Some("not-a-ulid"), || fallback.clone()),
            fallback
        );
        assert_eq!(resolve_incoming(None, || fallback.clone()), fallback);
    }

    #[test]
    fn test_parse_and_serde() {
        let id: Ulid = "01arz3ndektsv4rrffq69g5fav".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"01ARZ3NDEKTSV4RRFFQ69G5FAV\"");

        let back: Ulid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<Ulid>("\"nope\"").is_err());
    }

    #[test]
    fn test_concurrent_generation_is_unique() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| (0..500).map(|_| generate()).collect::<Vec<_>>()))
            .collect();
        let mut all: Vec<Ulid> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let total = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), total);
    }

    proptest! {
        #[test]
        fn prop_from_parts_always_validates(ts in 0u64..(1 << 48), rnd in any::<u128>()) {
            let id = Ulid::from_parts(ts, rnd);
            prop_assert!(validate(id.as_str()));
            prop_assert_eq!(id.timestamp_ms(), ts);
        }

        #[test]
        fn prop_later_timestamp_sorts_after(
            ts in 0u64..((1 << 48) - 2),
            gap in 1u64..1000,
            a in any::<u128>(),
            b in any::<u128>(),
        ) {
            let ts2 = (ts + gap).min((1 << 48) - 1);
            let earlier = Ulid::from_parts(ts, a);
            let later = Ulid::from_parts(ts2, b);
            prop_assert!(earlier.as_str() < later.as_str());
        }
    }
}
