//! Canonical serialization for deterministic hashing.
//!
//! Passage fingerprints and policy hashes are computed over canonical
//! JSON bytes, so the same graph always hashes the same.
//!
//! ## Determinism Guarantees
//!
//! - Stable field order: Struct fields serialize in declaration order
//! - Stable Vec order: Node and edge listings are emitted in canonical order
//! - No HashMap allowed: Use BTreeMap for maps in hashed data

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

/// Serialize a value to canonical JSON bytes for hashing.
///
/// # Panics
///
/// Only for types whose `Serialize` impl can fail (non-string map keys);
/// every hashed type in this crate serializes infallibly.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).expect("Canonical serialization failed")
}

/// Compute canonical hash of a serializable value.
pub fn canonical_hash<T: Serialize>(value: &T) -> u64 {
    let bytes = to_canonical_bytes(value);
    xxh64(&bytes, 0)
}

/// Compute canonical hash and return as hex string.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> String {
    format!("{:016x}", canonical_hash(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EdgeTag, TagSuffix};

    #[test]
    fn test_determinism() {
        let tag = EdgeTag::with_suffix("A", TagSuffix::Down);

        let h1 = canonical_hash(&tag);
        let h2 = canonical_hash(&tag.clone());
        assert_eq!(h1, h2);
        assert_eq!(canonical_hash_hex(&tag).len(), 16);
    }

    #[test]
    fn test_suffix_changes_hash() {
        let mut tag = EdgeTag::with_suffix("A", TagSuffix::Down);
        let before = canonical_hash(&tag);
        tag.strip();
        assert_ne!(before, canonical_hash(&tag));
    }
}
