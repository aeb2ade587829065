//! Blake2b hashing for protocol objects.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

type Blake2b256 = Blake2b<U32>;

/// Domain-separated hash of a sequence of fields.
///
/// Each field is prefixed with its length so `["ab", "c"]` and `["a", "bc"]`
/// never collide, and the tag keeps digests of different object kinds apart.
pub fn tagged_hash(tag: &str, fields: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update((tag.len() as u64).to_le_bytes());
    hasher.update(tag.as_bytes());
    for field in fields {
        hasher.update((field.len() as u64).to_le_bytes());
        hasher.update(field);
    }
    hasher.finalize().into()
}
