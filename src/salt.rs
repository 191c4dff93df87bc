//! Row-key salting.
//!
//! A salted key is `salt ‖ 0x00 ‖ row`, where `salt` is the first
//! `min(digest width, 4)` bytes of a hash of the row. The transform is
//! one-way: reads salt the caller's key the same way and never strip it.
//!
//! The default hash is [`Xxh32`]. Rows written by deployments that salted
//! with MurmurHash3 are only reachable through [`Murmur3`]; the two layouts
//! cannot share a table, so pick one per store and keep it.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};

use crate::{codec::DELIMITER, model::RowKey};

/// Upper bound on the number of digest bytes used as salt.
pub const MAX_SALT_LEN: usize = 4;

/// Hash function feeding the salt.
pub trait SaltHash: Send + Sync {
    /// Digest of `input`. Its leading bytes become the salt.
    fn digest(&self, input: &[u8]) -> Vec<u8>;
}

/// xxHash32, the default salt source.
#[derive(Clone, Copy, Debug, Default)]
pub struct Xxh32 {
    seed: u32,
}

impl Xxh32 {
    pub fn with_seed(seed: u32) -> Self {
        Self { seed }
    }
}

impl SaltHash for Xxh32 {
    fn digest(&self, input: &[u8]) -> Vec<u8> {
        xxhash_rust::xxh32::xxh32(input, self.seed)
            .to_be_bytes()
            .to_vec()
    }
}

/// MurmurHash3 x86 32-bit, digest bytes least significant first.
///
/// Matches the salt written by JVM clients hashing with Guava's
/// `Hashing.murmur3_32()`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Murmur3 {
    seed: u32,
}

impl Murmur3 {
    pub fn with_seed(seed: u32) -> Self {
        Self { seed }
    }
}

impl SaltHash for Murmur3 {
    fn digest(&self, mut input: &[u8]) -> Vec<u8> {
        // Reading from a slice cannot fail.
        murmur3::murmur3_32(&mut input, self.seed)
            .unwrap_or_default()
            .to_le_bytes()
            .to_vec()
    }
}

/// CRC-32 (IEEE) digest.
#[derive(Clone, Copy, Debug, Default)]
pub struct Crc32;

impl SaltHash for Crc32 {
    fn digest(&self, input: &[u8]) -> Vec<u8> {
        crc32fast::hash(input).to_be_bytes().to_vec()
    }
}

/// Salt `row` with `hash`.
pub fn salt_row_key(row: &[u8], hash: &dyn SaltHash) -> Bytes {
    let digest = hash.digest(row);
    let salt = &digest[..digest.len().min(MAX_SALT_LEN)];
    let mut out = BytesMut::with_capacity(salt.len() + DELIMITER.len() + row.len());
    out.extend_from_slice(salt);
    out.extend_from_slice(DELIMITER);
    out.extend_from_slice(row);
    out.freeze()
}

/// Shared salting strategy held by a [`Context`](crate::Context).
#[derive(Clone)]
pub struct RowKeySalter {
    hash: Arc<dyn SaltHash>,
}

impl Default for RowKeySalter {
    fn default() -> Self {
        Self::new(Arc::new(Xxh32::default()))
    }
}

impl RowKeySalter {
    pub fn new(hash: Arc<dyn SaltHash>) -> Self {
        Self { hash }
    }

    /// Salted form of `row`.
    pub fn salt(&self, row: &RowKey) -> Bytes {
        salt_row_key(row.as_bytes(), self.hash.as_ref())
    }
}

impl std::fmt::Debug for RowKeySalter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowKeySalter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    struct Wide;

    impl SaltHash for Wide {
        fn digest(&self, input: &[u8]) -> Vec<u8> {
            let mut out = vec![0xAB; 16];
            out[0] = input.len() as u8;
            out
        }
    }

    struct Narrow;

    impl SaltHash for Narrow {
        fn digest(&self, _input: &[u8]) -> Vec<u8> {
            vec![7, 9]
        }
    }

    #[test]
    fn salted_key_keeps_original_suffix() {
        for hash in [&Xxh32::default() as &dyn SaltHash, &Crc32, &Murmur3::default()] {
            for row in [&b""[..], b"r", b"row-000123", &[0u8, 1, 2, 255]] {
                let salted = salt_row_key(row, hash);
                assert_eq!(salted.len(), row.len() + MAX_SALT_LEN + 1);
                assert_eq!(salted[MAX_SALT_LEN], 0);
                assert_eq!(&salted[MAX_SALT_LEN + 1..], row);
            }
        }
    }

    #[test]
    fn salt_width_is_capped() {
        let salted = salt_row_key(b"abc", &Wide);
        assert_eq!(&salted[..], &[3, 0xAB, 0xAB, 0xAB, 0, b'a', b'b', b'c']);

        let salted = salt_row_key(b"abc", &Narrow);
        assert_eq!(&salted[..], &[7, 9, 0, b'a', b'b', b'c']);
    }

    #[test]
    fn murmur3_salt_matches_jvm_layout() {
        let hash = Murmur3::default();
        assert_eq!(hash.digest(b""), vec![0, 0, 0, 0]);
        assert_eq!(hash.digest(b"hello"), 0x248b_fa47u32.to_le_bytes().to_vec());

        let salted = salt_row_key(b"hello", &hash);
        assert_eq!(
            &salted[..],
            &[0x47, 0xFA, 0x8B, 0x24, 0, b'h', b'e', b'l', b'l', b'o']
        );
        assert_ne!(salted, salt_row_key(b"hello", &Xxh32::default()));
    }

    #[test]
    fn distinct_digests_give_distinct_prefixes() {
        let hash = Xxh32::default();
        let mut digests = HashSet::new();
        let mut prefixes = HashSet::new();
        for i in 0..500u32 {
            let row = format!("user-{i}");
            digests.insert(hash.digest(row.as_bytes()));
            let salted = salt_row_key(row.as_bytes(), &hash);
            prefixes.insert(salted.slice(..MAX_SALT_LEN));
        }
        assert_eq!(digests.len(), prefixes.len());
    }

    #[test]
    fn salting_is_deterministic() {
        let salter = RowKeySalter::default();
        let row = RowKey::from("hot-key");
        assert_eq!(salter.salt(&row), salter.salt(&row));
        assert_eq!(
            salter.salt(&row),
            salt_row_key(b"hot-key", &Xxh32::with_seed(0))
        );
    }
}
