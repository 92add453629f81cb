use std::hash::Hasher;

use sha2::{Digest, Sha256};
use siphasher::sip::SipHasher;

/// Capability used by the ring for all hashing: a pure, deterministic mapping from a
/// string to a point in the unsigned 64-bit hash space.
///
/// The same function places virtual nodes and locates keys. Implementations must be
/// effectively uniform over the output space; collisions are expected and handled by
/// the ring, not an error.
///
/// Any `Fn(&str) -> u64` closure implements this trait, which is the easiest way to
/// inject a deterministic hasher in tests.
pub trait KeyHasher {
    fn hash_key(&self, key: &str) -> u64;
}

impl<F> KeyHasher for F
where
    F: Fn(&str) -> u64,
{
    fn hash_key(&self, key: &str) -> u64 {
        self(key)
    }
}

/// Default hasher: SHA-256 of the UTF-8 key, first 8 bytes of the digest interpreted
/// as a big-endian u64.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Sha256Hasher;

impl KeyHasher for Sha256Hasher {
    fn hash_key(&self, key: &str) -> u64 {
        let digest = Sha256::digest(key.as_bytes());
        u64::from_be_bytes(digest[..8].try_into().unwrap())
    }
}

/// Alternate hash family backed by SipHash-2-4.
///
/// Much cheaper than [`Sha256Hasher`] and keyed, so two rings can be given
/// independent placements of the same node set.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SipKeyHasher {
    key0: u64,
    key1: u64,
}

impl SipKeyHasher {
    pub fn new() -> SipKeyHasher {
        SipKeyHasher::default()
    }

    pub fn with_keys(key0: u64, key1: u64) -> SipKeyHasher {
        SipKeyHasher { key0, key1 }
    }
}

impl KeyHasher for SipKeyHasher {
    fn hash_key(&self, key: &str) -> u64 {
        let mut hasher = SipHasher::new_with_keys(self.key0, self.key1);
        hasher.write(key.as_bytes());
        hasher.finish()
    }
}
