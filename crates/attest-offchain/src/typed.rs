//! Word-packing for typed structured-data hashes.

use attest_core::Address;
use attest_crypto::{hash, Hash};

/// Accumulates `typehash || word || word ...` and hashes the result.
/// Every member occupies one 32-byte word; dynamic members contribute the
/// hash of their contents.
pub(crate) struct StructHasher {
    buf: Vec<u8>,
}

impl StructHasher {
    /// Start a struct whose type string is `type_string`.
    pub(crate) fn new(type_string: &str) -> Self {
        let mut buf = Vec::with_capacity(32 * 10);
        buf.extend_from_slice(&hash(type_string.as_bytes()));
        Self { buf }
    }

    pub(crate) fn word(mut self, word: &[u8; 32]) -> Self {
        self.buf.extend_from_slice(word);
        self
    }

    pub(crate) fn uint(self, value: u64) -> Self {
        let mut word = [0u8; 32];
        word[24..].copy_from_slice(&value.to_be_bytes());
        self.word(&word)
    }

    pub(crate) fn boolean(self, value: bool) -> Self {
        self.uint(value as u64)
    }

    pub(crate) fn address(self, value: &Address) -> Self {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(value.as_bytes());
        self.word(&word)
    }

    /// `bytes` and `string` members are bound by their hash.
    pub(crate) fn dynamic(self, value: &[u8]) -> Self {
        self.word(&hash(value))
    }

    pub(crate) fn finish(self) -> Hash {
        hash(&self.buf)
    }
}

/// `H(0x19 || 0x01 || domainSeparator || structHash)`.
pub(crate) fn signing_digest(domain_separator: &Hash, struct_hash: &Hash) -> Hash {
    let mut buf = Vec::with_capacity(66);
    buf.extend_from_slice(&[0x19, 0x01]);
    buf.extend_from_slice(domain_separator);
    buf.extend_from_slice(struct_hash);
    hash(&buf)
}
