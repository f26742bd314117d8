//! SHA-256 digests for audit entries.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;

/// A 32-byte SHA-256 hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash([u8; 32]);

impl Hash {
    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The genesis sentinel: the `previous_hash` of the first entry.
    pub fn genesis() -> Self {
        Hash([0u8; 32])
    }

    /// Check if this is the genesis sentinel.
    pub fn is_genesis(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Convert to hex string for display.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Create from hex string.
    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() != 64 {
            return None;
        }
        let mut bytes = [0u8; 32];
        for (i, chunk) in s.as_bytes().chunks(2).enumerate() {
            let hex_str = std::str::from_utf8(chunk).ok()?;
            bytes[i] = u8::from_str_radix(hex_str, 16).ok()?;
        }
        Some(Hash(bytes))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({}...)", &self.to_hex()[..8])
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Default for Hash {
    fn default() -> Self {
        Hash::genesis()
    }
}

// Hashes travel as hex strings so exported trails stay readable.
impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash::from_hex(&s).ok_or_else(|| serde::de::Error::custom("expected 64 hex characters"))
    }
}

/// Incremental hasher over length-prefixed fields.
pub struct Hasher {
    inner: Sha256,
}

impl Hasher {
    /// Create a new hasher.
    pub fn new() -> Self {
        Hasher {
            inner: Sha256::new(),
        }
    }

    /// Update the hasher with raw data.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Update with one field, prefixed by its length so that adjacent
    /// fields cannot be shifted into each other.
    pub fn update_field(&mut self, data: &[u8]) {
        self.inner.update((data.len() as u64).to_le_bytes());
        self.inner.update(data);
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> Hash {
        let result = self.inner.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&result);
        Hash(bytes)
    }

    /// Hash data directly.
    pub fn hash(data: &[u8]) -> Hash {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finalize()
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        let data = b"hello world";
        assert_eq!(Hasher::hash(data), Hasher::hash(data));
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            Hasher::hash(b"abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hex_roundtrip() {
        let h1 = Hasher::hash(b"test data");
        let h2 = Hash::from_hex(&h1.to_hex()).unwrap();
        assert_eq!(h1, h2);
        assert!(Hash::from_hex("abc").is_none());
        assert!(Hash::from_hex(&"zz".repeat(32)).is_none());
    }

    #[test]
    fn test_genesis() {
        assert!(Hash::genesis().is_genesis());
        assert!(!Hasher::hash(b"test").is_genesis());
    }

    #[test]
    fn test_field_prefix_prevents_shifting() {
        let mut a = Hasher::new();
        a.update_field(b"ab");
        a.update_field(b"c");
        let mut b = Hasher::new();
        b.update_field(b"a");
        b.update_field(b"bc");
        assert_ne!(a.finalize(), b.finalize());
    }

    #[test]
    fn test_serializes_as_hex() {
        let h = Hasher::hash(b"abc");
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, format!("\"{}\"", h.to_hex()));
        let back: Hash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }
}
