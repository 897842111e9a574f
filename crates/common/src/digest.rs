use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::{Error, Result};

/// SHA-256 content hash used to detect modification of a release definition
/// or its payload between the client write and the deployer read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest(pub [u8; 32]);

impl ContentDigest {
    /// Create a digest from a 32-byte array
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Hash a raw byte sequence
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let hash = Sha256::digest(bytes);
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&hash);
        Self(arr)
    }

    /// Hash the canonical JSON serialization of a value
    ///
    /// Canonical here means whatever `serde_json` emits for the value's type, so
    /// callers must use ordered maps for the output to be reproducible.
    pub fn of_json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let bytes = serde_json::to_vec(value)?;
        Ok(Self::of_bytes(&bytes))
    }

    /// Get the inner bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to lowercase hexadecimal string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a hexadecimal string (either case)
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|_| Error::InvalidDigest)?;
        if bytes.len() != 32 {
            return Err(Error::InvalidDigest);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_known_sha256_vector() {
        let digest = ContentDigest::of_bytes(b"abc");
        assert_eq!(
            digest.to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_from_hex_accepts_uppercase() {
        let digest = ContentDigest::of_bytes(b"userdata");
        let upper = digest.to_hex().to_uppercase();
        assert_eq!(ContentDigest::from_hex(&upper).unwrap(), digest);
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert!(matches!(
            ContentDigest::from_hex("abcd"),
            Err(Error::InvalidDigest)
        ));
        assert!(matches!(
            ContentDigest::from_hex("not hex at all"),
            Err(Error::InvalidDigest)
        ));
    }

    #[test]
    fn test_json_digest_is_order_independent_for_btreemap() {
        let mut a = BTreeMap::new();
        a.insert("web", 1);
        a.insert("api", 2);

        let mut b = BTreeMap::new();
        b.insert("api", 2);
        b.insert("web", 1);

        assert_eq!(
            ContentDigest::of_json(&a).unwrap(),
            ContentDigest::of_json(&b).unwrap()
        );
    }

    #[test]
    fn test_single_byte_change_changes_digest() {
        assert_ne!(
            ContentDigest::of_bytes(b"#!/bin/bash\necho hi"),
            ContentDigest::of_bytes(b"#!/bin/bash\necho ho")
        );
    }
}
