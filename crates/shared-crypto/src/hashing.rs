//! # SHA3-256 Hashing
//!
//! Digest used for block content hashes and result hashes.

use crate::canonical::canonical_bytes;
use crate::CryptoError;
use sha3::{Digest, Sha3_256};
use shared_types::{Hash, ProcessingResult};

/// Stateful SHA3-256 hasher.
pub struct Sha3Hasher {
    inner: Sha3_256,
}

impl Sha3Hasher {
    /// Create new hasher.
    pub fn new() -> Self {
        Self {
            inner: Sha3_256::new(),
        }
    }

    /// Update with data.
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update(data);
        self
    }

    /// Finalize and return hash.
    pub fn finalize(self) -> Hash {
        let mut out = [0u8; 32];
        out.copy_from_slice(&self.inner.finalize());
        out
    }
}

impl Default for Sha3Hasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash data with SHA3-256 (one-shot).
pub fn sha3_256(data: &[u8]) -> Hash {
    let mut hasher = Sha3Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Result hash of a processing result: SHA3-256 over its canonical encoding.
///
/// This is the value peers vote on.
pub fn hash_processing_result(result: &ProcessingResult) -> Result<Hash, CryptoError> {
    Ok(sha3_256(&canonical_bytes(result)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{HlcTimestamp, TxResult};

    #[test]
    fn test_sha3_known_vector() {
        // SHA3-256("")
        let expected = "a7ffc6f8bf1ed76651c14756a061d662f580ff4de43b49fa82d80a4b80f8434a";
        assert_eq!(hex::encode(sha3_256(b"")), expected);
    }

    #[test]
    fn test_streaming_matches_oneshot() {
        let oneshot = sha3_256(b"hello world");

        let mut hasher = Sha3Hasher::new();
        hasher.update(b"hello ").update(b"world");
        assert_eq!(hasher.finalize(), oneshot);
    }

    #[test]
    fn test_result_hash_ignores_key_order() {
        let mut a = serde_json::Map::new();
        a.insert("x".into(), 1.into());
        a.insert("y".into(), 2.into());
        let mut b = serde_json::Map::new();
        b.insert("y".into(), 2.into());
        b.insert("x".into(), 1.into());

        let make = |payload: serde_json::Map<String, serde_json::Value>| ProcessingResult {
            hlc_timestamp: HlcTimestamp::new(1, 0),
            tx_result: TxResult {
                tx_hash: [0u8; 32],
                status: 0,
                payload: serde_json::Value::Object(payload),
                state: vec![],
            },
        };

        assert_eq!(
            hash_processing_result(&make(a)).unwrap(),
            hash_processing_result(&make(b)).unwrap()
        );
    }
}
