// hasher.rs — Line hashing for the audit hash chain.
//
// Without a key, each link is the plain SHA-256 of the previous raw line.
// With a key (the governor's master key), each link is HMAC-SHA256, so an
// attacker who can edit the file cannot recompute a valid chain.

use ring::hmac;
use sha2::{Digest, Sha256};

/// Hash arbitrary bytes, returning a lowercase hex-encoded SHA-256 string.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Hash a UTF-8 string, returning a lowercase hex-encoded SHA-256 string.
pub fn hash_str(s: &str) -> String {
    hash_bytes(s.as_bytes())
}

/// Computes chain links, keyed or unkeyed.
#[derive(Clone)]
pub struct ChainHasher {
    key: Option<hmac::Key>,
}

impl ChainHasher {
    /// Plain SHA-256 links.
    pub fn unkeyed() -> Self {
        Self { key: None }
    }

    /// HMAC-SHA256 links under `key`.
    pub fn keyed(key: &[u8]) -> Self {
        Self {
            key: Some(hmac::Key::new(hmac::HMAC_SHA256, key)),
        }
    }

    pub fn is_keyed(&self) -> bool {
        self.key.is_some()
    }

    /// The link value for a raw log line.
    pub fn link(&self, line: &str) -> String {
        match &self.key {
            Some(key) => to_hex(hmac::sign(key, line.as_bytes()).as_ref()),
            None => hash_str(line),
        }
    }
}

impl std::fmt::Debug for ChainHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainHasher")
            .field("keyed", &self.is_keyed())
            .finish()
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
