//! Pin computation
//!
//! A pin is `base64(sha256(key_bytes))`. For mobile pinning the input must be
//! the raw key export, never the SPKI wrapper.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};
use sha2::{Digest, Sha256};

/// SHA-256 digest of key bytes, Base64-encoded (standard alphabet, padded)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pin(String);

impl Pin {
    /// Compute the pin of the given key bytes
    pub fn of(key_bytes: &[u8]) -> Self {
        Pin(STANDARD.encode(Sha256::digest(key_bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hex SHA-256 fingerprint, as OpenSSL prints it (used for debug logging)
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
