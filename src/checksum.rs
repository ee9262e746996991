//! Schema fingerprints
//!
//! The in-memory registry keys schemas by fingerprint rather than by text so
//! that identical schemas registered under different subjects share one ID.

use sha2::{Digest, Sha256};

/// SHA256 fingerprint of schema text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Checksum([u8; 32]);

impl Checksum {
    /// Fingerprint of the exact text
    pub fn of_text(text: &str) -> Self {
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&Sha256::digest(text.as_bytes()));
        Self(digest)
    }

    /// Fingerprint of a JSON document in canonical form (compact, keys sorted)
    pub fn of_json(value: &serde_json::Value) -> Self {
        Self::of_text(&value.to_string())
    }
}
