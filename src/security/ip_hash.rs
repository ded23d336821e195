//! Client address anonymization.

use sha2::{Digest, Sha256};

/// SHA-256 of the address, lowercase hex (64 chars).
///
/// Unsalted: the digest only correlates submissions within the rate-limit
/// window and is never used to authenticate anyone.
pub fn hash_ip(address: &str) -> String {
    hex::encode(Sha256::digest(address.as_bytes()))
}
