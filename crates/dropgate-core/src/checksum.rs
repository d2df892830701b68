//! Content checksums.
//!
//! SHA-256 over the raw (pre-encryption) bytes, hex-encoded. The digest
//! doubles as the deduplication key: two uploads with the same digest share
//! one physical blob.

use sha2::{Digest, Sha256};

/// Length of a hex-encoded SHA-256 digest.
pub const CHECKSUM_HEX_LEN: usize = 64;

/// Compute the lowercase hex SHA-256 digest of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(digest)
}
