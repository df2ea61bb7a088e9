use sha2::{Digest, Sha256};

/// Compute the content fingerprint of the raw knowledge-source bytes.
///
/// SHA-256, hex-encoded so it is filesystem-safe as a cache key. Any
/// byte-level change to the source produces a different fingerprint and
/// therefore a cache miss.
pub fn fingerprint(bytes: &[u8]) -> String {
    let hash = Sha256::digest(bytes);
    format!("{hash:x}")
}
