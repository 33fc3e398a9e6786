//! Content hashing for cache keys.

use sha2::{Digest, Sha256};

/// SHA-256 hex digest over the exact script content.
///
/// Byte-exact on purpose: whitespace or encoding differences produce a
/// different key, and a false miss only costs a re-analysis.
///
/// # Examples
///
/// ```
/// use dramaturge_cache::content_hash;
///
/// let digest = content_hash("INT. OFFICE - DAY");
/// assert_eq!(digest.len(), 64);
/// assert_ne!(digest, content_hash("INT. OFFICE - NIGHT"));
/// ```
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        assert_eq!(content_hash("scene text"), content_hash("scene text"));
    }

    #[test]
    fn test_whitespace_sensitive() {
        assert_ne!(content_hash("scene text"), content_hash("scene  text"));
    }
}
