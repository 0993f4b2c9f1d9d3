//! Shared-secret verification for the upload endpoint.
//!
//! This is a placeholder for a real authentication scheme: a single secret shared
//! between the server and every client, carried as a multipart form field.

use sha2::{Digest, Sha256};

/// Check a client-supplied secret against the configured one.
///
/// Both values are hashed first so the comparison always runs over two
/// fixed-size digests, independent of secret length or a common prefix.
pub fn verify_api_key(provided: &str, expected: &str) -> bool {
    Sha256::digest(provided.as_bytes()) == Sha256::digest(expected.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_matching_secret() {
        assert!(verify_api_key("hunter2", "hunter2"));
    }

    #[test]
    fn rejects_wrong_secret() {
        assert!(!verify_api_key("hunter", "hunter2"));
        assert!(!verify_api_key("", "hunter2"));
        assert!(!verify_api_key("hunter2 ", "hunter2"));
    }
}
