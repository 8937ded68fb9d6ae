//! SHA-256 digests and content fingerprints

use sha2::{Digest, Sha256};

/// Number of hex characters kept for a fingerprint (128 bits)
pub const FINGERPRINT_HEX_LEN: usize = 32;

/// Full SHA-256 hex digest of a byte slice
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// First 128 bits of the SHA-256 digest, as lowercase hex
pub fn fingerprint(data: &[u8]) -> String {
    let mut digest = sha256_hex(data);
    digest.truncate(FINGERPRINT_HEX_LEN);
    digest
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_fingerprint_is_truncated_digest() {
        let fp = fingerprint(b"hello world");
        assert_eq!(fp.len(), FINGERPRINT_HEX_LEN);
        assert_eq!(fp, "b94d27b9934d3e08a52e52d7da7dabfa");
    }

    proptest::proptest! {
        #[test]
        fn fingerprint_is_stable_hex(data in proptest::collection::vec(proptest::num::u8::ANY, 0..256)) {
            let first = fingerprint(&data);
            proptest::prop_assert_eq!(first.len(), FINGERPRINT_HEX_LEN);
            proptest::prop_assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
            proptest::prop_assert_eq!(first, fingerprint(&data));
        }
    }
}
