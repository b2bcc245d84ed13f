//! Hashing helpers shared across crates.

use sha2::{Digest, Sha256};

/// Compute the lowercase hex SHA-256 digest of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Short, non-reversible fingerprint of a bearer token for log lines.
///
/// Tokens are credentials and must never be logged verbatim.
pub fn token_fingerprint(token: &str) -> String {
    let mut digest = sha256_hex(token.as_bytes());
    digest.truncate(12);
    digest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_of_empty_input() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn fingerprint_is_stable_and_short() {
        let a = token_fingerprint("abc.def.ghi");
        let b = token_fingerprint("abc.def.ghi");
        assert_eq!(a, b);
        assert_eq!(a.len(), 12);
        assert_ne!(a, token_fingerprint("abc.def.ghj"));
    }
}
