//! Security Utilities
//!
//! Password hashing, request signing digests and response security headers.

use axum::http::{HeaderName, HeaderValue};
use bcrypt::{hash, verify};
use sha2::{Digest, Sha256};

/// Default bcrypt cost for password hashing
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// Hash a password with custom bcrypt cost
pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    hash(password, cost)
}

/// Verify a password against its hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password, hash)
}

/// Hex-encoded SHA-256 digest of the input
pub fn sha256_hex(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Security headers for HTTP responses
pub struct SecurityHeaders;

impl SecurityHeaders {
    /// Standard headers applied to every API response
    pub fn standard() -> Vec<(HeaderName, HeaderValue)> {
        vec![
            (
                HeaderName::from_static("x-content-type-options"),
                HeaderValue::from_static("nosniff"),
            ),
            (
                HeaderName::from_static("x-frame-options"),
                HeaderValue::from_static("DENY"),
            ),
            (
                HeaderName::from_static("referrer-policy"),
                HeaderValue::from_static("strict-origin-when-cross-origin"),
            ),
            (
                HeaderName::from_static("permissions-policy"),
                HeaderValue::from_static("geolocation=(), microphone=(), camera=()"),
            ),
            (
                HeaderName::from_static("strict-transport-security"),
                HeaderValue::from_static("max-age=31536000; includeSubDomains"),
            ),
            (
                HeaderName::from_static("x-dns-prefetch-control"),
                HeaderValue::from_static("off"),
            ),
            (
                HeaderName::from_static("cross-origin-opener-policy"),
                HeaderValue::from_static("same-origin"),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hashing() {
        let password = "test_password_123";
        let hash = hash_password_with_cost(password, 4).unwrap();

        assert!(verify_password(password, &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_hash_is_salted() {
        let first = hash_password_with_cost("same_password", 4).unwrap();
        let second = hash_password_with_cost("same_password", 4).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_sha256_hex() {
        let digest = sha256_hex("abc");
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(sha256_hex("abc"), digest);
        assert_eq!(digest.len(), 64);
    }

    #[test]
    fn test_security_headers() {
        let headers = SecurityHeaders::standard();
        assert!(!headers.is_empty());
        assert!(headers
            .iter()
            .any(|(name, value)| name == "x-content-type-options" && value == "nosniff"));
    }
}
