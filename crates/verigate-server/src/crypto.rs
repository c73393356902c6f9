use std::num::NonZeroU32;

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

const OUTPUT_LEN: usize = 32;

/// Derive the server-side password hash.
///
/// PBKDF2-HMAC-SHA256 over the raw password with a random per-account salt
/// and server-configured iterations.
pub fn hash_password(secret: &[u8], salt: &[u8], iterations: u32) -> Vec<u8> {
    let mut out = vec![0u8; OUTPUT_LEN];
    let iterations = NonZeroU32::new(iterations).expect("Iterations must be non-zero");
    pbkdf2_hmac::<Sha256>(secret, salt, iterations.get(), &mut out);
    out
}

pub fn verify_password_hash(secret: &[u8], salt: &[u8], expected: &[u8], iterations: u32) -> bool {
    let iterations = NonZeroU32::new(iterations).expect("Iterations must be non-zero");
    if expected.len() != OUTPUT_LEN {
        return false;
    }

    // Derive and constant-time compare.
    let mut out = vec![0u8; OUTPUT_LEN];
    pbkdf2_hmac::<Sha256>(secret, salt, iterations.get(), &mut out);
    subtle::ConstantTimeEq::ct_eq(out.as_ref(), expected).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_verifies() {
        let salt = b"0123456789abcdef";
        let hash = hash_password(b"secret123", salt, 1_000);
        assert!(verify_password_hash(b"secret123", salt, &hash, 1_000));
    }

    #[test]
    fn wrong_password_or_salt_fails() {
        let salt = b"0123456789abcdef";
        let hash = hash_password(b"secret123", salt, 1_000);
        assert!(!verify_password_hash(b"secret124", salt, &hash, 1_000));
        assert!(!verify_password_hash(b"secret123", b"fedcba9876543210", &hash, 1_000));
    }

    #[test]
    fn truncated_hash_is_rejected() {
        let salt = b"0123456789abcdef";
        let hash = hash_password(b"secret123", salt, 1_000);
        assert!(!verify_password_hash(b"secret123", salt, &hash[..16], 1_000));
    }
}
