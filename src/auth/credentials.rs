//! Password hashing and verification.
//!
//! PBKDF2-HMAC-SHA256 with a per-user random salt and 100k iterations,
//! compared in constant time. A lookup miss burns the same work as a real
//! verification so unknown-email and wrong-password are indistinguishable
//! to both the caller and a timing observer.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

/// Number of PBKDF2 iterations for password stretching.
const PBKDF2_ITERATIONS: u32 = 100_000;

/// Salt byte length before hex encoding.
const SALT_BYTES: usize = 16;

/// Derived key length in bytes.
const DIGEST_BYTES: usize = 32;

/// Generate a random per-user salt (hex-encoded).
pub fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Hash a password with the given salt.
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut out = [0u8; DIGEST_BYTES];
    pbkdf2_hmac::<Sha256>(
        password.as_bytes(),
        salt.as_bytes(),
        PBKDF2_ITERATIONS,
        &mut out,
    );
    hex::encode(out)
}

/// Verify a supplied password against a stored hash.
pub fn verify_password(password: &str, salt: &str, stored_hash: &str) -> bool {
    let attempt = hash_password(password, salt);
    constant_time_eq(attempt.as_bytes(), stored_hash.as_bytes())
}

/// Perform a dummy hash when the account lookup misses, so the miss takes
/// as long as a real verification.
pub fn dummy_verify(password: &str) {
    let _ = hash_password(password, "0000000000000000");
}

/// Constant-time byte comparison to prevent timing attacks.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
