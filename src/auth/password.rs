//! Password hashing and token generation.
//!
//! Passwords are stored as `pbkdf2-sha256$<rounds>$<salt>$<digest>`, salt and
//! digest hex encoded. Verification uses the rounds recorded in the hash.

use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const DIGEST_LEN: usize = 32;

#[cfg(not(test))]
const ROUNDS: u32 = 600_000;
// Keeps the suites fast; stored hashes carry their own round count.
#[cfg(test)]
const ROUNDS: u32 = 1_000;

fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

fn derive(password: &str, salt: &[u8], rounds: u32) -> [u8; DIGEST_LEN] {
    let mut out = [0u8; DIGEST_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, rounds, &mut out);
    out
}

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let salt = random_bytes(SALT_LEN);
    let digest = derive(password, &salt, ROUNDS);
    format!(
        "{}${}${}${}",
        SCHEME,
        ROUNDS,
        hex::encode(salt),
        hex::encode(digest)
    )
}

/// Check a password against a stored hash. Unknown or malformed hashes never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(SCHEME), Some(rounds), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };
    let Ok(rounds) = rounds.parse::<u32>() else {
        return false;
    };
    let Ok(salt) = hex::decode(salt) else {
        return false;
    };
    if rounds == 0 || salt.is_empty() {
        return false;
    }

    constant_time_compare(&hex::encode(derive(password, &salt, rounds)), expected)
}

/// Opaque random token for sessions and confirmations.
pub fn new_token() -> String {
    hex::encode(random_bytes(32))
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
