//! Salted PBKDF2-HMAC-SHA256 password hashing.
//!
//! Stored form is `base64(salt):base64(derived_key)`. The iteration count is
//! not part of the stored form, so every hasher that verifies a hash must use
//! the same count that produced it.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use pbkdf2::pbkdf2_hmac;
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;

use super::constant_time_eq;

/// Iteration count used for every stored credential.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;
const SEPARATOR: char = ':';

#[derive(Debug, Clone)]
pub struct PasswordHasher {
    iterations: u32,
}

impl PasswordHasher {
    pub fn new() -> Self {
        Self::with_iterations(PBKDF2_ITERATIONS)
    }

    /// Hasher with a non-default work factor. Only hashes produced with the
    /// same count will verify.
    pub fn with_iterations(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    /// Hash a plaintext password with a fresh random salt.
    pub fn hash(&self, password: &str) -> String {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);

        let key = self.derive(password, &salt);
        format!("{}{}{}", STANDARD.encode(salt), SEPARATOR, STANDARD.encode(key))
    }

    /// Check a plaintext password against a stored hash.
    ///
    /// Anything that does not parse as `salt:key` verifies as `false`.
    pub fn verify(&self, password: &str, encoded: &str) -> bool {
        let Some((salt, expected)) = decode(encoded) else {
            return false;
        };
        if expected.len() != KEY_LEN {
            return false;
        }

        let derived = self.derive(password, &salt);
        constant_time_eq(&derived, &expected)
    }

    fn derive(&self, password: &str, salt: &[u8]) -> [u8; KEY_LEN] {
        let mut key = [0u8; KEY_LEN];
        pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, self.iterations, &mut key);
        key
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

fn decode(encoded: &str) -> Option<(Vec<u8>, Vec<u8>)> {
    let (salt, key) = encoded.split_once(SEPARATOR)?;
    let salt = STANDARD.decode(salt).ok()?;
    let key = STANDARD.decode(key).ok()?;
    if salt.is_empty() {
        return None;
    }
    Some((salt, key))
}
