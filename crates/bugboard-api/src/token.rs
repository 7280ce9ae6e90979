//! API token issuance and password hashing.
//!
//! Tokens are 20 random bytes, hex-encoded, handed to the client once. Only
//! their SHA-256 digest is stored.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use bugboard_core::Error;
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};

const TOKEN_BYTES: usize = 20;

/// Generate a fresh token key.
pub fn generate() -> String {
  let mut bytes = [0u8; TOKEN_BYTES];
  OsRng.fill_bytes(&mut bytes);
  hex::encode(bytes)
}

/// The stored form of a token key.
pub fn digest(key: &str) -> String { hex::encode(Sha256::digest(key.as_bytes())) }

/// Hash a password into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, Error> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| Error::Internal(format!("argon2 error: {e}")))
}

/// Check `password` against a stored PHC string. A malformed stored hash
/// never verifies.
pub fn verify_password(password: &str, phc: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(phc) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn generated_tokens_are_hex_and_distinct() {
    let a = generate();
    let b = generate();
    assert_eq!(a.len(), TOKEN_BYTES * 2);
    assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(a, b);
  }

  #[test]
  fn digest_is_stable() {
    assert_eq!(digest("abc"), digest("abc"));
    assert_ne!(digest("abc"), digest("abd"));
    assert_eq!(digest("abc").len(), 64);
  }

  #[test]
  fn password_round_trip() {
    let phc = hash_password("hunter2").unwrap();
    assert!(verify_password("hunter2", &phc));
    assert!(!verify_password("hunter3", &phc));
    assert!(!verify_password("hunter2", "not a phc string"));
  }
}
