//! Stateless password hashing and comparison.
//!
//! Records only carry the PHC string; comparison never depends on which
//! backend produced the record.

use argon2::{password_hash::{PasswordHasher, PasswordVerifier, SaltString}, Argon2, PasswordHash};
use rand::rngs::OsRng;
use tracing::warn;

use crate::errors::StoreError;

/// Hash a plaintext password into an argon2 PHC string.
pub fn hash(plain: &str) -> Result<String, StoreError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| StoreError::Hash(e.to_string()))
}

/// Compare a candidate against a stored hash. A malformed hash never matches.
pub fn verify(hash: &str, candidate: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default().verify_password(candidate.as_bytes(), &parsed).is_ok(),
        Err(e) => {
            warn!(error = %e, "stored password hash is not a valid PHC string");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let h = hash("admin123").unwrap();
        assert!(h.starts_with("$argon2"));
        assert!(verify(&h, "admin123"));
        assert!(!verify(&h, "admin124"));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        assert_ne!(hash("password123").unwrap(), hash("password123").unwrap());
    }

    #[test]
    fn malformed_hash_never_matches() {
        assert!(!verify("plaintext", "plaintext"));
        assert!(!verify("", ""));
    }
}
