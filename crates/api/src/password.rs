//! Argon2id password hashing.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use domain::{DomainError, PasswordHasher};

/// [`PasswordHasher`] backed by Argon2id with default parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Hasher;

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, DomainError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| DomainError::PasswordHash(e.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            tracing::warn!("Stored password hash is not in PHC format");
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = Argon2Hasher;
        let hash = hasher.hash("hunter22").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("hunter22", &hash));
        assert!(!hasher.verify("hunter23", &hash));
    }

    #[test]
    fn test_salts_differ() {
        let hasher = Argon2Hasher;
        assert_ne!(hasher.hash("same").unwrap(), hasher.hash("same").unwrap());
    }

    #[test]
    fn test_garbage_hash_never_verifies() {
        assert!(!Argon2Hasher.verify("anything", "not-a-hash"));
    }
}
