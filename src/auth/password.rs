//! Password hashing: the `PasswordHasher` seam and its Argon2 implementation.

use crate::error::{AppError, AppResult};
use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

/// Salted one-way password hashing.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> AppResult<String>;

    /// `Ok(false)` on mismatch; `Err` only when `hash` is not a parseable hash.
    fn verify(&self, password: &str, hash: &str) -> AppResult<bool>;

    /// Do the work of a `verify` when there is no stored hash, so a login for
    /// an unknown username takes as long as one with a wrong password.
    fn verify_dummy(&self, password: &str) -> AppResult<()> {
        self.hash(password).map(|_| ())
    }
}

/// Argon2id with a fresh random salt per hash, stored as a PHC string.
#[derive(Clone, Default)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("hash: {}", e)))?
            .to_string();
        Ok(hash)
    }

    fn verify(&self, password: &str, hash: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("parse hash: {}", e)))?;
        // Parameters come from the PHC string, so hashes made with other params still verify.
        Ok(self
            .argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> Argon2Hasher {
        Argon2Hasher::new(Params::new(Params::MIN_M_COST, 1, 1, None).unwrap())
    }

    #[test]
    fn hash_and_verify_password() {
        let hasher = hasher();
        let hash = hasher.hash("mypassword").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("mypassword"));
        assert!(hasher.verify("mypassword", &hash).unwrap());
        assert!(!hasher.verify("wrong", &hash).unwrap());
    }

    #[test]
    fn salts_differ() {
        let hasher = hasher();
        assert_ne!(hasher.hash("same").unwrap(), hasher.hash("same").unwrap());
    }

    #[test]
    fn verify_rejects_garbage_hash() {
        assert!(hasher().verify("pw", "plaintext").is_err());
    }
}
