// ============================
// gatekeeper-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
//!
//! Hashes are PHC strings with an embedded random salt. The configured
//! algorithm only decides how new hashes are made; verification reads the
//! algorithm from the stored string, so accounts hashed before a switch keep
//! working. Digests are compared in constant time by `password-hash`.
use argon2::Argon2;
use scrypt::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Scrypt,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Minimum password length
pub const MIN_PASSWORD_LENGTH: usize = 10;

/// Password hashing errors
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    HashingFailed(String),

    #[error("stored hash is not a valid PHC string")]
    InvalidHashFormat,

    #[error("stored hash uses unsupported algorithm `{0}`")]
    UnsupportedAlgorithm(String),
}

/// One-way credential hashing
pub trait PasswordHasher: Send + Sync {
    /// Hash `plain` with a fresh salt
    fn hash(&self, plain: &str) -> Result<String, PasswordError>;

    /// Check `plain` against a stored hash.
    ///
    /// A mismatch is `Ok(false)`; only an unreadable hash is an error.
    fn verify(&self, hashed: &str, plain: &str) -> Result<bool, PasswordError>;
}

/// Which hasher backs new accounts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Scrypt,
    Argon2,
}

impl HashAlgorithm {
    pub fn build(self) -> Arc<dyn PasswordHasher> {
        match self {
            HashAlgorithm::Scrypt => Arc::new(ScryptHasher),
            HashAlgorithm::Argon2 => Arc::new(Argon2Hasher::default()),
        }
    }
}

/// scrypt with the crate's recommended parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct ScryptHasher;

impl PasswordHasher for ScryptHasher {
    fn hash(&self, plain: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Scrypt
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    fn verify(&self, hashed: &str, plain: &str) -> Result<bool, PasswordError> {
        verify_phc(hashed, plain)
    }
}

/// Argon2id with the crate's default cost
#[derive(Default)]
pub struct Argon2Hasher {
    inner: Argon2<'static>,
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, plain: &str) -> Result<String, PasswordError> {
        use argon2::PasswordHasher as _;

        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .inner
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    fn verify(&self, hashed: &str, plain: &str) -> Result<bool, PasswordError> {
        verify_phc(hashed, plain)
    }
}

/// Check `plain` against a scrypt or Argon2 PHC string.
///
/// Cost parameters come from the hash itself, so a hash made under older
/// settings still verifies.
pub fn verify_phc(hashed: &str, plain: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hashed).map_err(|_| PasswordError::InvalidHashFormat)?;
    match parsed.algorithm.as_str() {
        "scrypt" | "argon2id" | "argon2i" | "argon2d" => {}
        other => return Err(PasswordError::UnsupportedAlgorithm(other.to_string())),
    }

    let argon2 = Argon2::default();
    let verifiers: [&dyn PasswordVerifier; 2] = [&Scrypt, &argon2];
    Ok(parsed.verify_password(&verifiers, plain.as_bytes()).is_ok())
}

/// Password complexity requirements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordRequirements {
    pub min_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digit: bool,
    pub require_special: bool,
}

impl Default for PasswordRequirements {
    fn default() -> Self {
        Self {
            min_length: MIN_PASSWORD_LENGTH,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            require_special: true,
        }
    }
}

/// Check if a password meets the complexity requirements
pub fn validate_password_strength(password: &str, requirements: &PasswordRequirements) -> bool {
    if password.chars().count() < requirements.min_length {
        return false;
    }

    if requirements.require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
        return false;
    }

    if requirements.require_lowercase && !password.chars().any(|c| c.is_lowercase()) {
        return false;
    }

    if requirements.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }

    if requirements.require_special && !password.chars().any(|c| !c.is_alphanumeric()) {
        return false;
    }

    true
}
