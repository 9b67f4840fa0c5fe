//! Argon2id password hashing and the account password policy.
//!
//! Hashes are stored as PHC strings so salt and parameters travel with them.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use storybible_core::error::CoreError;

pub const MIN_PASSWORD_LENGTH: usize = 8;

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// `Ok(false)` on a mismatch; `Err` only when the stored hash is malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Reject passwords that are short, purely numeric, or the username itself.
pub fn validate_password(password: &str, username: &str) -> Result<(), CoreError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(CoreError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(CoreError::Validation("Password cannot be entirely numeric".into()));
    }
    if !username.is_empty() && password.eq_ignore_ascii_case(username) {
        return Err(CoreError::Validation("Password is too similar to the username".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn hash_round_trip() {
        let hash = hash_password("quill-and-ink").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("quill-and-ink", &hash).unwrap());
        assert!(!verify_password("quill-and-inc", &hash).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }

    #[test]
    fn policy() {
        assert_matches!(validate_password("short", "mira"), Err(CoreError::Validation(m)) if m.contains("8 characters"));
        assert_matches!(validate_password("1234567890", "mira"), Err(CoreError::Validation(_)));
        assert_matches!(validate_password("MiraMira42", "miramira42"), Err(CoreError::Validation(_)));
        assert!(validate_password("lantern-keeper", "mira").is_ok());
    }
}
