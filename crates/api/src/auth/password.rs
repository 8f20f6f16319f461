//! Account password hashing (Argon2id, PHC strings with embedded salt).

use std::sync::OnceLock;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

pub type PasswordError = argon2::password_hash::Error;

/// Hash a new account password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Check a login attempt against the stored hash.
///
/// A wrong password is `Ok(false)`; a corrupt stored hash is an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(PasswordError::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Spend the same work as a real verification when the email is unknown,
/// so login timing does not reveal which accounts exist.
pub fn verify_against_placeholder(password: &str) {
    static PLACEHOLDER: OnceLock<Option<String>> = OnceLock::new();
    let placeholder = PLACEHOLDER.get_or_init(|| hash_password("placeholder-password").ok());
    if let Some(hash) = placeholder {
        let _ = verify_password(password, hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_hash_is_argon2id_and_verifies() {
        let hash = hash_password("Mixdown42").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Mixdown42", &hash).unwrap());
        assert!(!verify_password("mixdown42", &hash).unwrap());
    }

    #[test]
    fn each_account_gets_its_own_salt() {
        assert_ne!(hash_password("Mixdown42").unwrap(), hash_password("Mixdown42").unwrap());
    }

    #[test]
    fn corrupt_stored_hash_is_an_error() {
        assert!(verify_password("Mixdown42", "plaintext-from-an-old-import").is_err());
    }

    #[test]
    fn placeholder_check_never_panics() {
        verify_against_placeholder("anything");
        verify_against_placeholder("");
    }
}
