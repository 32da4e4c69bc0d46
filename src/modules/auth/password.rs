use pbkdf2::pbkdf2;
use rand::Rng;
use thiserror::Error;

use crate::HmacSha256;

/// Reasons the password policy can reject a candidate password
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordPolicyError {
    #[error("password must be at least 8 characters long")]
    TooShort,
    #[error("password must contain an uppercase letter")]
    NoUppercase,
    #[error("password must contain a lowercase letter")]
    NoLowercase,
    #[error("password must contain a number")]
    NoNumber,
    #[error("password must contain a special character")]
    NoSpecialChar,
}

/// Function to validate password strength
pub fn validate_password(password: &str) -> Result<(), PasswordPolicyError> {
    if password.len() < 8 {
        return Err(PasswordPolicyError::TooShort);
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        return Err(PasswordPolicyError::NoUppercase);
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        return Err(PasswordPolicyError::NoLowercase);
    }
    if !password.chars().any(|c| c.is_numeric()) {
        return Err(PasswordPolicyError::NoNumber);
    }
    if !password
        .chars()
        .any(|c| "!@#$%^&*()_+-=[]{}|;:,.<>?".contains(c))
    {
        return Err(PasswordPolicyError::NoSpecialChar);
    }
    Ok(())
}

/// Function to generate a random salt for PBKDF2
pub fn generate_salt() -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..16).map(|_| rng.gen()).collect()
}

/// Derive the stored credential hash from a password and per-member salt
pub fn hash_password(password: &str, salt: &[u8]) -> String {
    let mut key = vec![0u8; 32];

    pbkdf2::<HmacSha256>(password.as_bytes(), salt, 100_000, &mut key);

    hex::encode(key)
}

/// Check a password attempt against a stored hash
pub fn verify_password(password: &str, salt: &[u8], expected_hash: &str) -> bool {
    hash_password(password, salt) == expected_hash
}
