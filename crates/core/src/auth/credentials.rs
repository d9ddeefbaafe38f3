//! Admin credential storage and verification with Argon2id.

use argon2::{
    Argon2, PasswordHash,
    password_hash::{PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

/// Errors that can occur during credential operations.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Username or password did not match.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The configured password hash is not a valid PHC string.
    #[error("invalid password hash format")]
    InvalidHash,

    /// Failed to hash a password.
    #[error("failed to hash password: {0}")]
    HashError(String),
}

/// The single shared admin credential.
///
/// Holds the login name and the Argon2 PHC hash of the password, both loaded
/// from configuration. The clear-text password never leaves the login
/// request.
#[derive(Clone)]
pub struct AdminCredentials {
    username: String,
    password_hash: String,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password_hash", &"[hidden]")
            .finish()
    }
}

impl AdminCredentials {
    /// Creates the credential from configuration values.
    #[must_use]
    pub const fn new(username: String, password_hash: String) -> Self {
        Self {
            username,
            password_hash,
        }
    }

    /// Returns the admin login name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Verifies a login attempt against the stored credential.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::InvalidCredentials` when either the username
    /// or the password does not match, without distinguishing the two.
    /// Returns `CredentialError::InvalidHash` when the configured hash cannot
    /// be parsed.
    pub fn verify(&self, username: &str, password: &str) -> Result<(), CredentialError> {
        let parsed =
            PasswordHash::new(&self.password_hash).map_err(|_| CredentialError::InvalidHash)?;

        // Run the hash check even on a username mismatch so both failure
        // modes take comparable time.
        let password_ok = Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok();

        if username == self.username && password_ok {
            Ok(())
        } else {
            Err(CredentialError::InvalidCredentials)
        }
    }
}

/// Hashes a password using Argon2id, producing a PHC string.
///
/// # Errors
///
/// Returns `CredentialError::HashError` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CredentialError::HashError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(password: &str) -> AdminCredentials {
        AdminCredentials::new("admin".to_string(), hash_password(password).unwrap())
    }

    #[test]
    fn test_correct_login_accepted() {
        let creds = credentials("change-me");
        assert!(creds.verify("admin", "change-me").is_ok());
    }

    #[test]
    fn test_wrong_password_rejected() {
        let creds = credentials("change-me");
        assert!(matches!(
            creds.verify("admin", "wrong"),
            Err(CredentialError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_wrong_username_rejected() {
        let creds = credentials("change-me");
        assert!(matches!(
            creds.verify("root", "change-me"),
            Err(CredentialError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_malformed_hash_reported() {
        let creds = AdminCredentials::new("admin".to_string(), "not-a-hash".to_string());
        assert!(matches!(
            creds.verify("admin", "anything"),
            Err(CredentialError::InvalidHash)
        ));
    }

    #[test]
    fn test_hash_is_phc_format_and_salted() {
        let h1 = hash_password("secret").unwrap();
        let h2 = hash_password("secret").unwrap();
        assert!(h1.starts_with("$argon2id$"));
        assert_ne!(h1, h2);
    }
}
