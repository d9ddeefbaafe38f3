//! Shared admin credential verification.
//!
//! Comptoir has exactly one login: the admin credential from configuration.
//! This module provides:
//! - Argon2id password hashing (used by the seeder to mint a hash)
//! - Credential verification against the configured hash

mod credentials;

pub use credentials::{AdminCredentials, CredentialError, hash_password};
