//! Session token types for the shared admin credential.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// JWT claims for session tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (the admin login name).
    pub sub: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a login session.
    #[must_use]
    pub fn new(username: &str, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub: username.to_string(),
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
        }
    }
}

/// Login request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// Admin login name.
    pub username: String,
    /// Admin password.
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_claims_expiry_after_issue() {
        let claims = Claims::new("admin", Utc::now() + Duration::hours(8));
        assert_eq!(claims.sub, "admin");
        assert!(claims.exp > claims.iat);
    }
}
