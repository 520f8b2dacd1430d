use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Access level carried by every session token.
pub const AUTH_ACCESS: &str = "auth";

/// One active session token of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuthToken {
    pub access: String,
    pub token: String,
}

impl AuthToken {
    pub fn auth(token: impl Into<String>) -> Self {
        Self {
            access: AUTH_ACCESS.to_string(),
            token: token.into(),
        }
    }
}

/// A registered account.
///
/// Only `id` and `email` are ever serialized; the password hash and the
/// session tokens stay server-side.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub tokens: Vec<AuthToken>,
}

impl User {
    /// Creates a user with a fresh id and no sessions.
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            password_hash: password_hash.into(),
            tokens: Vec::new(),
        }
    }

    /// Whether `token` is one of this user's live `auth` sessions.
    pub fn has_auth_token(&self, token: &str) -> bool {
        self.tokens
            .iter()
            .any(|t| t.access == AUTH_ACCESS && t.token == token)
    }
}
