use crate::error::AppError;
use crate::models::{User, AUTH_ACCESS};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents the claims encoded within a session token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject of the token: the owning user's id.
    pub sub: Uuid,
    /// Access level the token grants. Always `"auth"` for session tokens.
    pub access: String,
}

/// Signs and checks session tokens with the server secret.
///
/// Tokens are HS256 JWTs without `exp` or `iat`, so issuing twice for the same
/// user yields the same string. A token stays usable until it is removed from
/// its owner's token list.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Generates the `auth` token for a given user ID.
    ///
    /// The caller is responsible for appending the token to the user's token list.
    pub fn issue(&self, user_id: Uuid) -> Result<String, AppError> {
        let claims = Claims {
            sub: user_id,
            access: AUTH_ACCESS.to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
    }

    /// Verifies a token's signature and decodes its claims.
    ///
    /// Returns `AppError::Unauthorized` if the token is malformed or its signature is invalid.
    /// Whether the token has been revoked is not checked here.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
    }

    /// Removes every entry equal to `token` from the user's token list.
    /// Revoking a token that is not present changes nothing.
    pub fn revoke(user: &mut User, token: &str) {
        user.tokens.retain(|t| t.token != token);
    }
}
