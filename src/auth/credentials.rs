use log::{debug, info};
use std::sync::Arc;
use validator::Validate;

use super::password::{hash_password, verify_password};
use super::token::TokenService;
use super::{LoginRequest, RegisterRequest};
use crate::error::AppError;
use crate::models::{AuthToken, User, AUTH_ACCESS};
use crate::store::UserStore;

/// Account operations: registration, login, token resolution and logout.
#[derive(Clone)]
pub struct Credentials {
    users: Arc<dyn UserStore>,
    tokens: TokenService,
    bcrypt_cost: u32,
}

impl Credentials {
    pub fn new(users: Arc<dyn UserStore>, tokens: TokenService, bcrypt_cost: u32) -> Self {
        Self {
            users,
            tokens,
            bcrypt_cost,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Creates an account and opens its first session.
    ///
    /// Fails with `ValidationError` for a malformed email or a password shorter
    /// than 6 characters, and with `Conflict` when the email is already taken.
    pub async fn register(&self, request: RegisterRequest) -> Result<(User, String), AppError> {
        let request = RegisterRequest {
            email: request.email.trim().to_string(),
            password: request.password,
        };
        request.validate()?;

        let password_hash = hash_password(&request.password, self.bcrypt_cost)?;
        let user = self
            .users
            .insert_user(User::new(request.email, password_hash))
            .await?;
        info!("Registered user {}", user.id);

        self.open_session(user).await
    }

    /// Checks an email/password pair and opens a new session.
    ///
    /// An unknown email and a wrong password produce the same
    /// `InvalidCredentials` error.
    pub async fn authenticate(&self, request: LoginRequest) -> Result<(User, String), AppError> {
        let user = self
            .users
            .find_user_by_email(request.email.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(&request.password, &user.password_hash)? {
            debug!("Rejected login for user {}", user.id);
            return Err(AppError::InvalidCredentials);
        }

        self.open_session(user).await
    }

    /// Resolves a token to its owner.
    ///
    /// `None` when the signature does not check out, the owner no longer
    /// exists, or the token is no longer in the owner's list (logged out).
    pub async fn find_by_token(&self, token: &str) -> Result<Option<User>, AppError> {
        let claims = match self.tokens.verify(token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!("{}", e);
                return Ok(None);
            }
        };
        if claims.access != AUTH_ACCESS {
            return Ok(None);
        }

        let user = self.users.find_user(claims.sub).await?;
        Ok(user.filter(|u| u.has_auth_token(token)))
    }

    /// Ends the session identified by `token`.
    pub async fn logout(&self, user: &User, token: &str) -> Result<(), AppError> {
        let remaining = self.users.pull_token(user.id, token).await?;
        info!(
            "User {} logged out, {} session(s) left",
            user.id,
            remaining.map_or(0, |u| u.tokens.len())
        );
        Ok(())
    }

    pub async fn close(&self) {
        self.users.close().await;
    }

    async fn open_session(&self, user: User) -> Result<(User, String), AppError> {
        let token = self.tokens.issue(user.id)?;
        let user = self
            .users
            .push_token(user.id, AuthToken::auth(token.clone()))
            .await?
            .ok_or_else(|| AppError::InternalServerError("User vanished during login".into()))?;
        Ok((user, token))
    }
}
