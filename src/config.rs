use std::env;

use crate::error::AppError;

pub struct Config {
    /// PostgreSQL connection string. Without it the in-process store is used.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub server_port: u16,
    pub server_host: String,
    pub bcrypt_cost: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::InternalServerError("JWT_SECRET must be set".into()))?;

        let server_port = match lookup("SERVER_PORT") {
            Some(port) => port.parse().map_err(|_| {
                AppError::InternalServerError(format!("SERVER_PORT must be a number, got {:?}", port))
            })?,
            None => 8080,
        };

        let bcrypt_cost = match lookup("BCRYPT_COST") {
            Some(cost) => cost.parse().map_err(|_| {
                AppError::InternalServerError(format!("BCRYPT_COST must be a number, got {:?}", cost))
            })?,
            None => bcrypt::DEFAULT_COST,
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL").filter(|s| !s.is_empty()),
            jwt_secret,
            server_port,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            bcrypt_cost,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}
