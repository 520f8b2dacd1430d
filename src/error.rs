//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every failure a handler can produce is one of its variants, and `AppError`
//! implements `actix_web::error::ResponseError` so the variant alone decides the
//! HTTP status and body sent back to the client.
//!
//! Authentication and ownership failures answer with an empty body: a `401` never
//! says why a token was rejected and a `404` never says whether the record exists
//! under another owner.
//!
//! `From` implementations for `validator::ValidationErrors`, `jsonwebtoken::errors::Error`,
//! `bcrypt::BcryptError` and the persistence layer's `StoreError` allow `?` to be used
//! everywhere.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

use crate::store::StoreError;

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Missing, invalid or revoked token (HTTP 401, empty body).
    Unauthorized(String),
    /// Malformed request that is not a field validation problem (HTTP 400).
    BadRequest(String),
    /// Unknown record, unparsable id, or a record owned by someone else (HTTP 404, empty body).
    NotFound(String),
    /// A required field is missing or fails its constraints (HTTP 400).
    ValidationError(String),
    /// A uniqueness constraint rejected the write (HTTP 400).
    /// `code` is the store's own conflict code and is surfaced to the client.
    Conflict { code: String, message: String },
    /// Unknown email or wrong password. Both cases are reported identically (HTTP 400, empty body).
    InvalidCredentials,
    /// The persistence layer failed (HTTP 400 with the underlying message).
    DatabaseError(String),
    /// Unexpected server-side failure such as hashing or signing errors (HTTP 500).
    InternalServerError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            AppError::Conflict { code, message } => write!(f, "Conflict ({}): {}", code, message),
            AppError::InvalidCredentials => write!(f, "Invalid credentials"),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_)
            | AppError::ValidationError(_)
            | AppError::Conflict { .. }
            | AppError::InvalidCredentials
            | AppError::DatabaseError(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        match self {
            AppError::Unauthorized(_) | AppError::NotFound(_) | AppError::InvalidCredentials => {
                builder.finish()
            }
            AppError::Conflict { code, message } => builder.json(json!({
                "error": message,
                "code": code
            })),
            AppError::BadRequest(msg)
            | AppError::ValidationError(msg)
            | AppError::DatabaseError(msg)
            | AppError::InternalServerError(msg) => builder.json(json!({
                "error": msg
            })),
        }
    }
}

/// Converts `validator::ValidationErrors` into `AppError::ValidationError`.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

/// A token that fails signature or shape checks is an authentication failure.
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        AppError::Unauthorized(error.to_string())
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}

/// Unique-constraint violations keep their store code; every other store fault
/// is reported to the client as a database error.
impl From<StoreError> for AppError {
    fn from(error: StoreError) -> AppError {
        match error {
            StoreError::Conflict { code, message } => AppError::Conflict { code, message },
            StoreError::Backend(msg) => AppError::DatabaseError(msg),
        }
    }
}
