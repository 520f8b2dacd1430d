//! Persistence seam.
//!
//! The application talks to storage only through [`UserStore`] and
//! [`TodoStore`]. Each method is a single-record operation the backend
//! performs atomically; nothing above this layer spans more than one call in a
//! transaction.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::fmt;
use uuid::Uuid;

use crate::models::{AuthToken, Todo, TodoChanges, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// SQLSTATE reported for a unique-constraint violation.
pub const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    Conflict { code: String, message: String },
    /// Any other backend failure.
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StoreError::Conflict { code, message } => write!(f, "conflict {}: {}", code, message),
            StoreError::Backend(msg) => write!(f, "store failure: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> StoreError {
        if let sqlx::Error::Database(db_error) = &error {
            if let Some(code) = db_error.code() {
                if code == UNIQUE_VIOLATION {
                    return StoreError::Conflict {
                        code: code.into_owned(),
                        message: db_error.message().to_string(),
                    };
                }
            }
        }
        StoreError::Backend(error.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new user. Fails with [`StoreError::Conflict`] when the email is taken.
    async fn insert_user(&self, user: User) -> StoreResult<User>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Appends a session token and returns the updated user.
    async fn push_token(&self, user_id: Uuid, token: AuthToken) -> StoreResult<Option<User>>;

    /// Removes every session entry equal to `token` and returns the updated user.
    async fn pull_token(&self, user_id: Uuid, token: &str) -> StoreResult<Option<User>>;

    /// Releases backend resources. Called once on shutdown.
    async fn close(&self) {}
}

/// Todo persistence. Every lookup is keyed by both the todo id and its
/// creator, so a record owned by someone else is indistinguishable from a
/// missing one.
#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn insert_todo(&self, todo: Todo) -> StoreResult<Todo>;

    /// All todos of `creator_id` in insertion order.
    async fn find_todos(&self, creator_id: Uuid) -> StoreResult<Vec<Todo>>;

    async fn find_todo(&self, id: Uuid, creator_id: Uuid) -> StoreResult<Option<Todo>>;

    async fn update_todo(
        &self,
        id: Uuid,
        creator_id: Uuid,
        changes: TodoChanges,
    ) -> StoreResult<Option<Todo>>;

    async fn delete_todo(&self, id: Uuid, creator_id: Uuid) -> StoreResult<Option<Todo>>;
}
