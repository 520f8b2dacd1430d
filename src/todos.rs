//! Ownership-scoped access to todos.
//!
//! Every operation takes the caller's user id and only ever touches records
//! that user created. A todo that belongs to someone else is reported exactly
//! like a todo that does not exist.

use chrono::Utc;
use log::debug;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::models::{NewTodo, Todo, TodoPatch};
use crate::store::TodoStore;

#[derive(Clone)]
pub struct TodoRepository {
    store: Arc<dyn TodoStore>,
}

impl TodoRepository {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }

    /// Stores a new, incomplete todo owned by `user_id`.
    pub async fn create(&self, user_id: Uuid, input: NewTodo) -> Result<Todo, AppError> {
        input.validate()?;
        let todo = self.store.insert_todo(Todo::new(input.text, user_id)).await?;
        debug!("User {} created todo {}", user_id, todo.id);
        Ok(todo)
    }

    pub async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<Todo>, AppError> {
        Ok(self.store.find_todos(user_id).await?)
    }

    /// `None` for an unparsable id, a missing todo, or someone else's todo.
    pub async fn get_owned(&self, user_id: Uuid, todo_id: &str) -> Result<Option<Todo>, AppError> {
        let Some(id) = parse_id(todo_id) else {
            return Ok(None);
        };
        Ok(self.store.find_todo(id, user_id).await?)
    }

    /// Applies `text` and `completed` from the patch.
    ///
    /// `completed_at` is always recomputed: the current time when the patch
    /// sets `completed` to `true`, otherwise cleared along with `completed`.
    pub async fn update_owned(
        &self,
        user_id: Uuid,
        todo_id: &str,
        patch: TodoPatch,
    ) -> Result<Option<Todo>, AppError> {
        let Some(id) = parse_id(todo_id) else {
            return Ok(None);
        };
        patch.validate()?;
        let changes = patch.resolve(Utc::now().timestamp_millis());
        Ok(self.store.update_todo(id, user_id, changes).await?)
    }

    /// Removes the todo and returns it.
    pub async fn delete_owned(
        &self,
        user_id: Uuid,
        todo_id: &str,
    ) -> Result<Option<Todo>, AppError> {
        let Some(id) = parse_id(todo_id) else {
            return Ok(None);
        };
        Ok(self.store.delete_todo(id, user_id).await?)
    }
}

fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw).ok()
}
