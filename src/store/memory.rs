use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, StoreResult, TodoStore, UserStore, UNIQUE_VIOLATION};
use crate::auth::TokenService;
use crate::models::{AuthToken, Todo, TodoChanges, User};

/// In-process backend. Used when no `DATABASE_URL` is configured and by the tests.
///
/// Each collection sits behind its own lock, held for exactly one operation.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    todos: RwLock<Vec<Todo>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: User) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict {
                code: UNIQUE_VIOLATION.to_string(),
                message: format!("duplicate key value violates unique constraint: email {}", user.email),
            });
        }
        users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn push_token(&self, user_id: Uuid, token: AuthToken) -> StoreResult<Option<User>> {
        let mut users = self.users.write().await;
        Ok(users.iter_mut().find(|u| u.id == user_id).map(|user| {
            user.tokens.push(token);
            user.clone()
        }))
    }

    async fn pull_token(&self, user_id: Uuid, token: &str) -> StoreResult<Option<User>> {
        let mut users = self.users.write().await;
        Ok(users.iter_mut().find(|u| u.id == user_id).map(|user| {
            TokenService::revoke(user, token);
            user.clone()
        }))
    }
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn insert_todo(&self, todo: Todo) -> StoreResult<Todo> {
        self.todos.write().await.push(todo.clone());
        Ok(todo)
    }

    async fn find_todos(&self, creator_id: Uuid) -> StoreResult<Vec<Todo>> {
        let todos = self.todos.read().await;
        Ok(todos
            .iter()
            .filter(|t| t.creator_id == creator_id)
            .cloned()
            .collect())
    }

    async fn find_todo(&self, id: Uuid, creator_id: Uuid) -> StoreResult<Option<Todo>> {
        let todos = self.todos.read().await;
        Ok(todos
            .iter()
            .find(|t| t.id == id && t.creator_id == creator_id)
            .cloned())
    }

    async fn update_todo(
        &self,
        id: Uuid,
        creator_id: Uuid,
        changes: TodoChanges,
    ) -> StoreResult<Option<Todo>> {
        let mut todos = self.todos.write().await;
        Ok(todos
            .iter_mut()
            .find(|t| t.id == id && t.creator_id == creator_id)
            .map(|todo| {
                todo.apply(&changes);
                todo.clone()
            }))
    }

    async fn delete_todo(&self, id: Uuid, creator_id: Uuid) -> StoreResult<Option<Todo>> {
        let mut todos = self.todos.write().await;
        let position = todos
            .iter()
            .position(|t| t.id == id && t.creator_id == creator_id);
        Ok(position.map(|index| todos.remove(index)))
    }
}
