use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{StoreResult, TodoStore, UserStore};
use crate::models::{AuthToken, Todo, TodoChanges, User};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS user_tokens (
        id BIGSERIAL PRIMARY KEY,
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        access TEXT NOT NULL,
        token TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS user_tokens_user_id_idx ON user_tokens (user_id)",
    "CREATE TABLE IF NOT EXISTS todos (
        seq BIGSERIAL,
        id UUID PRIMARY KEY,
        text TEXT NOT NULL CHECK (length(text) >= 1),
        completed BOOLEAN NOT NULL DEFAULT false,
        completed_at BIGINT,
        creator_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE
    )",
    "CREATE INDEX IF NOT EXISTS todos_creator_id_idx ON todos (creator_id)",
];

const TODO_COLUMNS: &str = "id, text, completed, completed_at, creator_id";

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
}

/// PostgreSQL backend.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connects and makes sure the schema exists.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(*statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn load_user(&self, row: Option<UserRow>) -> StoreResult<Option<User>> {
        let Some(row) = row else {
            return Ok(None);
        };
        let tokens = sqlx::query_as::<_, AuthToken>(
            "SELECT access, token FROM user_tokens WHERE user_id = $1 ORDER BY id",
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            tokens,
        }))
    }

    async fn user_row(&self, id: Uuid) -> StoreResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: User) -> StoreResult<User> {
        sqlx::query("INSERT INTO users (id, email, password_hash) VALUES ($1, $2, $3)")
            .bind(user.id)
            .bind(&user.email)
            .bind(&user.password_hash)
            .execute(&self.pool)
            .await?;
        Ok(User {
            tokens: Vec::new(),
            ..user
        })
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row = self.user_row(id).await?;
        self.load_user(row).await
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        self.load_user(row).await
    }

    async fn push_token(&self, user_id: Uuid, token: AuthToken) -> StoreResult<Option<User>> {
        let inserted = sqlx::query(
            "INSERT INTO user_tokens (user_id, access, token)
             SELECT id, $2, $3 FROM users WHERE id = $1",
        )
        .bind(user_id)
        .bind(&token.access)
        .bind(&token.token)
        .execute(&self.pool)
        .await?;
        if inserted.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_user(user_id).await
    }

    async fn pull_token(&self, user_id: Uuid, token: &str) -> StoreResult<Option<User>> {
        sqlx::query("DELETE FROM user_tokens WHERE user_id = $1 AND token = $2")
            .bind(user_id)
            .bind(token)
            .execute(&self.pool)
            .await?;
        self.find_user(user_id).await
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl TodoStore for PgStore {
    async fn insert_todo(&self, todo: Todo) -> StoreResult<Todo> {
        let todo = sqlx::query_as::<_, Todo>(&format!(
            "INSERT INTO todos (id, text, completed, completed_at, creator_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {TODO_COLUMNS}"
        ))
        .bind(todo.id)
        .bind(&todo.text)
        .bind(todo.completed)
        .bind(todo.completed_at)
        .bind(todo.creator_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(todo)
    }

    async fn find_todos(&self, creator_id: Uuid) -> StoreResult<Vec<Todo>> {
        let todos = sqlx::query_as::<_, Todo>(&format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE creator_id = $1 ORDER BY seq"
        ))
        .bind(creator_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(todos)
    }

    async fn find_todo(&self, id: Uuid, creator_id: Uuid) -> StoreResult<Option<Todo>> {
        let todo = sqlx::query_as::<_, Todo>(&format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE id = $1 AND creator_id = $2"
        ))
        .bind(id)
        .bind(creator_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(todo)
    }

    async fn update_todo(
        &self,
        id: Uuid,
        creator_id: Uuid,
        changes: TodoChanges,
    ) -> StoreResult<Option<Todo>> {
        let todo = sqlx::query_as::<_, Todo>(&format!(
            "UPDATE todos
             SET text = COALESCE($1, text), completed = $2, completed_at = $3
             WHERE id = $4 AND creator_id = $5
             RETURNING {TODO_COLUMNS}"
        ))
        .bind(changes.text)
        .bind(changes.completed)
        .bind(changes.completed_at)
        .bind(id)
        .bind(creator_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(todo)
    }

    async fn delete_todo(&self, id: Uuid, creator_id: Uuid) -> StoreResult<Option<Todo>> {
        let todo = sqlx::query_as::<_, Todo>(&format!(
            "DELETE FROM todos WHERE id = $1 AND creator_id = $2 RETURNING {TODO_COLUMNS}"
        ))
        .bind(id)
        .bind(creator_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(todo)
    }
}
