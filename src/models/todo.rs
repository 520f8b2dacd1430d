use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// A todo record as stored and returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Unique identifier (UUID v4).
    pub id: Uuid,
    /// What needs doing.
    pub text: String,
    pub completed: bool,
    /// Epoch milliseconds of completion. Set exactly when `completed` is true.
    pub completed_at: Option<i64>,
    /// The user who created the todo and the only one who can see it.
    pub creator_id: Uuid,
}

impl Todo {
    /// Creates an incomplete todo owned by `creator_id`.
    pub fn new(text: String, creator_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            completed: false,
            completed_at: None,
            creator_id,
        }
    }

    /// Applies already-resolved changes in place.
    pub fn apply(&mut self, changes: &TodoChanges) {
        if let Some(text) = &changes.text {
            self.text = text.clone();
        }
        self.completed = changes.completed;
        self.completed_at = changes.completed_at;
    }
}

/// Body of `POST /todos`.
#[derive(Debug, Deserialize, Validate)]
pub struct NewTodo {
    #[validate(length(min = 1, message = "text must not be empty"))]
    pub text: String,
}

/// Body of `PATCH /todos/{id}`.
///
/// Only `text` and `completed` are settable. Any other key in the request,
/// `completedAt` included, is dropped during deserialization.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct TodoPatch {
    #[validate(length(min = 1, message = "text must not be empty"))]
    #[serde(default)]
    pub text: Option<String>,
    /// `Some(true)` only for a JSON `true`; any non-boolean value reads as absent.
    #[serde(default, deserialize_with = "boolean_only")]
    pub completed: Option<bool>,
}

impl TodoPatch {
    /// Derives the stored completion state from the patch.
    ///
    /// Completing stamps `now_millis`; anything else clears both fields.
    pub fn resolve(self, now_millis: i64) -> TodoChanges {
        let completed = self.completed == Some(true);
        TodoChanges {
            text: self.text,
            completed,
            completed_at: completed.then_some(now_millis),
        }
    }
}

/// The write the store performs for an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoChanges {
    pub text: Option<String>,
    pub completed: bool,
    pub completed_at: Option<i64>,
}

fn boolean_only<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_bool()))
}
