use crate::{
    auth::Authenticated,
    error::AppError,
    models::{NewTodo, Todo, TodoPatch},
    state::AppState,
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use serde_json::json;

fn found(todo: Option<Todo>) -> Result<HttpResponse, AppError> {
    match todo {
        Some(todo) => Ok(HttpResponse::Ok().json(json!({ "todo": todo }))),
        None => Err(AppError::NotFound("Todo not found".into())),
    }
}

/// Lists the authenticated user's todos as `{ "todos": [...] }`.
#[get("")]
pub async fn get_todos(
    state: web::Data<AppState>,
    auth: Authenticated,
) -> Result<impl Responder, AppError> {
    let todos = state.todos.list_by_owner(auth.user.id).await?;
    Ok(HttpResponse::Ok().json(json!({ "todos": todos })))
}

/// Creates a todo owned by the authenticated user.
///
/// ## Request Body:
/// - `text`: required, non-empty.
///
/// ## Responses:
/// - `200 OK`: the created todo.
/// - `400 Bad Request`: `text` missing or empty.
#[post("")]
pub async fn create_todo(
    state: web::Data<AppState>,
    auth: Authenticated,
    todo_data: web::Json<NewTodo>,
) -> Result<impl Responder, AppError> {
    let todo = state
        .todos
        .create(auth.user.id, todo_data.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(todo))
}

/// Retrieves one todo as `{ "todo": ... }`.
///
/// ## Responses:
/// - `404 Not Found`: the id is not a valid identifier, no such todo exists,
///   or it belongs to another user. The three cases are indistinguishable.
#[get("/{id}")]
pub async fn get_todo(
    state: web::Data<AppState>,
    auth: Authenticated,
    todo_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    found(state.todos.get_owned(auth.user.id, &todo_id).await?)
}

/// Updates `text` and/or `completed`. Any other field in the body is ignored;
/// `completedAt` is derived from `completed`.
#[patch("/{id}")]
pub async fn update_todo(
    state: web::Data<AppState>,
    auth: Authenticated,
    todo_id: web::Path<String>,
    patch: web::Json<TodoPatch>,
) -> Result<impl Responder, AppError> {
    found(
        state
            .todos
            .update_owned(auth.user.id, &todo_id, patch.into_inner())
            .await?,
    )
}

/// Deletes a todo and returns it as `{ "todo": ... }`.
#[delete("/{id}")]
pub async fn delete_todo(
    state: web::Data<AppState>,
    auth: Authenticated,
    todo_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    found(state.todos.delete_owned(auth.user.id, &todo_id).await?)
}
