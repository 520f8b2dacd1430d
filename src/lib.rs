#![doc = "The `todo_api` library crate."]
#![doc = ""]
#![doc = "Authentication (token issuance, resolution and revocation), the ownership-scoped"]
#![doc = "todo repository, persistence backends, routing and error handling. The binary"]
#![doc = "(`main.rs`) only loads configuration, opens the store and runs the server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
pub mod todos;

pub use crate::error::AppError;
pub use crate::state::AppState;
