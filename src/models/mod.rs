pub mod todo;
pub mod user;

pub use todo::{NewTodo, Todo, TodoChanges, TodoPatch};
pub use user::{AuthToken, User, AUTH_ACCESS};
