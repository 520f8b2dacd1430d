pub mod health;
pub mod todos;
pub mod users;

use actix_web::web;

use crate::auth::AuthMiddleware;
use crate::error::AppError;

/// Malformed or incomplete JSON bodies answer `400` with `{ "error": ... }`.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into())
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(health::health)
        .service(
            web::scope("/users")
                .service(users::register)
                .service(users::login)
                .service(
                    web::scope("/me")
                        .wrap(AuthMiddleware)
                        .service(users::me)
                        .service(users::logout),
                ),
        )
        .service(
            web::scope("/todos")
                .wrap(AuthMiddleware)
                .service(todos::get_todos)
                .service(todos::create_todo)
                .service(todos::get_todo)
                .service(todos::update_todo)
                .service(todos::delete_todo),
        );
}
