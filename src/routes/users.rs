use crate::{
    auth::{Authenticated, LoginRequest, RegisterRequest, AUTH_HEADER},
    error::AppError,
    state::AppState,
};
use actix_web::{delete, get, post, web, HttpResponse, Responder};

/// Register a new user
///
/// Creates the account and opens its first session. The user is returned as
/// JSON (`id`, `email`) and the session token in the `x-auth` header.
///
/// ## Responses:
/// - `200 OK`: the new user.
/// - `400 Bad Request`: invalid email, password shorter than 6 characters,
///   or the email is already registered (body carries the conflict `code`).
#[post("")]
pub async fn register(
    state: web::Data<AppState>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    let (user, token) = state
        .credentials
        .register(register_data.into_inner())
        .await?;

    Ok(HttpResponse::Ok()
        .insert_header((AUTH_HEADER, token))
        .json(user))
}

/// Login user
///
/// Opens a new session for valid credentials. The token is appended to the
/// user's sessions and returned in the `x-auth` header.
///
/// ## Responses:
/// - `200 OK`: the user.
/// - `400 Bad Request`: unknown email or wrong password, empty body.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let (user, token) = state
        .credentials
        .authenticate(login_data.into_inner())
        .await?;

    Ok(HttpResponse::Ok()
        .insert_header((AUTH_HEADER, token))
        .json(user))
}

/// The user owning the presented token.
#[get("")]
pub async fn me(auth: Authenticated) -> impl Responder {
    HttpResponse::Ok().json(auth.user)
}

/// Logout
///
/// Revokes the token used for this request.
#[delete("/token")]
pub async fn logout(
    state: web::Data<AppState>,
    auth: Authenticated,
) -> Result<impl Responder, AppError> {
    state.credentials.logout(&auth.user, &auth.token).await?;
    Ok(HttpResponse::Ok().finish())
}
