use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::error::AppError;
use crate::models::User;

/// The caller resolved by `AuthMiddleware`: the user and the exact token it
/// presented.
///
/// Use this extractor only on routes wrapped by `AuthMiddleware`, which
/// inserts it into the request extensions. If it is missing the request is
/// rejected with `AppError::Unauthorized`.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub user: User,
    pub token: String,
}

impl FromRequest for Authenticated {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Authenticated>().cloned() {
            Some(auth) => ready(Ok(auth)),
            None => {
                let err = AppError::Unauthorized("No authenticated user on request".to_string());
                ready(Err(err.into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::dev::Payload;
    use actix_web::http::StatusCode;
    use actix_web::test;

    #[actix_rt::test]
    async fn test_authenticated_extractor_success() {
        let user = User::new("a@example.com", "hash");
        let req = test::TestRequest::default().to_http_request();
        req.extensions_mut().insert(Authenticated {
            user: user.clone(),
            token: "tok".into(),
        });

        let mut payload = Payload::None;
        let extracted = Authenticated::from_request(&req, &mut payload)
            .await
            .unwrap();
        assert_eq!(extracted.user.id, user.id);
        assert_eq!(extracted.token, "tok");
    }

    #[actix_rt::test]
    async fn test_authenticated_extractor_failure() {
        let req = test::TestRequest::default().to_http_request();

        let mut payload = Payload::None;
        let result = Authenticated::from_request(&req, &mut payload).await;
        let err = result.unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }
}
