use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use log::{debug, warn};
use std::rc::Rc;

use crate::auth::{Authenticated, AUTH_HEADER};
use crate::error::AppError;
use crate::state::AppState;

/// Rejects any request whose `x-auth` header does not resolve to a live
/// session, and attaches [`Authenticated`] to the ones that do.
///
/// Rejections are answered here with an empty `401`; the wrapped handlers
/// never run. The middleware does not look at which resource is requested.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            match resolve(&req).await {
                Ok(auth) => {
                    req.extensions_mut().insert(auth);
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                }
                Err(app_err) => {
                    debug!("Rejected {} {}: {}", req.method(), req.path(), app_err);
                    Ok(req.error_response(app_err).map_into_right_body())
                }
            }
        })
    }
}

async fn resolve(req: &ServiceRequest) -> Result<Authenticated, AppError> {
    let token = req
        .headers()
        .get(AUTH_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .ok_or_else(|| AppError::Unauthorized("Missing token".into()))?;

    let state = req
        .app_data::<web::Data<AppState>>()
        .cloned()
        .ok_or_else(|| AppError::InternalServerError("Application state is not configured".into()))?;

    match state.credentials.find_by_token(&token).await {
        Ok(Some(user)) => Ok(Authenticated { user, token }),
        Ok(None) => Err(AppError::Unauthorized("Invalid or revoked token".into())),
        Err(e) => {
            warn!("Token lookup failed: {}", e);
            Err(AppError::Unauthorized(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{get, test, App, HttpResponse, Responder};

    #[get("/whoami")]
    async fn whoami(auth: Authenticated) -> impl Responder {
        HttpResponse::Ok().body(auth.user.email)
    }

    #[actix_rt::test]
    async fn test_requests_without_valid_token_are_rejected() {
        let state = web::Data::new(AppState::in_memory("middleware-test", 4));
        let app = test::init_service(
            App::new()
                .app_data(state.clone())
                .service(web::scope("").wrap(AuthMiddleware).service(whoami)),
        )
        .await;

        let req = test::TestRequest::get().uri("/whoami").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);
        assert!(test::read_body(resp).await.is_empty());

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header((AUTH_HEADER, "not-a-token"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);
    }

    #[actix_rt::test]
    async fn test_valid_token_reaches_handler() {
        let state = web::Data::new(AppState::in_memory("middleware-test", 4));
        let (_, token) = state
            .credentials
            .register(crate::auth::RegisterRequest {
                email: "mw@example.com".into(),
                password: "secret1".into(),
            })
            .await
            .unwrap();

        let app = test::init_service(
            App::new()
                .app_data(state.clone())
                .service(web::scope("").wrap(AuthMiddleware).service(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header((AUTH_HEADER, token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(test::read_body(resp).await, "mw@example.com");
    }
}
