use actix_cors::Cors;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::middleware::Logger;
use actix_web::{http::StatusCode, rt, test, web, App, HttpServer};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::net::TcpListener;
use todo_api::auth::AUTH_HEADER;
use todo_api::routes;
use todo_api::state::AppState;

fn state() -> web::Data<AppState> {
    web::Data::new(AppState::in_memory("todos-integration-secret", 4))
}

macro_rules! init_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data($state.clone())
                .wrap(Logger::default())
                .configure(routes::config),
        )
        .await
    };
}

/// Registers a user through the API and returns its token.
async fn register_user(
    app: &impl Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    email: &str,
) -> String {
    let req = test::TestRequest::post()
        .uri("/users")
        .set_json(json!({ "email": email, "password": "secret1" }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::OK, "registering {}", email);
    resp.headers()
        .get(AUTH_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .expect("register must return x-auth")
}

async fn create_todo(
    app: &impl Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    token: &str,
    text: &str,
) -> Value {
    let req = test::TestRequest::post()
        .uri("/todos")
        .insert_header((AUTH_HEADER, token))
        .set_json(json!({ "text": text }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    test::read_body_json(resp).await
}

#[actix_rt::test]
async fn test_create_todo_unauthorized() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let server_state = state();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(server_state.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(routes::config)
    })
    .workers(1)
    .listen(listener)
    .expect("Failed to listen")
    .run();
    let handle = server.handle();
    rt::spawn(server);

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://127.0.0.1:{}/todos", port))
        .json(&json!({ "text": "Unauthorized todo" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
    assert_eq!(resp.text().await.unwrap(), "");

    handle.stop(true).await;
}

#[test_log::test(actix_rt::test)]
async fn test_owner_scenario() {
    let state = state();
    let app = init_app!(state);

    let token_a = register_user(&app, "a@example.com").await;

    let req = test::TestRequest::post()
        .uri("/users/login")
        .set_json(json!({ "email": "a@example.com", "password": "secret1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key(AUTH_HEADER));
    let user_a = state
        .credentials
        .find_by_token(&token_a)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user_a.tokens.len(), 2);

    let todo = create_todo(&app, &token_a, "buy milk").await;
    assert_eq!(todo["text"], "buy milk");
    assert_eq!(todo["completed"], false);
    assert!(todo["completedAt"].is_null());
    assert_eq!(todo["creatorId"], user_a.id.to_string());
    let id = todo["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/todos")
        .insert_header((AUTH_HEADER, token_a.clone()))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["todos"].as_array().unwrap().len(), 1);

    let token_b = register_user(&app, "b@example.com").await;
    let req = test::TestRequest::get()
        .uri(&format!("/todos/{}", id))
        .insert_header((AUTH_HEADER, token_b))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::patch()
        .uri(&format!("/todos/{}", id))
        .insert_header((AUTH_HEADER, token_a.clone()))
        .set_json(json!({ "completed": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["todo"]["completed"], true);
    assert!(body["todo"]["completedAt"].is_i64());

    let req = test::TestRequest::patch()
        .uri(&format!("/todos/{}", id))
        .insert_header((AUTH_HEADER, token_a.clone()))
        .set_json(json!({ "completed": false }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["todo"]["completed"], false);
    assert!(body["todo"]["completedAt"].is_null());

    let req = test::TestRequest::delete()
        .uri(&format!("/todos/{}", id))
        .insert_header((AUTH_HEADER, token_a.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["todo"]["id"], id.as_str());
    assert_eq!(body["todo"]["text"], "buy milk");

    let req = test::TestRequest::get()
        .uri(&format!("/todos/{}", id))
        .insert_header((AUTH_HEADER, token_a))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_other_users_todos_are_invisible() {
    let state = state();
    let app = init_app!(state);

    let token_a = register_user(&app, "owner@example.com").await;
    let token_b = register_user(&app, "intruder@example.com").await;
    let todo = create_todo(&app, &token_a, "private").await;
    let uri = format!("/todos/{}", todo["id"].as_str().unwrap());

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header((AUTH_HEADER, token_b.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(test::read_body(resp).await.is_empty());

    let req = test::TestRequest::patch()
        .uri(&uri)
        .insert_header((AUTH_HEADER, token_b.clone()))
        .set_json(json!({ "text": "mine now", "completed": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header((AUTH_HEADER, token_b.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri("/todos")
        .insert_header((AUTH_HEADER, token_b))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({ "todos": [] }));

    // Untouched for the owner.
    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header((AUTH_HEADER, token_a))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["todo"]["text"], "private");
    assert_eq!(body["todo"]["completed"], false);
}

#[actix_rt::test]
async fn test_invalid_ids_are_not_found() {
    let state = state();
    let app = init_app!(state);
    let token = register_user(&app, "ids@example.com").await;

    for uri in [
        "/todos/123",
        "/todos/not-a-uuid",
        "/todos/00000000-0000-0000-0000-000000000000",
    ] {
        let req = test::TestRequest::get()
            .uri(uri)
            .insert_header((AUTH_HEADER, token.clone()))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND,
            "GET {}",
            uri
        );

        let req = test::TestRequest::patch()
            .uri(uri)
            .insert_header((AUTH_HEADER, token.clone()))
            .set_json(json!({ "completed": true }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND,
            "PATCH {}",
            uri
        );

        let req = test::TestRequest::delete()
            .uri(uri)
            .insert_header((AUTH_HEADER, token.clone()))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND,
            "DELETE {}",
            uri
        );
    }
}

#[actix_rt::test]
async fn test_create_todo_validation() {
    let state = state();
    let app = init_app!(state);
    let token = register_user(&app, "valid@example.com").await;

    for payload in [json!({}), json!({ "text": "" }), json!({ "text": 5 })] {
        let req = test::TestRequest::post()
            .uri("/todos")
            .insert_header((AUTH_HEADER, token.clone()))
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "payload {}", payload);
    }

    let req = test::TestRequest::get()
        .uri("/todos")
        .insert_header((AUTH_HEADER, token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["todos"].as_array().unwrap().is_empty());
}

#[actix_rt::test]
async fn test_completed_at_cannot_be_set_directly() {
    let state = state();
    let app = init_app!(state);
    let token = register_user(&app, "stamp@example.com").await;
    let todo = create_todo(&app, &token, "stamp me").await;
    let uri = format!("/todos/{}", todo["id"].as_str().unwrap());

    // Omitted `completed` clears the stamp even when one is supplied.
    let req = test::TestRequest::patch()
        .uri(&uri)
        .insert_header((AUTH_HEADER, token.clone()))
        .set_json(json!({ "text": "renamed", "completedAt": 123 }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["todo"]["text"], "renamed");
    assert_eq!(body["todo"]["completed"], false);
    assert!(body["todo"]["completedAt"].is_null());

    // Completing ignores the supplied value and stamps the current time.
    let req = test::TestRequest::patch()
        .uri(&uri)
        .insert_header((AUTH_HEADER, token.clone()))
        .set_json(json!({ "completed": true, "completedAt": 123, "creatorId": "x" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["todo"]["completed"], true);
    let stamp = body["todo"]["completedAt"].as_i64().unwrap();
    assert!(stamp > 123);
    assert_eq!(body["todo"]["creatorId"], todo["creatorId"]);

    // A non-boolean `completed` counts as not completed.
    let req = test::TestRequest::patch()
        .uri(&uri)
        .insert_header((AUTH_HEADER, token))
        .set_json(json!({ "completed": "true" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["todo"]["completed"], false);
    assert!(body["todo"]["completedAt"].is_null());
}
