use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use wishlist_api::auth::{AppState, AppStateInner, create_token};
use wishlist_api::mail::Mailer;
use wishlist_api::router;
use wishlist_core::FulfillmentPolicy;
use wishlist_db::Database;

const SECRET: &str = "router-test-secret";

fn app() -> (Router, AppState) {
    let state: AppState = Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        jwt_secret: SECRET.to_string(),
        mailer: Mailer::Log,
        policy: FulfillmentPolicy::default(),
    });
    (router(state.clone()), state)
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
        Some(body) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Register through the API and return the issued token.
async fn register(app: &Router, id: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "id": id,
            "email": format!("{id}@example.org"),
            "password": "hunter2hunter2",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["token"].as_str().unwrap().to_string()
}

fn mark_verified(state: &AppState, id: &str) {
    state
        .db
        .with_conn(|conn| {
            conn.execute("UPDATE users SET email_verified = 1 WHERE id = ?1", [id])?;
            Ok(())
        })
        .unwrap();
}

async fn verified(app: &Router, state: &AppState, id: &str) -> String {
    let token = register(app, id).await;
    mark_verified(state, id);
    token
}

#[tokio::test]
async fn register_then_login() {
    let (app, _) = app();
    register(&app, "ada").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "id": "ada", "password": "hunter2hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], "ada");

    let (status, body) = call(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "id": "ada", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Username or password is incorrect");
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let (app, _) = app();
    register(&app, "ada").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({ "id": "ada", "email": "other@example.org", "password": "hunter2hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "User already exists");
}

#[tokio::test]
async fn invalid_registration_is_bad_request() {
    let (app, _) = app();
    let (status, _) = call(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({ "id": "Ada!", "email": "ada@example.org", "password": "hunter2hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({ "id": "ada", "email": "ada@example.org", "password": "short" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // would be shadowed by the /users/me routes
    let (status, _) = call(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({ "id": "me", "email": "me@example.org", "password": "hunter2hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn token_problems_are_unauthorized() {
    let (app, _) = app();

    let (status, body) = call(&app, Method::POST, "/wishes/1/claim", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Bearer token is malformed");

    let (status, body) = call(&app, Method::POST, "/wishes/1/claim", Some("x.y"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token malformed");

    let foreign = create_token("some-other-secret", "ada", "ada@example.org").unwrap();
    let (status, body) = call(&app, Method::POST, "/wishes/1/claim", Some(&foreign), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token is invalid");
}

#[tokio::test]
async fn token_for_deleted_user_is_not_found() {
    let (app, _) = app();
    let token = register(&app, "ada").await;

    let (status, _) = call(&app, Method::DELETE, "/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, Method::POST, "/auth/code", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");
}

#[tokio::test]
async fn verification_endpoints() {
    let (app, state) = app();
    let token = register(&app, "ada").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/auth/verify",
        Some(&token),
        Some(json!({ "code": "definitely-wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Code does not match");

    // a live code blocks a resend
    let (status, _) = call(&app, Method::POST, "/auth/code", Some(&token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    mark_verified(&state, "ada");
    let (status, body) = call(&app, Method::POST, "/auth/code", Some(&token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Email is already verified");
}

#[tokio::test]
async fn unverified_user_cannot_create_wish() {
    let (app, _) = app();
    let token = register(&app, "ada").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/wishes",
        Some(&token),
        Some(json!({ "name": "teapot" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "User not authorized");
}

#[tokio::test]
async fn friendship_and_fulfillment_over_http() {
    let (app, state) = app();
    let alice = verified(&app, &state, "alice").await;
    let bob = verified(&app, &state, "bob").await;
    let carol = verified(&app, &state, "carol").await;

    let (status, _) = call(&app, Method::POST, "/friend-requests/bob", Some(&alice), None).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = call(&app, Method::POST, "/friend-requests/bob", Some(&alice), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) =
        call(&app, Method::GET, "/users/bob/friend-requests", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], "alice");

    let (status, _) =
        call(&app, Method::POST, "/friend-requests/alice/accept", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        &app,
        Method::POST,
        "/wishes",
        Some(&bob),
        Some(json!({ "name": "teapot", "link": "https://shop.example/teapot" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let wish = body["id"].as_i64().unwrap();

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/wishes/{wish}/interest"),
        Some(&carol),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/wishes/{wish}/interest"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/wishes/{wish}/claim"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(
        &app,
        Method::GET,
        &format!("/wishes/{wish}/claimers"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/wishes/{wish}/claimers"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], "alice");

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/wishes/{wish}/claimers/alice/accept"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/wishes/{wish}/fulfillers?page=1&limit=5"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], "alice");

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/wishes/{wish}/claimers/alice/reject"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");
}

#[tokio::test]
async fn public_reads_and_paging_limits() {
    let (app, state) = app();
    let bob = verified(&app, &state, "bob").await;
    call(
        &app,
        Method::POST,
        "/wishes",
        Some(&bob),
        Some(json!({ "name": "scarf" })),
    )
    .await;

    let (status, body) = call(&app, Method::GET, "/users/bob", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "bob");
    assert!(body.get("email").is_none());

    let (status, body) = call(&app, Method::GET, "/users/bob/wishes", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "scarf");

    let (status, _) = call(&app, Method::GET, "/users/bob/wishes?limit=11", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(&app, Method::GET, "/wishes/999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Wish not found");
}
