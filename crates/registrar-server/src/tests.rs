//! End-to-end router tests: login, bearer auth and the profile endpoints.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use registrar_core::{admin::NewAdmin, store::AdminStore};
use registrar_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{AppState, ServerConfig, auth, router};

const EMAIL: &str = "admin@example.edu";
const PASSWORD: &str = "secret-password";

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  store
    .create_admin(NewAdmin {
      name:          "Registrar".into(),
      email:         EMAIL.into(),
      password_hash: auth::hash_password(PASSWORD).unwrap(),
    })
    .await
    .unwrap();
  router(AppState { store: Arc::new(store), config: Arc::new(ServerConfig::default()) })
}

async fn send(
  app: &Router,
  method: &str,
  uri: &str,
  token: Option<&str>,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(token) = token {
    builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
  }
  let req = match body {
    Some(body) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };
  let resp = app.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
  (status, value)
}

async fn login(app: &Router, password: &str) -> (StatusCode, Value) {
  send(app, "POST", "/api/login", None, Some(json!({ "email": EMAIL, "password": password })))
    .await
}

async fn token(app: &Router) -> String {
  let (status, body) = login(app, PASSWORD).await;
  assert_eq!(status, StatusCode::OK, "{body}");
  body["token"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn health_is_public() {
  let app = app().await;
  let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
  let resp = app.oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn resources_require_a_session() {
  let app = app().await;

  let (status, body) = send(&app, "GET", "/api/students", None, None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body, json!({ "message": "Unauthenticated." }));

  let (status, _) = send(&app, "GET", "/api/students", Some("not-a-token"), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let token = token(&app).await;
  let (status, body) = send(&app, "GET", "/api/students", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
  let app = app().await;
  let (status, body) = login(&app, "nope-nope").await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert!(body.get("token").is_none());

  let (status, body) =
    send(&app, "POST", "/api/login", None, Some(json!({ "email": "", "password": "" }))).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert!(body["errors"]["email"].is_array());
}

#[tokio::test]
async fn logout_revokes_the_token() {
  let app = app().await;
  let token = token(&app).await;

  let (status, me) = send(&app, "GET", "/api/me", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(me["email"], EMAIL);

  let (status, _) = send(&app, "POST", "/api/logout", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);

  let (status, _) = send(&app, "GET", "/api/me", Some(&token), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_update() {
  let app = app().await;
  let token = token(&app).await;

  let (status, admin) =
    send(&app, "PUT", "/api/me", Some(&token), Some(json!({ "name": "Head Registrar" }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(admin["name"], "Head Registrar");
  assert_eq!(admin["email"], EMAIL);

  let (status, body) =
    send(&app, "PUT", "/api/me", Some(&token), Some(json!({ "email": "not-an-email" }))).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert!(body["errors"]["email"].is_array());
}

#[tokio::test]
async fn password_change() {
  let app = app().await;
  let token = token(&app).await;

  let (status, body) = send(
    &app,
    "PUT",
    "/api/me/password",
    Some(&token),
    Some(json!({
      "current_password":          "wrong-password",
      "new_password":              "another-secret",
      "new_password_confirmation": "another-secret",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert!(body["errors"]["current_password"].is_array());

  let (status, body) = send(
    &app,
    "PUT",
    "/api/me/password",
    Some(&token),
    Some(json!({
      "current_password":          PASSWORD,
      "new_password":              "abc",
      "new_password_confirmation": "abc",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert!(body["errors"]["new_password"].is_array());

  let (status, _) = send(
    &app,
    "PUT",
    "/api/me/password",
    Some(&token),
    Some(json!({
      "current_password":          PASSWORD,
      "new_password":              "another-secret",
      "new_password_confirmation": "another-secret",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  assert_eq!(login(&app, PASSWORD).await.0, StatusCode::UNAUTHORIZED);
  assert_eq!(login(&app, "another-secret").await.0, StatusCode::OK);
}

#[test]
fn tokens_are_random_and_digested() {
  let a = auth::new_token();
  let b = auth::new_token();
  assert_ne!(a, b);
  assert_eq!(a.len(), 43);
  let digest = auth::token_digest(&a);
  assert_eq!(digest.len(), 64);
  assert_eq!(digest, auth::token_digest(&a));
}
