//! Bearer-token sessions: login, logout, the session middleware and the
//! authenticated admin's profile endpoints.
//!
//! Tokens are 32 random bytes, URL-safe base64 encoded. The store only ever
//! sees their SHA-256 digest.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::{self, SaltString},
};
use axum::{
  Extension, Json,
  extract::{Request, State, rejection::JsonRejection},
  http::{HeaderMap, header},
  middleware::Next,
  response::Response,
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use rand_core::{OsRng, RngCore as _};
use registrar_api::ApiError;
use registrar_core::{
  admin::{Admin, AdminPatch, PasswordChange, Session},
  store::AdminStore,
  validate::ValidationErrors,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sha2::{Digest as _, Sha256};

use crate::AppState;

// ─── Primitives ──────────────────────────────────────────────────────────────

/// Hash `password` into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
}

/// `false` for a wrong password and for an unparseable stored hash alike.
pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc)
    .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
    .is_ok()
}

pub fn new_token() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  URL_SAFE_NO_PAD.encode(bytes)
}

pub fn token_digest(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

// ─── Middleware ──────────────────────────────────────────────────────────────

/// The admin behind the request's bearer token.
#[derive(Debug, Clone)]
pub struct CurrentSession {
  pub admin:        Admin,
  pub token_digest: String,
}

/// Reject requests without an unexpired session; otherwise attach
/// [`CurrentSession`] to the request.
pub async fn require_session<S>(
  State(state): State<AppState<S>>,
  mut req: Request,
  next: Next,
) -> Result<Response, ApiError>
where
  S: AdminStore + 'static,
{
  let digest = bearer_token(req.headers()).map(token_digest).ok_or(ApiError::Unauthorized)?;
  let admin = state
    .store
    .find_session(digest.clone(), Utc::now())
    .await
    .map_err(ApiError::from_store)?
    .ok_or(ApiError::Unauthorized)?;
  req.extensions_mut().insert(CurrentSession { admin, token_digest: digest });
  Ok(next.run(req).await)
}

// ─── Login / logout ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
  #[serde(default)]
  pub email:    String,
  #[serde(default)]
  pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
  pub token:      String,
  pub token_type: &'static str,
  pub expires_at: DateTime<Utc>,
  pub admin:      Admin,
}

/// `POST /api/login`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError>
where
  S: AdminStore + 'static,
{
  let Json(body) = body?;
  let mut errors = ValidationErrors::new();
  errors.email("email", &body.email);
  if body.password.is_empty() {
    errors.add("password", "The password field is required.");
  }
  errors.finish()?;

  let credentials = state
    .store
    .find_admin_credentials(body.email.clone())
    .await
    .map_err(ApiError::from_store)?;
  let admin = match credentials {
    Some((admin, hash)) if verify_password(&body.password, &hash) => admin,
    _ => {
      tracing::warn!(email = %body.email, "failed login");
      return Err(ApiError::Unauthorized);
    }
  };

  let now = Utc::now();
  let pruned = state.store.purge_expired_sessions(now).await.map_err(ApiError::from_store)?;
  if pruned > 0 {
    tracing::debug!(pruned, "expired sessions removed");
  }

  let token = new_token();
  let expires_at = now + Duration::hours(state.config.session_ttl_hours);
  state
    .store
    .create_session(Session {
      token_digest: token_digest(&token),
      admin_id: admin.id,
      created_at: now,
      expires_at,
    })
    .await
    .map_err(ApiError::from_store)?;

  tracing::info!(admin = admin.id, "admin logged in");
  Ok(Json(LoginResponse { token, token_type: "Bearer", expires_at, admin }))
}

/// `POST /api/logout`
pub async fn logout<S>(
  State(state): State<AppState<S>>,
  Extension(session): Extension<CurrentSession>,
) -> Result<Json<Value>, ApiError>
where
  S: AdminStore + 'static,
{
  state.store.delete_session(session.token_digest).await.map_err(ApiError::from_store)?;
  Ok(Json(json!({ "message": "Logged out successfully" })))
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// `GET /api/me`
pub async fn me(Extension(session): Extension<CurrentSession>) -> Json<Admin> {
  Json(session.admin)
}

/// `PUT /api/me`
pub async fn update_me<S>(
  State(state): State<AppState<S>>,
  Extension(session): Extension<CurrentSession>,
  body: Result<Json<AdminPatch>, JsonRejection>,
) -> Result<Json<Admin>, ApiError>
where
  S: AdminStore + 'static,
{
  let Json(patch) = body?;
  let admin = state
    .store
    .update_admin(session.admin.id, patch)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(admin))
}

/// `PUT /api/me/password`
pub async fn update_password<S>(
  State(state): State<AppState<S>>,
  Extension(session): Extension<CurrentSession>,
  body: Result<Json<PasswordChange>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: AdminStore + 'static,
{
  let Json(change) = body?;
  change.validate()?;

  let id = session.admin.id;
  let stored = state
    .store
    .admin_password_hash(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or(ApiError::Unauthorized)?;
  if !verify_password(&change.current_password, &stored) {
    return Err(
      ValidationErrors::single("current_password", "The current password is incorrect.").into(),
    );
  }

  let hash = hash_password(&change.new_password)
    .map_err(|e| ApiError::Store(e.to_string().into()))?;
  state.store.set_admin_password(id, hash).await.map_err(ApiError::from_store)?;
  tracing::info!(admin = id, "password changed");
  Ok(Json(json!({ "message": "Password updated successfully" })))
}
