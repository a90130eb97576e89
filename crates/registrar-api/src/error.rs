//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use registrar_core::{
  Error as CoreError, entity::EntityKind, store::StoreError, validate::ValidationErrors,
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("validation failed: {0}")]
  Validation(ValidationErrors),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("unauthenticated")]
  Unauthorized,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn missing(kind: EntityKind) -> Self {
    Self::NotFound(format!("{} not found.", kind.title()))
  }

  /// Map a backend error, surfacing the domain error it carries.
  pub fn from_store<E: StoreError>(err: E) -> Self {
    match err.domain() {
      Some(domain) => Self::from_domain(domain),
      None => Self::Store(Box::new(err)),
    }
  }

  fn from_domain(err: &CoreError) -> Self {
    match err {
      CoreError::Validation(errors) => Self::Validation(errors.clone()),
      CoreError::NotFound { kind, .. } => Self::missing(*kind),
      CoreError::Conflict(message) => Self::Conflict(message.clone()),
      CoreError::Unauthorized => Self::Unauthorized,
    }
  }
}

impl From<CoreError> for ApiError {
  fn from(err: CoreError) -> Self { Self::from_domain(&err) }
}

impl From<ValidationErrors> for ApiError {
  fn from(errors: ValidationErrors) -> Self { Self::Validation(errors) }
}

/// Malformed JSON is a 400; well-formed JSON of the wrong shape is a 422
/// like any other validation failure.
impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    match rejection {
      JsonRejection::JsonDataError(e) => {
        Self::Validation(ValidationErrors::single("body", e.body_text()))
      }
      other => Self::BadRequest(other.body_text()),
    }
  }
}

/// An id segment that is not an integer.
impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

/// A query-string value of the wrong type, such as `?page=abc`.
impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, json!({ "message": m })),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, json!({ "message": m })),
      ApiError::Validation(errors) => (
        StatusCode::UNPROCESSABLE_ENTITY,
        json!({
          "message": errors.first_message().unwrap_or("The given data was invalid."),
          "errors":  errors,
        }),
      ),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, json!({ "message": m })),
      ApiError::Unauthorized => {
        (StatusCode::UNAUTHORIZED, json!({ "message": "Unauthenticated." }))
      }
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, json!({ "message": "Server Error" }))
      }
    };
    (status, Json(body)).into_response()
  }
}
