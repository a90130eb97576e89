//! Error types for `registrar-core`.

use thiserror::Error;

use crate::{entity::EntityKind, lifecycle::View, validate::ValidationErrors};

#[derive(Debug, Error)]
pub enum Error {
  /// Input failed declared field constraints (required, format, uniqueness).
  #[error("validation failed: {0}")]
  Validation(ValidationErrors),

  /// The identifier does not exist within the scope the operation looks in.
  #[error("{kind} {id} not found among {scope} records")]
  NotFound {
    kind:  EntityKind,
    id:    i64,
    scope: View,
  },

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("unauthorized")]
  Unauthorized,
}

impl Error {
  pub fn not_found(kind: EntityKind, id: i64, scope: View) -> Self {
    Self::NotFound { kind, id, scope }
  }
}

impl From<ValidationErrors> for Error {
  fn from(errors: ValidationErrors) -> Self { Self::Validation(errors) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
