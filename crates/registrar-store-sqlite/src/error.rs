//! Error type for `registrar-store-sqlite`.

use registrar_core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A domain failure: validation, not found, conflict.
  #[error(transparent)]
  Core(#[from] registrar_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored column holds a value the domain does not recognise.
  #[error("invalid stored value in {column}: {value:?}")]
  Decode { column: &'static str, value: String },
}

impl StoreError for Error {
  fn domain(&self) -> Option<&registrar_core::Error> {
    match self {
      Self::Core(e) => Some(e),
      _ => None,
    }
  }
}

impl From<registrar_core::validate::ValidationErrors> for Error {
  fn from(errors: registrar_core::validate::ValidationErrors) -> Self {
    Self::Core(errors.into())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
