//! Error type for `cod-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored enum column held a value the current code does not know.
  #[error("unknown {column} value: {value:?}")]
  UnknownValue { column: &'static str, value: String },

  /// An insert collided with an existing primary or unique key.
  #[error("{0} already exists")]
  Duplicate(String),
}

impl From<Error> for cod_core::Error {
  fn from(err: Error) -> Self {
    match err {
      Error::Duplicate(what) => Self::DuplicateKey(what),
      other => Self::Store(Box::new(other)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
