//! Error type for `vigil-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] vigil_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown enum value in column {column}: {value:?}")]
  UnknownValue { column: &'static str, value: String },

  #[error("subject not found: {0}")]
  SubjectNotFound(uuid::Uuid),

  #[error("task not found: {0}")]
  TaskNotFound(uuid::Uuid),

  #[error("contact not found: {0}")]
  ContactNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
