//! Error type for `vigil-engine`.
//!
//! None of these abort a tick: a failure while processing one schedule is
//! recorded in the [`TickSummary`](crate::TickSummary) and the tick moves on.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("task {0} not found")]
  TaskNotFound(Uuid),

  #[error("subject {0} not found")]
  SubjectNotFound(Uuid),

  #[error("invalid reference zone: {0:?}")]
  InvalidZone(String),
}

impl Error {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
