//! Error types for `vigil-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("day of week out of range (expected 0-6): {0}")]
  InvalidDayOfWeek(u8),

  #[error("time of day out of range: {hour:02}:{minute:02}")]
  InvalidTimeOfDay { hour: u8, minute: u8 },

  #[error("cannot parse time of day: {0:?}")]
  UnparsableTimeOfDay(String),

  #[error("escalation threshold must be at least 1")]
  ZeroThreshold,

  #[error("unknown channel discriminant: {0:?}")]
  UnknownChannel(String),

  #[error("unknown time bucket: {0:?}")]
  UnknownTimeBucket(String),

  #[error("voice cloning is not available")]
  VoiceCloneUnavailable,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
