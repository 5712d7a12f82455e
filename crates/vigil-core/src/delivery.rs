//! Delivery log entries: the append-only audit trail of every reminder and
//! escalation attempt.
//!
//! Entries are created once per attempt and never mutated or deleted by the
//! engine; retention is handled by a separate collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::channel::Channel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryKind {
  Reminder,
  Escalation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
  Sent,
  Failed,
}

/// Why a failed entry failed. Lets operators tell misconfiguration apart from
/// transient provider trouble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
  /// The provider reported a failure or the transport errored.
  Provider,
  /// The provider did not answer within the configured timeout.
  Timeout,
  /// An escalation fired but the subject has no active contacts.
  NoContacts,
  /// The recipient has no phone number on file.
  MissingPhone,
}

impl FailureReason {
  /// Configuration problems, as opposed to transient delivery trouble.
  pub fn is_configuration(self) -> bool {
    matches!(self, Self::NoContacts | Self::MissingPhone)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryLogEntry {
  pub entry_id:     Uuid,
  pub task_id:      Uuid,
  pub subject_id:   Uuid,
  pub kind:         DeliveryKind,
  /// `None` only for entries that never reached a channel (no contacts).
  pub channel:      Option<Channel>,
  pub recipient:    Option<String>,
  pub content:      String,
  pub status:       DeliveryStatus,
  pub provider_ref: Option<String>,
  pub error:        Option<String>,
  pub failure:      Option<FailureReason>,
  pub recorded_at:  DateTime<Utc>,
}

impl DeliveryLogEntry {
  pub fn is_sent(&self) -> bool { self.status == DeliveryStatus::Sent }
}

/// Input to [`crate::store::ReminderStore::append_delivery`]. The entry id is
/// assigned by the store; `recorded_at` is the instant of the tick that made
/// the attempt.
#[derive(Debug, Clone)]
pub struct NewDeliveryLogEntry {
  pub task_id:      Uuid,
  pub subject_id:   Uuid,
  pub kind:         DeliveryKind,
  pub channel:      Option<Channel>,
  pub recipient:    Option<String>,
  pub content:      String,
  pub status:       DeliveryStatus,
  pub provider_ref: Option<String>,
  pub error:        Option<String>,
  pub failure:      Option<FailureReason>,
  pub recorded_at:  DateTime<Utc>,
}
