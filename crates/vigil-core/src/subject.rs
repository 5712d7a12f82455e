//! Subject: the care recipient a reminder is delivered to.
//!
//! Subjects are owned by the surrounding care record; the engine only reads
//! them to address and personalise notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a subject prefers to be greeted on voice calls and messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationPrefs {
  /// When `false` the plain default message is always used.
  pub enabled:         bool,
  /// Greeting style key, e.g. "warm" or "brief".
  pub style:           String,
  /// Include the template's wellbeing-check phrase before the reminder body.
  pub wellbeing_check: bool,
}

impl Default for ConversationPrefs {
  fn default() -> Self {
    Self {
      enabled:         false,
      style:           "warm".to_owned(),
      wellbeing_check: false,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
  pub subject_id:   Uuid,
  pub display_name: String,
  /// Missing numbers are a configuration error surfaced in the delivery log.
  pub phone_number: Option<String>,
  pub conversation: ConversationPrefs,
  pub created_at:   DateTime<Utc>,
}

/// Input to `SqliteStore::add_subject`.
#[derive(Debug, Clone)]
pub struct NewSubject {
  pub display_name: String,
  pub phone_number: Option<String>,
  pub conversation: ConversationPrefs,
}

impl NewSubject {
  pub fn new(display_name: impl Into<String>, phone_number: impl Into<String>) -> Self {
    Self {
      display_name: display_name.into(),
      phone_number: Some(phone_number.into()),
      conversation: ConversationPrefs::default(),
    }
  }
}
