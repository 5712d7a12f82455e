//! Escalation contacts: people notified when a subject stops responding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::channel::{Channel, dedup_channels};

/// A person to notify when one of a subject's tasks goes unanswered.
///
/// Contacts are processed in ascending `priority`; equal priorities keep
/// insertion order. Inactive contacts are skipped entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationContact {
  pub contact_id:   Uuid,
  pub subject_id:   Uuid,
  pub display_name: String,
  pub phone_number: Option<String>,
  pub methods:      Vec<Channel>,
  pub priority:     i32,
  pub active:       bool,
  pub created_at:   DateTime<Utc>,
}

/// Input to `SqliteStore::add_contact`.
#[derive(Debug, Clone)]
pub struct NewContact {
  pub subject_id:   Uuid,
  pub display_name: String,
  pub phone_number: Option<String>,
  pub methods:      Vec<Channel>,
  pub priority:     i32,
  pub active:       bool,
}

impl NewContact {
  /// Active SMS contact.
  pub fn new(
    subject_id: Uuid,
    display_name: impl Into<String>,
    phone_number: impl Into<String>,
    priority: i32,
  ) -> Self {
    Self {
      subject_id,
      display_name: display_name.into(),
      phone_number: Some(phone_number.into()),
      methods: vec![Channel::Sms],
      priority,
      active: true,
    }
  }

  pub fn with_methods(mut self, methods: impl IntoIterator<Item = Channel>) -> Self {
    self.methods = dedup_channels(methods);
    self
  }

  pub fn inactive(mut self) -> Self {
    self.active = false;
    self
  }
}
