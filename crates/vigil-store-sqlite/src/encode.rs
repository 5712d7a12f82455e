//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Channel sets are stored as
//! compact JSON arrays. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, Utc};
use vigil_core::{
  channel::Channel,
  contact::EscalationContact,
  delivery::{DeliveryKind, DeliveryLogEntry, DeliveryStatus, FailureReason},
  greeting::{GreetingTemplate, TimeBucket},
  schedule::{ReminderSchedule, ScheduleDay, TimeOfDay},
  subject::{ConversationPrefs, Subject},
  task::ReminderTask,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ────────────────────────────────────────────────────────────────

pub fn encode_date(day: NaiveDate) -> String { day.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── Channels ─────────────────────────────────────────────────────────────────

pub fn encode_channels(channels: &[Channel]) -> Result<String> {
  Ok(serde_json::to_string(channels)?)
}

pub fn decode_channels(s: &str) -> Result<Vec<Channel>> {
  Ok(serde_json::from_str(s)?)
}

fn decode_opt_channel(s: Option<String>) -> Result<Option<Channel>> {
  Ok(s.as_deref().map(str::parse::<Channel>).transpose()?)
}

// ─── Delivery enums ───────────────────────────────────────────────────────────

pub fn encode_kind(k: DeliveryKind) -> &'static str {
  match k {
    DeliveryKind::Reminder => "reminder",
    DeliveryKind::Escalation => "escalation",
  }
}

pub fn decode_kind(s: &str) -> Result<DeliveryKind> {
  match s {
    "reminder" => Ok(DeliveryKind::Reminder),
    "escalation" => Ok(DeliveryKind::Escalation),
    other => Err(Error::UnknownValue { column: "kind", value: other.to_owned() }),
  }
}

pub fn encode_status(s: DeliveryStatus) -> &'static str {
  match s {
    DeliveryStatus::Sent => "sent",
    DeliveryStatus::Failed => "failed",
  }
}

pub fn decode_status(s: &str) -> Result<DeliveryStatus> {
  match s {
    "sent" => Ok(DeliveryStatus::Sent),
    "failed" => Ok(DeliveryStatus::Failed),
    other => Err(Error::UnknownValue { column: "status", value: other.to_owned() }),
  }
}

pub fn encode_failure(f: FailureReason) -> &'static str {
  match f {
    FailureReason::Provider => "provider",
    FailureReason::Timeout => "timeout",
    FailureReason::NoContacts => "no_contacts",
    FailureReason::MissingPhone => "missing_phone",
  }
}

pub fn decode_failure(s: &str) -> Result<FailureReason> {
  match s {
    "provider" => Ok(FailureReason::Provider),
    "timeout" => Ok(FailureReason::Timeout),
    "no_contacts" => Ok(FailureReason::NoContacts),
    "missing_phone" => Ok(FailureReason::MissingPhone),
    other => Err(Error::UnknownValue { column: "failure_reason", value: other.to_owned() }),
  }
}

// ─── Schedule parts ───────────────────────────────────────────────────────────

pub fn decode_day(index: Option<u8>) -> Result<ScheduleDay> {
  match index {
    None => Ok(ScheduleDay::EveryDay),
    Some(i) => Ok(ScheduleDay::from_index(i)?),
  }
}

pub fn encode_bucket(b: Option<TimeBucket>) -> Option<&'static str> { b.map(TimeBucket::as_str) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `subjects` row.
pub struct RawSubject {
  pub subject_id:         String,
  pub display_name:       String,
  pub phone_number:       Option<String>,
  pub conversational:     bool,
  pub conversation_style: String,
  pub wellbeing_check:    bool,
  pub created_at:         String,
}

impl RawSubject {
  pub const COLUMNS: &'static str = "subject_id, display_name, phone_number, conversational, \
                                     conversation_style, wellbeing_check, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subject_id:         row.get(0)?,
      display_name:       row.get(1)?,
      phone_number:       row.get(2)?,
      conversational:     row.get(3)?,
      conversation_style: row.get(4)?,
      wellbeing_check:    row.get(5)?,
      created_at:         row.get(6)?,
    })
  }

  pub fn into_subject(self) -> Result<Subject> {
    Ok(Subject {
      subject_id:   decode_uuid(&self.subject_id)?,
      display_name: self.display_name,
      phone_number: self.phone_number,
      conversation: ConversationPrefs {
        enabled:         self.conversational,
        style:           self.conversation_style,
        wellbeing_check: self.wellbeing_check,
      },
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `tasks` row.
pub struct RawTask {
  pub task_id:              String,
  pub subject_id:           String,
  pub title:                String,
  pub message:              Option<String>,
  pub delivery_methods:     String,
  pub use_voice_clone:      bool,
  pub voice_profile:        Option<String>,
  pub escalation_threshold: u32,
  pub attempts_today:       u32,
  pub last_satisfied_at:    Option<String>,
  pub escalated_at:         Option<String>,
  pub created_at:           String,
}

impl RawTask {
  pub const COLUMNS: &'static str = "task_id, subject_id, title, message, delivery_methods, \
                                     use_voice_clone, voice_profile, escalation_threshold, \
                                     attempts_today, last_satisfied_at, escalated_at, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      task_id:              row.get(0)?,
      subject_id:           row.get(1)?,
      title:                row.get(2)?,
      message:              row.get(3)?,
      delivery_methods:     row.get(4)?,
      use_voice_clone:      row.get(5)?,
      voice_profile:        row.get(6)?,
      escalation_threshold: row.get(7)?,
      attempts_today:       row.get(8)?,
      last_satisfied_at:    row.get(9)?,
      escalated_at:         row.get(10)?,
      created_at:           row.get(11)?,
    })
  }

  pub fn into_task(self) -> Result<ReminderTask> {
    Ok(ReminderTask {
      task_id:              decode_uuid(&self.task_id)?,
      subject_id:           decode_uuid(&self.subject_id)?,
      title:                self.title,
      message:              self.message,
      delivery_methods:     decode_channels(&self.delivery_methods)?,
      use_voice_clone:      self.use_voice_clone,
      voice_profile:        self.voice_profile,
      escalation_threshold: self.escalation_threshold,
      attempts_today:       self.attempts_today,
      last_satisfied_at:    decode_opt_dt(self.last_satisfied_at)?,
      escalated_at:         decode_opt_dt(self.escalated_at)?,
      created_at:           decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `schedules` row.
pub struct RawSchedule {
  pub schedule_id: String,
  pub task_id:     String,
  pub day_of_week: Option<u8>,
  pub hour:        u8,
  pub minute:      u8,
}

impl RawSchedule {
  pub fn into_schedule(self) -> Result<ReminderSchedule> {
    Ok(ReminderSchedule {
      schedule_id: decode_uuid(&self.schedule_id)?,
      task_id:     decode_uuid(&self.task_id)?,
      day:         decode_day(self.day_of_week)?,
      time:        TimeOfDay::new(self.hour, self.minute)?,
    })
  }
}

/// Raw values read directly from an `escalation_contacts` row.
pub struct RawContact {
  pub contact_id:   String,
  pub subject_id:   String,
  pub display_name: String,
  pub phone_number: Option<String>,
  pub methods:      String,
  pub priority:     i32,
  pub active:       bool,
  pub created_at:   String,
}

impl RawContact {
  pub const COLUMNS: &'static str = "contact_id, subject_id, display_name, phone_number, \
                                     methods, priority, active, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      contact_id:   row.get(0)?,
      subject_id:   row.get(1)?,
      display_name: row.get(2)?,
      phone_number: row.get(3)?,
      methods:      row.get(4)?,
      priority:     row.get(5)?,
      active:       row.get(6)?,
      created_at:   row.get(7)?,
    })
  }

  pub fn into_contact(self) -> Result<EscalationContact> {
    Ok(EscalationContact {
      contact_id:   decode_uuid(&self.contact_id)?,
      subject_id:   decode_uuid(&self.subject_id)?,
      display_name: self.display_name,
      phone_number: self.phone_number,
      methods:      decode_channels(&self.methods)?,
      priority:     self.priority,
      active:       self.active,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `greeting_templates` row.
pub struct RawTemplate {
  pub template_id:     String,
  pub style:           String,
  pub time_bucket:     Option<String>,
  pub greeting:        String,
  pub wellbeing_check: Option<String>,
  pub closing:         Option<String>,
}

impl RawTemplate {
  pub fn into_template(self) -> Result<GreetingTemplate> {
    Ok(GreetingTemplate {
      template_id:     decode_uuid(&self.template_id)?,
      style:           self.style,
      bucket:          self.time_bucket.as_deref().map(str::parse::<TimeBucket>).transpose()?,
      greeting:        self.greeting,
      wellbeing_check: self.wellbeing_check,
      closing:         self.closing,
    })
  }
}

/// Raw values read directly from a `delivery_log` row.
pub struct RawDelivery {
  pub entry_id:       String,
  pub task_id:        String,
  pub subject_id:     String,
  pub kind:           String,
  pub channel:        Option<String>,
  pub recipient:      Option<String>,
  pub content:        String,
  pub status:         String,
  pub provider_ref:   Option<String>,
  pub error_detail:   Option<String>,
  pub failure_reason: Option<String>,
  pub recorded_at:    String,
}

impl RawDelivery {
  pub const COLUMNS: &'static str = "entry_id, task_id, subject_id, kind, channel, recipient, \
                                     content, status, provider_ref, error_detail, \
                                     failure_reason, recorded_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      entry_id:       row.get(0)?,
      task_id:        row.get(1)?,
      subject_id:     row.get(2)?,
      kind:           row.get(3)?,
      channel:        row.get(4)?,
      recipient:      row.get(5)?,
      content:        row.get(6)?,
      status:         row.get(7)?,
      provider_ref:   row.get(8)?,
      error_detail:   row.get(9)?,
      failure_reason: row.get(10)?,
      recorded_at:    row.get(11)?,
    })
  }

  pub fn into_entry(self) -> Result<DeliveryLogEntry> {
    Ok(DeliveryLogEntry {
      entry_id:     decode_uuid(&self.entry_id)?,
      task_id:      decode_uuid(&self.task_id)?,
      subject_id:   decode_uuid(&self.subject_id)?,
      kind:         decode_kind(&self.kind)?,
      channel:      decode_opt_channel(self.channel)?,
      recipient:    self.recipient,
      content:      self.content,
      status:       decode_status(&self.status)?,
      provider_ref: self.provider_ref,
      error:        self.error_detail,
      failure:      self.failure_reason.as_deref().map(decode_failure).transpose()?,
      recorded_at:  decode_dt(&self.recorded_at)?,
    })
  }
}
