//! The `ReminderStore` trait and supporting types.
//!
//! The trait is implemented by storage backends (e.g. `vigil-store-sqlite`).
//! The engine depends on this abstraction, not on any concrete backend.
//! Creating and editing tasks, schedules and contacts belongs to the
//! surrounding product; the trait only carries what a scheduling tick reads
//! and the counter updates it makes.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  contact::EscalationContact,
  delivery::{DeliveryLogEntry, NewDeliveryLogEntry},
  greeting::{GreetingTemplate, TimeBucket},
  schedule::{OccurrenceKey, ReminderSchedule, TimeOfDay},
  subject::Subject,
  task::ReminderTask,
};

/// Result of [`ReminderStore::reset_day`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayReset {
  pub day:         NaiveDate,
  /// `false` when `day` had already been reset; nothing was touched.
  pub performed:   bool,
  pub tasks_reset: usize,
  /// The most recent day reset so far, including this call.
  pub latest:      NaiveDate,
}

impl DayReset {
  /// A later day has already begun; `day` is over.
  pub fn is_stale(&self) -> bool { self.latest > self.day }
}

/// Abstraction over the engine's persistent store.
///
/// Counter updates (`record_attempt`, `open_escalation`, `claim_occurrence`)
/// must be atomic in the backend: the "escalate once per day" guarantee
/// relies on them holding under duplicate or concurrent ticks.
pub trait ReminderStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Tick reads ──────────────────────────────────────────────────────────

  /// All schedules whose time of day is `time`, on any day.
  fn schedules_at(
    &self,
    time: TimeOfDay,
  ) -> impl Future<Output = Result<Vec<ReminderSchedule>, Self::Error>> + Send + '_;

  fn get_task(
    &self,
    task_id: Uuid,
  ) -> impl Future<Output = Result<Option<ReminderTask>, Self::Error>> + Send + '_;

  fn get_subject(
    &self,
    subject_id: Uuid,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  /// Active contacts for a subject, ascending priority, ties in insertion
  /// order.
  fn active_contacts(
    &self,
    subject_id: Uuid,
  ) -> impl Future<Output = Result<Vec<EscalationContact>, Self::Error>> + Send + '_;

  /// Look up the template for exactly (`style`, `bucket`). A `None` bucket
  /// selects the style's "any time" template.
  fn greeting_template<'a>(
    &'a self,
    style: &'a str,
    bucket: Option<TimeBucket>,
  ) -> impl Future<Output = Result<Option<GreetingTemplate>, Self::Error>> + Send + 'a;

  // ── Counter updates ─────────────────────────────────────────────────────

  /// Claim one schedule occurrence. Returns `false` if the same key was
  /// already claimed, i.e. this is a duplicate tick.
  fn claim_occurrence<'a>(
    &'a self,
    key: &'a OccurrenceKey,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Atomically increment `attempts_today` and return the new value.
  fn record_attempt(
    &self,
    task_id: Uuid,
  ) -> impl Future<Output = Result<u32, Self::Error>> + Send + '_;

  /// Compare-and-swap `escalated_at` from null to `at`, only while
  /// `attempts_today >= escalation_threshold`. Returns `true` if this call
  /// opened the escalation.
  fn open_escalation(
    &self,
    task_id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Record that the subject completed the task at `at`.
  fn mark_satisfied(
    &self,
    task_id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Reset `attempts_today` and `escalated_at` on every task for the
  /// calendar day `day`. Runs at most once per day; later calls for the same
  /// or an earlier day are no-ops. Occurrence claims older than the previous
  /// day are pruned.
  fn reset_day(
    &self,
    day: NaiveDate,
  ) -> impl Future<Output = Result<DayReset, Self::Error>> + Send + '_;

  // ── Delivery log ────────────────────────────────────────────────────────

  /// Append one entry. Entries are never updated or deleted.
  fn append_delivery(
    &self,
    entry: NewDeliveryLogEntry,
  ) -> impl Future<Output = Result<DeliveryLogEntry, Self::Error>> + Send + '_;

  /// Entries for one task, oldest first.
  fn deliveries_for_task(
    &self,
    task_id: Uuid,
  ) -> impl Future<Output = Result<Vec<DeliveryLogEntry>, Self::Error>> + Send + '_;

  /// Entries across all of a subject's tasks, oldest first.
  fn deliveries_for_subject(
    &self,
    subject_id: Uuid,
  ) -> impl Future<Output = Result<Vec<DeliveryLogEntry>, Self::Error>> + Send + '_;
}
