//! The outcome of one scheduling tick.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use vigil_core::{delivery::DeliveryLogEntry, store::DayReset};

/// Counters for one tick, returned to the caller and logged at the end of
/// the tick.
#[derive(Debug, Clone, Serialize)]
pub struct TickSummary {
  pub tick_at:               DateTime<Utc>,
  /// Wall-clock minute in the reference zone.
  pub local_time:            NaiveDateTime,
  /// Set when this tick performed the day-boundary reset.
  pub day_reset:             Option<DayReset>,
  /// The local date was earlier than the last reset day; nothing was
  /// processed.
  pub stale:                 bool,
  pub schedules_due:         usize,
  pub skipped_satisfied:     usize,
  pub duplicate_occurrences: usize,
  pub deliveries_attempted:  usize,
  pub deliveries_succeeded:  usize,
  pub deliveries_failed:     usize,
  pub escalations_fired:     usize,
  pub errors:                Vec<TickError>,
}

/// A failure that aborted one schedule (or the reset step) without aborting
/// the tick.
#[derive(Debug, Clone, Serialize)]
pub struct TickError {
  /// `None` for errors outside schedule processing.
  pub schedule_id: Option<Uuid>,
  pub message:     String,
}

impl TickSummary {
  pub(crate) fn new(tick_at: DateTime<Utc>, local_time: NaiveDateTime) -> Self {
    Self {
      tick_at,
      local_time,
      day_reset: None,
      stale: false,
      schedules_due: 0,
      skipped_satisfied: 0,
      duplicate_occurrences: 0,
      deliveries_attempted: 0,
      deliveries_succeeded: 0,
      deliveries_failed: 0,
      escalations_fired: 0,
      errors: Vec::new(),
    }
  }

  pub(crate) fn note_delivery(&mut self, entry: &DeliveryLogEntry) {
    self.deliveries_attempted += 1;
    if entry.is_sent() {
      self.deliveries_succeeded += 1;
    } else {
      self.deliveries_failed += 1;
    }
  }

  pub(crate) fn note_error(&mut self, schedule_id: Option<Uuid>, error: &crate::Error) {
    self.errors.push(TickError { schedule_id, message: error.to_string() });
  }

  pub fn is_clean(&self) -> bool { self.errors.is_empty() }
}
