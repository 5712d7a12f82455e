//! Due-schedule resolution: which recurrence rules fire at this minute.

use chrono::NaiveDateTime;
use vigil_core::{
  schedule::{ReminderSchedule, TimeOfDay},
  store::ReminderStore,
};

use crate::{Error, Result};

/// Schedules due at the local minute `now`: the day matches (or is the
/// wildcard) and hour:minute is equal. No catch-up for earlier minutes.
pub async fn due_schedules<S>(store: &S, now: &NaiveDateTime) -> Result<Vec<ReminderSchedule>>
where
  S: ReminderStore,
{
  let candidates = store
    .schedules_at(TimeOfDay::of(now))
    .await
    .map_err(Error::store)?;
  Ok(select_due(candidates, now))
}

/// Pure filter over already-loaded schedules.
pub fn select_due(
  schedules: impl IntoIterator<Item = ReminderSchedule>,
  now: &NaiveDateTime,
) -> Vec<ReminderSchedule> {
  schedules.into_iter().filter(|s| s.is_due(now)).collect()
}
