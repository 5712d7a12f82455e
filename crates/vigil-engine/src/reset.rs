use chrono::NaiveDate;
use tracing::{error, info, warn};
use vigil_core::{gateway::DeliveryGateway, speech::SpeechComposer, store::ReminderStore};

use crate::{Engine, Error, TickSummary};

impl<S, G, V> Engine<S, G, V>
where
  S: ReminderStore,
  G: DeliveryGateway,
  V: SpeechComposer,
{
  /// Clear per-day counters if `today` has not been reset yet.
  ///
  /// Called at the start of every tick rather than only at 00:00, so a
  /// midnight tick that never ran is made up by the first tick of the day.
  ///
  /// Returns `false` when `today` is earlier than a day that has already
  /// been reset. Such a tick is a late duplicate and must not deliver.
  pub(crate) async fn reset_if_new_day(&self, today: NaiveDate, summary: &mut TickSummary) -> bool {
    match self.store.reset_day(today).await {
      Ok(reset) if reset.is_stale() => {
        warn!(day = %today, latest = %reset.latest, "stale tick; a later day has already begun");
        summary.stale = true;
        false
      }
      Ok(reset) if reset.performed => {
        info!(day = %today, tasks_reset = reset.tasks_reset, "day boundary reset");
        summary.day_reset = Some(reset);
        true
      }
      Ok(_) => true,
      Err(e) => {
        let e = Error::store(e);
        error!(day = %today, error = %e, "day boundary reset failed");
        summary.note_error(None, &e);
        true
      }
    }
  }
}
