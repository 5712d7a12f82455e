//! In-process minute ticker.
//!
//! Sleeps to the next wall-clock minute boundary and runs one tick, forever.
//! A tick that overruns into the next minute makes the loop skip that minute;
//! skipped minutes are lost reminders, exactly as with an external scheduler.

use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};
use tracing::{info, warn};
use vigil_core::{gateway::DeliveryGateway, speech::SpeechComposer, store::ReminderStore};
use vigil_engine::Engine;

/// Drive `engine` once per minute until the task is dropped.
pub async fn run<S, G, V>(engine: Engine<S, G, V>)
where
  S: ReminderStore + 'static,
  G: DeliveryGateway + 'static,
  V: SpeechComposer + 'static,
{
  info!("internal ticker started");
  let mut last_minute: Option<DateTime<Utc>> = None;
  loop {
    tokio::time::sleep(until_next_minute(Utc::now())).await;

    let now = Utc::now();
    let minute = truncate_to_minute(now);
    if last_minute == Some(minute) {
      continue;
    }
    if let Some(prev) = last_minute
      && (minute - prev).num_minutes() > 1
    {
      warn!(missed = (minute - prev).num_minutes() - 1, "ticker fell behind; minutes skipped");
    }
    last_minute = Some(minute);

    engine.tick(now).await;
  }
}

/// Time left until the next `hh:mm:00`.
pub fn until_next_minute(now: DateTime<Utc>) -> Duration {
  let into_minute = Duration::new(u64::from(now.second()), now.nanosecond().min(999_999_999));
  Duration::from_secs(60).saturating_sub(into_minute)
}

fn truncate_to_minute(at: DateTime<Utc>) -> DateTime<Utc> {
  at.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(at)
}
