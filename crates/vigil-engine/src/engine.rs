//! The [`Engine`] and its tick loop.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info};
use vigil_core::{
  channel::Channel,
  delivery::{DeliveryLogEntry, DeliveryStatus, FailureReason, NewDeliveryLogEntry},
  gateway::{DeliveryGateway, Payload},
  speech::SpeechComposer,
  store::ReminderStore,
};

use crate::{EngineConfig, Error, Result, TickSummary, resolver};

/// Reminder scheduling and escalation over a store, a telephony gateway and a
/// voice-clone composer.
///
/// Cheap to clone: every collaborator is behind an `Arc`.
pub struct Engine<S, G, V> {
  pub(crate) store:   Arc<S>,
  pub(crate) gateway: Arc<G>,
  pub(crate) speech:  Arc<V>,
  pub(crate) config:  Arc<EngineConfig>,
}

impl<S, G, V> Clone for Engine<S, G, V> {
  fn clone(&self) -> Self {
    Self {
      store:   Arc::clone(&self.store),
      gateway: Arc::clone(&self.gateway),
      speech:  Arc::clone(&self.speech),
      config:  Arc::clone(&self.config),
    }
  }
}

/// Outcome of one gateway send, ready to be written to the delivery log.
#[derive(Debug, Clone)]
pub(crate) struct Dispatch {
  pub status:       DeliveryStatus,
  pub provider_ref: Option<String>,
  pub error:        Option<String>,
  pub failure:      Option<FailureReason>,
}

impl Dispatch {
  pub fn not_sent(failure: FailureReason, error: impl Into<String>) -> Self {
    Self {
      status:       DeliveryStatus::Failed,
      provider_ref: None,
      error:        Some(error.into()),
      failure:      Some(failure),
    }
  }
}

impl<S, G, V> Engine<S, G, V>
where
  S: ReminderStore,
  G: DeliveryGateway,
  V: SpeechComposer,
{
  pub fn new(store: Arc<S>, gateway: Arc<G>, speech: Arc<V>, config: EngineConfig) -> Self {
    Self { store, gateway, speech, config: Arc::new(config) }
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn config(&self) -> &EngineConfig { &self.config }

  /// Run one scheduling tick for the instant `now`.
  ///
  /// Never fails as a whole: an error while processing one schedule is
  /// logged, recorded in the summary, and the remaining schedules are still
  /// processed.
  #[tracing::instrument(skip(self), fields(local_time = tracing::field::Empty))]
  pub async fn tick(&self, now: DateTime<Utc>) -> TickSummary {
    let local = self.config.zone.local_time(now);
    tracing::Span::current().record("local_time", tracing::field::display(&local));

    let mut summary = TickSummary::new(now, local);
    if !self.reset_if_new_day(local.date(), &mut summary).await {
      return summary;
    }

    let due = match resolver::due_schedules(&*self.store, &local).await {
      Ok(due) => due,
      Err(e) => {
        error!(error = %e, "failed to resolve due schedules");
        summary.note_error(None, &e);
        return summary;
      }
    };
    summary.schedules_due = due.len();

    for schedule in &due {
      if let Err(e) = self.process_schedule(schedule, now, &local, &mut summary).await {
        error!(
          schedule_id = %schedule.schedule_id,
          task_id = %schedule.task_id,
          error = %e,
          "schedule processing failed"
        );
        summary.note_error(Some(schedule.schedule_id), &e);
      }
    }

    info!(
      due = summary.schedules_due,
      satisfied = summary.skipped_satisfied,
      duplicates = summary.duplicate_occurrences,
      sent = summary.deliveries_succeeded,
      failed = summary.deliveries_failed,
      escalations = summary.escalations_fired,
      errors = summary.errors.len(),
      "tick complete"
    );
    summary
  }

  /// Send one payload under the gateway timeout.
  pub(crate) async fn dispatch(&self, recipient: &str, channel: Channel, payload: &Payload) -> Dispatch {
    let timeout = self.config.gateway_timeout();
    match tokio::time::timeout(timeout, self.gateway.send(recipient, channel, payload)).await {
      Ok(Ok(receipt)) => Dispatch {
        failure: (receipt.status == DeliveryStatus::Failed).then_some(FailureReason::Provider),
        status: receipt.status,
        provider_ref: receipt.provider_ref,
        error: receipt.detail,
      },
      Ok(Err(e)) => Dispatch::not_sent(FailureReason::Provider, e.to_string()),
      Err(_) => Dispatch::not_sent(
        FailureReason::Timeout,
        format!("gateway did not answer within {}s", timeout.as_secs()),
      ),
    }
  }

  /// Append `entry` to the delivery log and count it in `summary`.
  pub(crate) async fn log(
    &self,
    entry: NewDeliveryLogEntry,
    summary: &mut TickSummary,
  ) -> Result<DeliveryLogEntry> {
    let entry = self.store.append_delivery(entry).await.map_err(Error::store)?;
    summary.note_delivery(&entry);
    Ok(entry)
  }
}
