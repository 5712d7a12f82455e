//! Escalation fan-out to a subject's emergency contacts.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use vigil_core::{
  channel::Channel,
  delivery::{DeliveryKind, FailureReason, NewDeliveryLogEntry},
  gateway::{DeliveryGateway, Payload},
  speech::SpeechComposer,
  store::ReminderStore,
  subject::Subject,
  task::ReminderTask,
};

use crate::{Engine, Error, Result, TickSummary, engine::Dispatch, orchestrator::usable_phone};

impl<S, G, V> Engine<S, G, V>
where
  S: ReminderStore,
  G: DeliveryGateway,
  V: SpeechComposer,
{
  /// Open today's escalation for `task` and alert every active contact.
  ///
  /// Contacts are loaded before the escalation is claimed, so a failed read
  /// leaves the escalation unopened and the next occurrence tries again.
  /// Once claimed, a concurrent or repeated tick can never alert the
  /// contacts twice on the same day, and a failure to log one alert does
  /// not stop the others from going out.
  pub(crate) async fn escalate(
    &self,
    schedule_id: Uuid,
    task: &ReminderTask,
    subject: &Subject,
    attempts: u32,
    now: DateTime<Utc>,
    summary: &mut TickSummary,
  ) -> Result<()> {
    let contacts = self
      .store
      .active_contacts(subject.subject_id)
      .await
      .map_err(Error::store)?;
    let alert = alert_message(subject, task, attempts);

    if !self.store.open_escalation(task.task_id, now).await.map_err(Error::store)? {
      debug!(task_id = %task.task_id, "escalation already open today");
      return Ok(());
    }
    summary.escalations_fired += 1;

    let entry = |channel: Option<Channel>, recipient: Option<String>, content: String, outcome: Dispatch| {
      NewDeliveryLogEntry {
        task_id: task.task_id,
        subject_id: subject.subject_id,
        kind: DeliveryKind::Escalation,
        channel,
        recipient,
        content,
        status: outcome.status,
        provider_ref: outcome.provider_ref,
        error: outcome.error,
        failure: outcome.failure,
        recorded_at: now,
      }
    };

    if contacts.is_empty() {
      warn!(task_id = %task.task_id, subject_id = %subject.subject_id, "escalation fired but subject has no active contacts");
      let outcome = Dispatch::not_sent(FailureReason::NoContacts, "no active emergency contacts");
      self.log_alert(schedule_id, entry(None, None, alert, outcome), summary).await;
      return Ok(());
    }

    let delay = self.config.escalation_send_delay();
    let mut sends = 0usize;
    for contact in &contacts {
      for &channel in &contact.methods {
        let Some(phone) = usable_phone(contact.phone_number.as_deref()) else {
          warn!(contact_id = %contact.contact_id, %channel, "contact has no phone number");
          let outcome = Dispatch::not_sent(FailureReason::MissingPhone, "contact has no phone number");
          self.log_alert(schedule_id, entry(Some(channel), None, alert.clone(), outcome), summary).await;
          continue;
        };

        if sends > 0 && !delay.is_zero() {
          tokio::time::sleep(delay).await;
        }
        sends += 1;

        let payload = match channel {
          Channel::Sms => Payload::Text { text: alert.clone() },
          Channel::VoiceCall => Payload::Speech {
            text:  alert.clone(),
            voice: self.config.default_voice.clone(),
          },
        };
        let outcome = self.dispatch(phone, channel, &payload).await;
        if let Some(err) = &outcome.error {
          warn!(contact_id = %contact.contact_id, %channel, error = %err, "escalation delivery failed");
        }
        let logged = entry(Some(channel), Some(phone.to_owned()), alert.clone(), outcome);
        self.log_alert(schedule_id, logged, summary).await;
      }
    }

    info!(
      task_id = %task.task_id,
      subject_id = %subject.subject_id,
      attempts,
      contacts = contacts.len(),
      "escalation fired"
    );
    Ok(())
  }

  /// Record one alert. The escalation is already open, so a failed append
  /// is reported in the summary and the fan-out carries on.
  async fn log_alert(&self, schedule_id: Uuid, entry: NewDeliveryLogEntry, summary: &mut TickSummary) {
    if let Err(e) = self.log(entry, summary).await {
      error!(%schedule_id, error = %e, "failed to record escalation alert");
      summary.note_error(Some(schedule_id), &e);
    }
  }
}

/// The alert read or sent to each emergency contact.
pub(crate) fn alert_message(subject: &Subject, task: &ReminderTask, attempts: u32) -> String {
  let plural = if attempts == 1 { "" } else { "s" };
  format!(
    "Alert from Vigil: {} has not completed \"{}\" today after {attempts} reminder{plural}. \
     Please check on them.",
    subject.display_name, task.title
  )
}
