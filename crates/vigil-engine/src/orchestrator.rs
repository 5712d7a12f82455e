//! Per-schedule delivery: satisfaction check, occurrence claim, fan-out over
//! the task's channels and attempt counting.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, warn};
use vigil_core::{
  channel::Channel,
  delivery::{DeliveryKind, DeliveryLogEntry, FailureReason, NewDeliveryLogEntry},
  gateway::{DeliveryGateway, Payload},
  schedule::{OccurrenceKey, ReminderSchedule},
  speech::SpeechComposer,
  store::ReminderStore,
  subject::Subject,
  task::ReminderTask,
};

use crate::{
  AttemptCounting, Engine, Error, Result, TickSummary,
  compose::{self, ComposedMessage},
  engine::Dispatch,
  speech,
};

impl<S, G, V> Engine<S, G, V>
where
  S: ReminderStore,
  G: DeliveryGateway,
  V: SpeechComposer,
{
  pub(crate) async fn process_schedule(
    &self,
    schedule: &ReminderSchedule,
    now: DateTime<Utc>,
    local: &NaiveDateTime,
    summary: &mut TickSummary,
  ) -> Result<()> {
    let task = self
      .store
      .get_task(schedule.task_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::TaskNotFound(schedule.task_id))?;

    let zone = self.config.zone;
    if task.satisfied_on(local.date(), |at| zone.local_date(at)) {
      debug!(task_id = %task.task_id, "already satisfied today");
      summary.skipped_satisfied += 1;
      return Ok(());
    }

    let key = OccurrenceKey::new(schedule, local);
    if !self.store.claim_occurrence(&key).await.map_err(Error::store)? {
      warn!(
        task_id = %task.task_id,
        occurrence = %key.minute_key(),
        "occurrence already handled; skipping duplicate tick"
      );
      summary.duplicate_occurrences += 1;
      return Ok(());
    }

    let subject = self
      .store
      .get_subject(task.subject_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::SubjectNotFound(task.subject_id))?;

    let message = compose::compose(&*self.store, &self.config, &subject, &task, local).await;
    debug!(
      task_id = %task.task_id,
      template = ?message.template_id,
      spoken_secs = message.estimated_spoken_secs,
      "reminder composed"
    );

    let mut delivered = false;
    for &channel in &task.delivery_methods {
      let entry = self.deliver(&task, &subject, channel, &message, now, summary).await?;
      delivered |= entry.is_sent();
    }

    let counts = match self.config.attempt_counting {
      AttemptCounting::Occurrence => true,
      AttemptCounting::FailedDelivery => !delivered,
    };
    if !counts {
      return Ok(());
    }

    let attempts = self.store.record_attempt(task.task_id).await.map_err(Error::store)?;
    debug!(task_id = %task.task_id, attempts, threshold = task.escalation_threshold, "attempt recorded");

    if task.should_escalate(attempts) {
      self.escalate(schedule.schedule_id, &task, &subject, attempts, now, summary).await?;
    }
    Ok(())
  }

  /// Deliver the reminder over one channel and log the outcome.
  async fn deliver(
    &self,
    task: &ReminderTask,
    subject: &Subject,
    channel: Channel,
    message: &ComposedMessage,
    now: DateTime<Utc>,
    summary: &mut TickSummary,
  ) -> Result<DeliveryLogEntry> {
    let entry = |content: String, recipient: Option<String>, outcome: Dispatch| NewDeliveryLogEntry {
      task_id: task.task_id,
      subject_id: subject.subject_id,
      kind: DeliveryKind::Reminder,
      channel: Some(channel),
      recipient,
      content,
      status: outcome.status,
      provider_ref: outcome.provider_ref,
      error: outcome.error,
      failure: outcome.failure,
      recorded_at: now,
    };

    let Some(phone) = usable_phone(subject.phone_number.as_deref()) else {
      warn!(subject_id = %subject.subject_id, %channel, "subject has no phone number");
      let outcome = Dispatch::not_sent(FailureReason::MissingPhone, "subject has no phone number");
      return self.log(entry(message.text.clone(), None, outcome), summary).await;
    };

    let payload = match channel {
      Channel::Sms => Payload::Text { text: message.text.clone() },
      Channel::VoiceCall => speech::voice_payload(&*self.speech, &self.config, task, &message.text).await,
    };

    let outcome = self.dispatch(phone, channel, &payload).await;
    if let Some(err) = &outcome.error {
      warn!(task_id = %task.task_id, %channel, error = %err, "reminder delivery failed");
    }
    let content = payload.content().to_owned();
    self.log(entry(content, Some(phone.to_owned()), outcome), summary).await
  }
}

/// A phone number worth dialling: present and not blank.
pub(crate) fn usable_phone(phone: Option<&str>) -> Option<&str> {
  phone.map(str::trim).filter(|p| !p.is_empty())
}
