//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{NaiveDate, TimeZone, Utc, Weekday};
use uuid::Uuid;
use vigil_core::{
  channel::Channel,
  contact::NewContact,
  delivery::{DeliveryKind, DeliveryStatus, FailureReason, NewDeliveryLogEntry},
  greeting::{NewGreetingTemplate, TimeBucket},
  schedule::{OccurrenceKey, ScheduleDay, TimeOfDay},
  store::ReminderStore,
  subject::NewSubject,
  task::{NewTask, ReminderTask},
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn seeded_task(s: &SqliteStore, threshold: u32) -> ReminderTask {
  let subject = s
    .add_subject(NewSubject::new("Margaret", "+447700900001"))
    .await
    .unwrap();
  s.add_task(
    NewTask::new(subject.subject_id, "Take morning tablets")
      .with_channels([Channel::Sms, Channel::VoiceCall])
      .with_threshold(threshold),
  )
  .await
  .unwrap()
}

fn log_entry(task: &ReminderTask, status: DeliveryStatus) -> NewDeliveryLogEntry {
  NewDeliveryLogEntry {
    task_id:      task.task_id,
    subject_id:   task.subject_id,
    kind:         DeliveryKind::Reminder,
    channel:      Some(Channel::Sms),
    recipient:    Some("+447700900001".into()),
    content:      "Hello".into(),
    status,
    provider_ref: None,
    error:        None,
    failure:      None,
    recorded_at:  Utc::now(),
  }
}

// ─── Subjects & tasks ────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_task() {
  let s = store().await;
  let task = seeded_task(&s, 3).await;

  let fetched = s.get_task(task.task_id).await.unwrap().unwrap();
  assert_eq!(fetched.title, "Take morning tablets");
  assert_eq!(fetched.delivery_methods, vec![Channel::Sms, Channel::VoiceCall]);
  assert_eq!(fetched.escalation_threshold, 3);
  assert_eq!(fetched.attempts_today, 0);
  assert!(fetched.escalated_at.is_none());

  let subject = s.get_subject(task.subject_id).await.unwrap().unwrap();
  assert_eq!(subject.display_name, "Margaret");
  assert_eq!(subject.phone_number.as_deref(), Some("+447700900001"));
}

#[tokio::test]
async fn get_task_missing_returns_none() {
  let s = store().await;
  assert!(s.get_task(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn add_task_for_unknown_subject_errors() {
  let s = store().await;
  let err = s
    .add_task(NewTask::new(Uuid::new_v4(), "orphan"))
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::SubjectNotFound(_)));
}

#[tokio::test]
async fn duplicate_channels_are_collapsed() {
  let s = store().await;
  let subject = s.add_subject(NewSubject::new("Ann", "+1")).await.unwrap();
  let task = s
    .add_task(
      NewTask::new(subject.subject_id, "x")
        .with_channels([Channel::Sms, Channel::Sms, Channel::VoiceCall]),
    )
    .await
    .unwrap();

  let fetched = s.get_task(task.task_id).await.unwrap().unwrap();
  assert_eq!(fetched.delivery_methods, vec![Channel::Sms, Channel::VoiceCall]);
}

// ─── Schedules ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn schedules_at_filters_by_minute() {
  let s = store().await;
  let task = seeded_task(&s, 3).await;

  let nine = TimeOfDay::new(9, 0).unwrap();
  s.add_schedule(task.task_id, ScheduleDay::EveryDay, nine).await.unwrap();
  s.add_schedule(task.task_id, ScheduleDay::On(Weekday::Tue), nine)
    .await
    .unwrap();
  s.add_schedule(task.task_id, ScheduleDay::EveryDay, TimeOfDay::new(9, 1).unwrap())
    .await
    .unwrap();

  let at_nine = s.schedules_at(nine).await.unwrap();
  assert_eq!(at_nine.len(), 2);
  assert_eq!(at_nine[0].day, ScheduleDay::EveryDay);
  assert_eq!(at_nine[1].day, ScheduleDay::On(Weekday::Tue));

  let at_ten = s.schedules_at(TimeOfDay::new(10, 0).unwrap()).await.unwrap();
  assert!(at_ten.is_empty());
}

// ─── Counters ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn record_attempt_increments_atomically() {
  let s = store().await;
  let task = seeded_task(&s, 3).await;

  assert_eq!(s.record_attempt(task.task_id).await.unwrap(), 1);
  assert_eq!(s.record_attempt(task.task_id).await.unwrap(), 2);

  let fetched = s.get_task(task.task_id).await.unwrap().unwrap();
  assert_eq!(fetched.attempts_today, 2);
}

#[tokio::test]
async fn record_attempt_unknown_task_errors() {
  let s = store().await;
  let err = s.record_attempt(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, crate::Error::TaskNotFound(_)));
}

#[tokio::test]
async fn open_escalation_requires_threshold() {
  let s = store().await;
  let task = seeded_task(&s, 2).await;
  let now = Utc::now();

  s.record_attempt(task.task_id).await.unwrap();
  assert!(!s.open_escalation(task.task_id, now).await.unwrap());

  s.record_attempt(task.task_id).await.unwrap();
  assert!(s.open_escalation(task.task_id, now).await.unwrap());

  let fetched = s.get_task(task.task_id).await.unwrap().unwrap();
  assert!(fetched.escalated_at.is_some());
}

#[tokio::test]
async fn open_escalation_only_once() {
  let s = store().await;
  let task = seeded_task(&s, 1).await;
  s.record_attempt(task.task_id).await.unwrap();

  assert!(s.open_escalation(task.task_id, Utc::now()).await.unwrap());
  assert!(!s.open_escalation(task.task_id, Utc::now()).await.unwrap());

  s.record_attempt(task.task_id).await.unwrap();
  assert!(!s.open_escalation(task.task_id, Utc::now()).await.unwrap());
}

#[tokio::test]
async fn claim_occurrence_is_deduplicated() {
  let s = store().await;
  let task = seeded_task(&s, 3).await;
  let schedule = s
    .add_schedule(task.task_id, ScheduleDay::EveryDay, TimeOfDay::new(8, 0).unwrap())
    .await
    .unwrap();

  let now = NaiveDate::from_ymd_opt(2024, 3, 4)
    .unwrap()
    .and_hms_opt(8, 0, 12)
    .unwrap();
  let key = OccurrenceKey::new(&schedule, &now);

  assert!(s.claim_occurrence(&key).await.unwrap());
  assert!(!s.claim_occurrence(&key).await.unwrap());

  let tomorrow = OccurrenceKey::new(&schedule, &(now + chrono::Duration::days(1)));
  assert!(s.claim_occurrence(&tomorrow).await.unwrap());
}

#[tokio::test]
async fn mark_satisfied_sets_timestamp() {
  let s = store().await;
  let task = seeded_task(&s, 3).await;
  let at = Utc.with_ymd_and_hms(2024, 3, 4, 9, 5, 0).unwrap();

  s.mark_satisfied(task.task_id, at).await.unwrap();
  let fetched = s.get_task(task.task_id).await.unwrap().unwrap();
  assert_eq!(fetched.last_satisfied_at, Some(at));

  let err = s.mark_satisfied(Uuid::new_v4(), at).await.unwrap_err();
  assert!(matches!(err, crate::Error::TaskNotFound(_)));
}

// ─── Day reset ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn reset_day_clears_counters_and_escalation() {
  let s = store().await;
  let task = seeded_task(&s, 1).await;
  s.record_attempt(task.task_id).await.unwrap();
  assert!(s.open_escalation(task.task_id, Utc::now()).await.unwrap());

  let day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
  let reset = s.reset_day(day).await.unwrap();
  assert!(reset.performed);
  assert_eq!(reset.tasks_reset, 1);

  let fetched = s.get_task(task.task_id).await.unwrap().unwrap();
  assert_eq!(fetched.attempts_today, 0);
  assert!(fetched.escalated_at.is_none());
}

#[tokio::test]
async fn reset_day_is_idempotent() {
  let s = store().await;
  let task = seeded_task(&s, 3).await;
  s.record_attempt(task.task_id).await.unwrap();

  let day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
  let first = s.reset_day(day).await.unwrap();
  let after_first = s.get_task(task.task_id).await.unwrap().unwrap();

  let second = s.reset_day(day).await.unwrap();
  let after_second = s.get_task(task.task_id).await.unwrap().unwrap();

  assert!(first.performed);
  assert!(!second.performed);
  assert_eq!(second.tasks_reset, 0);
  assert_eq!(after_first.attempts_today, after_second.attempts_today);
  assert_eq!(after_first.escalated_at, after_second.escalated_at);

  // Attempts recorded after the reset survive a repeated reset for the
  // same day.
  s.record_attempt(task.task_id).await.unwrap();
  s.reset_day(day).await.unwrap();
  let fetched = s.get_task(task.task_id).await.unwrap().unwrap();
  assert_eq!(fetched.attempts_today, 1);
}

#[tokio::test]
async fn reset_day_keeps_yesterdays_claims_and_prunes_older() {
  let s = store().await;
  let task = seeded_task(&s, 3).await;
  let schedule = s
    .add_schedule(task.task_id, ScheduleDay::EveryDay, TimeOfDay::new(23, 59).unwrap())
    .await
    .unwrap();
  let occurrence = |d| {
    NaiveDate::from_ymd_opt(2024, 3, d)
      .unwrap()
      .and_hms_opt(23, 59, 0)
      .unwrap()
  };
  let two_days_ago = OccurrenceKey::new(&schedule, &occurrence(3));
  let yesterday = OccurrenceKey::new(&schedule, &occurrence(4));
  assert!(s.claim_occurrence(&two_days_ago).await.unwrap());
  assert!(s.claim_occurrence(&yesterday).await.unwrap());

  s.reset_day(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap())
    .await
    .unwrap();

  // A late duplicate of last night's occurrence is still recognised.
  assert!(!s.claim_occurrence(&yesterday).await.unwrap());
  // Anything older is gone and can be claimed again.
  assert!(s.claim_occurrence(&two_days_ago).await.unwrap());
}

#[tokio::test]
async fn reset_day_for_an_earlier_day_reports_the_latest() {
  let s = store().await;
  let task = seeded_task(&s, 3).await;
  let monday = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
  let tuesday = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();

  let first = s.reset_day(tuesday).await.unwrap();
  assert_eq!(first.latest, tuesday);
  assert!(!first.is_stale());

  s.record_attempt(task.task_id).await.unwrap();
  let late = s.reset_day(monday).await.unwrap();
  assert!(!late.performed);
  assert_eq!(late.latest, tuesday);
  assert!(late.is_stale());

  // Nothing was touched by the stale call.
  let fetched = s.get_task(task.task_id).await.unwrap().unwrap();
  assert_eq!(fetched.attempts_today, 1);
}

// ─── Contacts ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn active_contacts_ordered_by_priority_then_insertion() {
  let s = store().await;
  let task = seeded_task(&s, 3).await;
  let sid = task.subject_id;

  s.add_contact(NewContact::new(sid, "Second", "+2", 2)).await.unwrap();
  s.add_contact(NewContact::new(sid, "First", "+1", 1)).await.unwrap();
  s.add_contact(NewContact::new(sid, "Hidden", "+0", 0).inactive())
    .await
    .unwrap();
  s.add_contact(NewContact::new(sid, "Second-b", "+3", 2)).await.unwrap();

  let names: Vec<String> = s
    .active_contacts(sid)
    .await
    .unwrap()
    .into_iter()
    .map(|c| c.display_name)
    .collect();
  assert_eq!(names, ["First", "Second", "Second-b"]);
}

#[tokio::test]
async fn deactivated_contact_is_excluded() {
  let s = store().await;
  let task = seeded_task(&s, 3).await;
  let c = s
    .add_contact(
      NewContact::new(task.subject_id, "Son", "+44", 1)
        .with_methods([Channel::VoiceCall, Channel::Sms]),
    )
    .await
    .unwrap();

  let active = s.active_contacts(task.subject_id).await.unwrap();
  assert_eq!(active.len(), 1);
  assert_eq!(active[0].methods, vec![Channel::VoiceCall, Channel::Sms]);

  s.set_contact_active(c.contact_id, false).await.unwrap();
  assert!(s.active_contacts(task.subject_id).await.unwrap().is_empty());
}

// ─── Templates ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn greeting_template_exact_and_any_time() {
  let s = store().await;
  s.add_greeting_template(NewGreetingTemplate {
    style:           "warm".into(),
    bucket:          Some(TimeBucket::Morning),
    greeting:        "Good morning {name}!".into(),
    wellbeing_check: Some("I hope you slept well.".into()),
    closing:         None,
  })
  .await
  .unwrap();
  s.add_greeting_template(NewGreetingTemplate {
    style:           "warm".into(),
    bucket:          None,
    greeting:        "Hello {name}.".into(),
    wellbeing_check: None,
    closing:         Some("Take care.".into()),
  })
  .await
  .unwrap();

  let morning = s
    .greeting_template("warm", Some(TimeBucket::Morning))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(morning.greeting, "Good morning {name}!");
  assert_eq!(morning.bucket, Some(TimeBucket::Morning));

  assert!(s
    .greeting_template("warm", Some(TimeBucket::Evening))
    .await
    .unwrap()
    .is_none());

  let any = s.greeting_template("warm", None).await.unwrap().unwrap();
  assert_eq!(any.closing.as_deref(), Some("Take care."));

  assert!(s.greeting_template("brisk", None).await.unwrap().is_none());
}

// ─── Delivery log ────────────────────────────────────────────────────────────

#[tokio::test]
async fn delivery_log_append_and_query() {
  let s = store().await;
  let task = seeded_task(&s, 3).await;

  s.append_delivery(log_entry(&task, DeliveryStatus::Sent)).await.unwrap();
  let mut failed = log_entry(&task, DeliveryStatus::Failed);
  failed.kind = DeliveryKind::Escalation;
  failed.channel = None;
  failed.recipient = None;
  failed.failure = Some(FailureReason::NoContacts);
  failed.error = Some("no active escalation contacts".into());
  s.append_delivery(failed).await.unwrap();

  let by_task = s.deliveries_for_task(task.task_id).await.unwrap();
  assert_eq!(by_task.len(), 2);
  assert!(by_task[0].is_sent());
  assert_eq!(by_task[1].kind, DeliveryKind::Escalation);
  assert_eq!(by_task[1].channel, None);
  assert_eq!(by_task[1].failure, Some(FailureReason::NoContacts));

  let by_subject = s.deliveries_for_subject(task.subject_id).await.unwrap();
  assert_eq!(by_subject.len(), 2);
  assert!(s
    .deliveries_for_subject(Uuid::new_v4())
    .await
    .unwrap()
    .is_empty());
}
