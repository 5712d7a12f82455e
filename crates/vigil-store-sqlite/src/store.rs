//! [`SqliteStore`]: the SQLite implementation of [`ReminderStore`].

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use vigil_core::{
  channel::dedup_channels,
  contact::{EscalationContact, NewContact},
  delivery::{DeliveryLogEntry, NewDeliveryLogEntry},
  greeting::{GreetingTemplate, NewGreetingTemplate, TimeBucket},
  schedule::{OccurrenceKey, ReminderSchedule, ScheduleDay, TimeOfDay},
  store::{DayReset, ReminderStore},
  subject::{NewSubject, Subject},
  task::{NewTask, ReminderTask},
};

use crate::{
  encode::{
    decode_date, encode_bucket, encode_channels, encode_date, encode_dt, encode_failure, encode_kind, encode_status,
    encode_uuid, RawContact, RawDelivery, RawSchedule, RawSubject, RawTask, RawTemplate,
  },
  schema::{LAST_RESET_DAY, SCHEMA},
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Vigil store backed by a single SQLite file.
///
/// Cheap to clone; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Provisioning ──────────────────────────────────────────────────────────
  //
  // Subjects, tasks, schedules, contacts and templates are owned by the
  // surrounding product. These writes exist for seeding and tests.

  pub async fn add_subject(&self, input: NewSubject) -> Result<Subject> {
    let subject = Subject {
      subject_id:   Uuid::new_v4(),
      display_name: input.display_name,
      phone_number: input.phone_number,
      conversation: input.conversation,
      created_at:   Utc::now(),
    };

    let id_str   = encode_uuid(subject.subject_id);
    let name     = subject.display_name.clone();
    let phone    = subject.phone_number.clone();
    let enabled  = subject.conversation.enabled;
    let style    = subject.conversation.style.clone();
    let wellbeing = subject.conversation.wellbeing_check;
    let at_str   = encode_dt(subject.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subjects (
             subject_id, display_name, phone_number, conversational,
             conversation_style, wellbeing_check, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![id_str, name, phone, enabled, style, wellbeing, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(subject)
  }

  pub async fn add_task(&self, input: NewTask) -> Result<ReminderTask> {
    input.validate()?;
    if self.get_subject(input.subject_id).await?.is_none() {
      return Err(Error::SubjectNotFound(input.subject_id));
    }

    let task = ReminderTask {
      task_id:              Uuid::new_v4(),
      subject_id:           input.subject_id,
      title:                input.title,
      message:              input.message,
      delivery_methods:     dedup_channels(input.delivery_methods),
      use_voice_clone:      input.use_voice_clone,
      voice_profile:        input.voice_profile,
      escalation_threshold: input.escalation_threshold,
      attempts_today:       0,
      last_satisfied_at:    None,
      escalated_at:         None,
      created_at:           Utc::now(),
    };

    let task_id_str    = encode_uuid(task.task_id);
    let subject_id_str = encode_uuid(task.subject_id);
    let title          = task.title.clone();
    let message        = task.message.clone();
    let methods_str    = encode_channels(&task.delivery_methods)?;
    let use_clone      = task.use_voice_clone;
    let profile        = task.voice_profile.clone();
    let threshold      = task.escalation_threshold;
    let at_str         = encode_dt(task.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO tasks (
             task_id, subject_id, title, message, delivery_methods,
             use_voice_clone, voice_profile, escalation_threshold, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            task_id_str,
            subject_id_str,
            title,
            message,
            methods_str,
            use_clone,
            profile,
            threshold,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(task)
  }

  pub async fn add_schedule(
    &self,
    task_id: Uuid,
    day:     ScheduleDay,
    time:    TimeOfDay,
  ) -> Result<ReminderSchedule> {
    if self.get_task(task_id).await?.is_none() {
      return Err(Error::TaskNotFound(task_id));
    }

    let schedule = ReminderSchedule { schedule_id: Uuid::new_v4(), task_id, day, time };

    let id_str   = encode_uuid(schedule.schedule_id);
    let task_str = encode_uuid(task_id);
    let dow      = day.index();
    let (hour, minute) = (time.hour(), time.minute());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO schedules (schedule_id, task_id, day_of_week, hour, minute)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, task_str, dow, hour, minute],
        )?;
        Ok(())
      })
      .await?;

    Ok(schedule)
  }

  pub async fn add_contact(&self, input: NewContact) -> Result<EscalationContact> {
    if self.get_subject(input.subject_id).await?.is_none() {
      return Err(Error::SubjectNotFound(input.subject_id));
    }

    let contact = EscalationContact {
      contact_id:   Uuid::new_v4(),
      subject_id:   input.subject_id,
      display_name: input.display_name,
      phone_number: input.phone_number,
      methods:      dedup_channels(input.methods),
      priority:     input.priority,
      active:       input.active,
      created_at:   Utc::now(),
    };

    let id_str      = encode_uuid(contact.contact_id);
    let subject_str = encode_uuid(contact.subject_id);
    let name        = contact.display_name.clone();
    let phone       = contact.phone_number.clone();
    let methods_str = encode_channels(&contact.methods)?;
    let priority    = contact.priority;
    let active      = contact.active;
    let at_str      = encode_dt(contact.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO escalation_contacts (
             contact_id, subject_id, display_name, phone_number,
             methods, priority, active, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str,
            subject_str,
            name,
            phone,
            methods_str,
            priority,
            active,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(contact)
  }

  pub async fn set_contact_active(&self, contact_id: Uuid, active: bool) -> Result<()> {
    let id_str = encode_uuid(contact_id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE escalation_contacts SET active = ?2 WHERE contact_id = ?1",
          rusqlite::params![id_str, active],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::ContactNotFound(contact_id));
    }
    Ok(())
  }

  pub async fn add_greeting_template(
    &self,
    input: NewGreetingTemplate,
  ) -> Result<GreetingTemplate> {
    let template = GreetingTemplate {
      template_id:     Uuid::new_v4(),
      style:           input.style,
      bucket:          input.bucket,
      greeting:        input.greeting,
      wellbeing_check: input.wellbeing_check,
      closing:         input.closing,
    };

    let id_str    = encode_uuid(template.template_id);
    let style     = template.style.clone();
    let bucket    = encode_bucket(template.bucket);
    let greeting  = template.greeting.clone();
    let wellbeing = template.wellbeing_check.clone();
    let closing   = template.closing.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO greeting_templates (
             template_id, style, time_bucket, greeting, wellbeing_check, closing
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, style, bucket, greeting, wellbeing, closing],
        )?;
        Ok(())
      })
      .await?;

    Ok(template)
  }
}

// ─── ReminderStore impl ──────────────────────────────────────────────────────

impl ReminderStore for SqliteStore {
  type Error = Error;

  // ── Tick reads ────────────────────────────────────────────────────────────

  async fn schedules_at(&self, time: TimeOfDay) -> Result<Vec<ReminderSchedule>> {
    let (hour, minute) = (time.hour(), time.minute());

    let raws: Vec<RawSchedule> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT schedule_id, task_id, day_of_week, hour, minute
           FROM schedules
           WHERE hour = ?1 AND minute = ?2
           ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![hour, minute], |row| {
            Ok(RawSchedule {
              schedule_id: row.get(0)?,
              task_id:     row.get(1)?,
              day_of_week: row.get(2)?,
              hour:        row.get(3)?,
              minute:      row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSchedule::into_schedule).collect()
  }

  async fn get_task(&self, task_id: Uuid) -> Result<Option<ReminderTask>> {
    let id_str = encode_uuid(task_id);

    let raw: Option<RawTask> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {} FROM tasks WHERE task_id = ?1", RawTask::COLUMNS),
            rusqlite::params![id_str],
            RawTask::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawTask::into_task).transpose()
  }

  async fn get_subject(&self, subject_id: Uuid) -> Result<Option<Subject>> {
    let id_str = encode_uuid(subject_id);

    let raw: Option<RawSubject> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {} FROM subjects WHERE subject_id = ?1", RawSubject::COLUMNS),
            rusqlite::params![id_str],
            RawSubject::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSubject::into_subject).transpose()
  }

  async fn active_contacts(&self, subject_id: Uuid) -> Result<Vec<EscalationContact>> {
    let id_str = encode_uuid(subject_id);

    let raws: Vec<RawContact> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM escalation_contacts
           WHERE subject_id = ?1 AND active = 1
           ORDER BY priority ASC, seq ASC",
          RawContact::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawContact::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawContact::into_contact).collect()
  }

  async fn greeting_template(
    &self,
    style:  &str,
    bucket: Option<TimeBucket>,
  ) -> Result<Option<GreetingTemplate>> {
    let style      = style.to_owned();
    let bucket_str = encode_bucket(bucket);

    let raw: Option<RawTemplate> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT template_id, style, time_bucket, greeting, wellbeing_check, closing
             FROM greeting_templates
             WHERE style = ?1 AND time_bucket IS ?2
             ORDER BY seq
             LIMIT 1",
            rusqlite::params![style, bucket_str],
            |row| {
              Ok(RawTemplate {
                template_id:     row.get(0)?,
                style:           row.get(1)?,
                time_bucket:     row.get(2)?,
                greeting:        row.get(3)?,
                wellbeing_check: row.get(4)?,
                closing:         row.get(5)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawTemplate::into_template).transpose()
  }

  // ── Counter updates ───────────────────────────────────────────────────────

  async fn claim_occurrence(&self, key: &OccurrenceKey) -> Result<bool> {
    let task_str     = encode_uuid(key.task_id);
    let schedule_str = encode_uuid(key.schedule_id);
    let minute       = key.minute_key();

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT OR IGNORE INTO occurrence_claims (task_id, schedule_id, occurrence)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![task_str, schedule_str, minute],
        )?)
      })
      .await?;

    Ok(inserted == 1)
  }

  async fn record_attempt(&self, task_id: Uuid) -> Result<u32> {
    let id_str = encode_uuid(task_id);

    let attempts: Option<u32> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "UPDATE tasks SET attempts_today = attempts_today + 1
             WHERE task_id = ?1
             RETURNING attempts_today",
            rusqlite::params![id_str],
            |row| row.get(0),
          )
          .optional()?)
      })
      .await?;

    attempts.ok_or(Error::TaskNotFound(task_id))
  }

  async fn open_escalation(&self, task_id: Uuid, at: DateTime<Utc>) -> Result<bool> {
    let id_str = encode_uuid(task_id);
    let at_str = encode_dt(at);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE tasks SET escalated_at = ?2
           WHERE task_id = ?1
             AND escalated_at IS NULL
             AND attempts_today >= escalation_threshold",
          rusqlite::params![id_str, at_str],
        )?)
      })
      .await?;

    Ok(changed == 1)
  }

  async fn mark_satisfied(&self, task_id: Uuid, at: DateTime<Utc>) -> Result<()> {
    let id_str = encode_uuid(task_id);
    let at_str = encode_dt(at);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE tasks SET last_satisfied_at = ?2 WHERE task_id = ?1",
          rusqlite::params![id_str, at_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::TaskNotFound(task_id));
    }
    Ok(())
  }

  async fn reset_day(&self, day: NaiveDate) -> Result<DayReset> {
    let day_str = encode_date(day);
    // Yesterday's claims survive so a late duplicate from just before
    // midnight is still recognised.
    let prune_before = encode_date(day.pred_opt().unwrap_or(day));

    let (performed, tasks_reset, last) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let last: Option<String> = tx
          .query_row(
            "SELECT value FROM engine_state WHERE key = ?1",
            rusqlite::params![LAST_RESET_DAY],
            |r| r.get(0),
          )
          .optional()?;

        // ISO dates order lexicographically.
        if last.as_deref().is_some_and(|l| l >= day_str.as_str()) {
          return Ok((false, 0, last));
        }

        let reset = tx.execute(
          "UPDATE tasks SET attempts_today = 0, escalated_at = NULL
           WHERE attempts_today != 0 OR escalated_at IS NOT NULL",
          [],
        )?;
        tx.execute(
          "DELETE FROM occurrence_claims WHERE occurrence < ?1",
          rusqlite::params![prune_before],
        )?;
        tx.execute(
          "INSERT INTO engine_state (key, value) VALUES (?1, ?2)
           ON CONFLICT (key) DO UPDATE SET value = excluded.value",
          rusqlite::params![LAST_RESET_DAY, day_str],
        )?;
        tx.commit()?;

        Ok((true, reset, None))
      })
      .await?;

    let latest = match last {
      Some(l) => decode_date(&l)?,
      None => day,
    };

    Ok(DayReset { day, performed, tasks_reset, latest })
  }

  // ── Delivery log ──────────────────────────────────────────────────────────

  async fn append_delivery(&self, input: NewDeliveryLogEntry) -> Result<DeliveryLogEntry> {
    let entry = DeliveryLogEntry {
      entry_id:     Uuid::new_v4(),
      task_id:      input.task_id,
      subject_id:   input.subject_id,
      kind:         input.kind,
      channel:      input.channel,
      recipient:    input.recipient,
      content:      input.content,
      status:       input.status,
      provider_ref: input.provider_ref,
      error:        input.error,
      failure:      input.failure,
      recorded_at:  input.recorded_at,
    };

    let entry_str   = encode_uuid(entry.entry_id);
    let task_str    = encode_uuid(entry.task_id);
    let subject_str = encode_uuid(entry.subject_id);
    let kind_str    = encode_kind(entry.kind);
    let channel_str = entry.channel.map(|c| c.as_str());
    let recipient   = entry.recipient.clone();
    let content     = entry.content.clone();
    let status_str  = encode_status(entry.status);
    let provider    = entry.provider_ref.clone();
    let error       = entry.error.clone();
    let failure_str = entry.failure.map(encode_failure);
    let at_str      = encode_dt(entry.recorded_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO delivery_log (
             entry_id, task_id, subject_id, kind, channel, recipient, content,
             status, provider_ref, error_detail, failure_reason, recorded_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
          rusqlite::params![
            entry_str,
            task_str,
            subject_str,
            kind_str,
            channel_str,
            recipient,
            content,
            status_str,
            provider,
            error,
            failure_str,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(entry)
  }

  async fn deliveries_for_task(&self, task_id: Uuid) -> Result<Vec<DeliveryLogEntry>> {
    self.deliveries_where("task_id", task_id).await
  }

  async fn deliveries_for_subject(&self, subject_id: Uuid) -> Result<Vec<DeliveryLogEntry>> {
    self.deliveries_where("subject_id", subject_id).await
  }
}

impl SqliteStore {
  /// Delivery log rows whose `column` equals `id`, oldest first.
  async fn deliveries_where(
    &self,
    column: &'static str,
    id:     Uuid,
  ) -> Result<Vec<DeliveryLogEntry>> {
    let id_str = encode_uuid(id);

    let raws: Vec<RawDelivery> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM delivery_log WHERE {column} = ?1 ORDER BY seq",
          RawDelivery::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawDelivery::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDelivery::into_entry).collect()
  }
}
