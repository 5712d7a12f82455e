//! Message composition: the literal text of a reminder.
//!
//! Subjects with conversational mode get a greeting template chosen by
//! (style, time-of-day bucket), falling back to the style's "any time"
//! template and then to the fixed default message. Everyone else gets the
//! default message.

use chrono::{NaiveDateTime, Timelike};
use tracing::warn;
use uuid::Uuid;
use vigil_core::{
  greeting::{GreetingTemplate, TimeBucket},
  store::ReminderStore,
  subject::Subject,
  task::ReminderTask,
};

use crate::config::EngineConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedMessage {
  pub text:                  String,
  /// Only used for capacity and cost accounting.
  pub estimated_spoken_secs: u32,
  /// The greeting template used, if any.
  pub template_id:           Option<Uuid>,
}

/// Build the reminder text for `task` at local time `now`.
///
/// Template lookup failures degrade to the default message; composing never
/// fails.
pub async fn compose<S>(
  store:   &S,
  config:  &EngineConfig,
  subject: &Subject,
  task:    &ReminderTask,
  now:     &NaiveDateTime,
) -> ComposedMessage
where
  S: ReminderStore,
{
  let template = if subject.conversation.enabled {
    find_template(store, &subject.conversation.style, TimeBucket::from_hour(now.hour())).await
  } else {
    None
  };

  let text = match &template {
    Some(t) => render(t, subject, task),
    None => default_message(&subject.display_name, task.body()),
  };

  ComposedMessage {
    estimated_spoken_secs: estimate_spoken_secs(&text, config.words_per_minute, config.max_spoken_secs),
    template_id: template.map(|t| t.template_id),
    text,
  }
}

/// Exact (style, bucket) first, then the style's "any time" template.
async fn find_template<S>(store: &S, style: &str, bucket: TimeBucket) -> Option<GreetingTemplate>
where
  S: ReminderStore,
{
  for candidate in [Some(bucket), None] {
    match store.greeting_template(style, candidate).await {
      Ok(Some(t)) => return Some(t),
      Ok(None) => {}
      Err(e) => {
        warn!(style, error = %e, "greeting template lookup failed; using default message");
        return None;
      }
    }
  }
  None
}

/// The fixed template used when no conversational template applies.
pub fn default_message(name: &str, body: &str) -> String {
  format!("Hello {name}, this is your reminder: {}", sentence(body))
}

/// Greeting, optional wellbeing check, reminder body, optional closing.
pub fn render(template: &GreetingTemplate, subject: &Subject, task: &ReminderTask) -> String {
  let mut parts = vec![template.greeting.replace("{name}", &subject.display_name)];
  if subject.conversation.wellbeing_check
    && let Some(check) = &template.wellbeing_check
  {
    parts.push(check.clone());
  }
  parts.push(format!("This is your reminder: {}", sentence(task.body())));
  if let Some(closing) = &template.closing {
    parts.push(closing.clone());
  }
  parts.join(" ")
}

/// Spoken length in whole seconds at `words_per_minute`, capped at `max_secs`.
pub fn estimate_spoken_secs(text: &str, words_per_minute: u32, max_secs: u32) -> u32 {
  if words_per_minute == 0 {
    return max_secs;
  }
  let words = text.split_whitespace().count() as u64;
  let secs = (words * 60).div_ceil(u64::from(words_per_minute));
  secs.min(u64::from(max_secs)) as u32
}

fn sentence(body: &str) -> String {
  let body = body.trim();
  if body.ends_with(['.', '!', '?']) { body.to_owned() } else { format!("{body}.") }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use vigil_core::{channel::Channel, subject::ConversationPrefs};

  use super::*;

  fn subject(wellbeing: bool) -> Subject {
    Subject {
      subject_id:   Uuid::nil(),
      display_name: "Margaret".into(),
      phone_number: Some("+447700900001".into()),
      conversation: ConversationPrefs {
        enabled:         true,
        style:           "warm".into(),
        wellbeing_check: wellbeing,
      },
      created_at:   Utc::now(),
    }
  }

  fn task() -> ReminderTask {
    ReminderTask {
      task_id:              Uuid::nil(),
      subject_id:           Uuid::nil(),
      title:                "Take your heart tablets".into(),
      message:              None,
      delivery_methods:     vec![Channel::VoiceCall],
      use_voice_clone:      false,
      voice_profile:        None,
      escalation_threshold: 3,
      attempts_today:       0,
      last_satisfied_at:    None,
      escalated_at:         None,
      created_at:           Utc::now(),
    }
  }

  fn template() -> GreetingTemplate {
    GreetingTemplate {
      template_id:     Uuid::nil(),
      style:           "warm".into(),
      bucket:          Some(TimeBucket::Morning),
      greeting:        "Good morning {name}!".into(),
      wellbeing_check: Some("How are you feeling today?".into()),
      closing:         Some("Have a lovely day.".into()),
    }
  }

  #[test]
  fn default_message_names_subject_and_task() {
    assert_eq!(
      default_message("Margaret", "Take your heart tablets"),
      "Hello Margaret, this is your reminder: Take your heart tablets."
    );
    assert_eq!(
      default_message("Margaret", "Drink some water!"),
      "Hello Margaret, this is your reminder: Drink some water!"
    );
  }

  #[test]
  fn render_orders_wellbeing_before_body_and_closing_after() {
    let text = render(&template(), &subject(true), &task());
    assert_eq!(
      text,
      "Good morning Margaret! How are you feeling today? \
       This is your reminder: Take your heart tablets. Have a lovely day."
    );
  }

  #[test]
  fn render_omits_wellbeing_when_not_requested() {
    let text = render(&template(), &subject(false), &task());
    assert!(!text.contains("How are you feeling"));
    assert!(text.ends_with("Have a lovely day."));
  }

  #[test]
  fn spoken_estimate_scales_and_caps() {
    // 10 words at 150 wpm → 4 s.
    let ten = "one two three four five six seven eight nine ten";
    assert_eq!(estimate_spoken_secs(ten, 150, 120), 4);
    // 11 words round up to 5 s.
    assert_eq!(estimate_spoken_secs(&format!("{ten} eleven"), 150, 120), 5);
    let long = "word ".repeat(1_000);
    assert_eq!(estimate_spoken_secs(&long, 150, 120), 120);
    assert_eq!(estimate_spoken_secs("", 150, 120), 0);
  }
}
