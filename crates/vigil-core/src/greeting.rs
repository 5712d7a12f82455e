//! Conversational greeting templates.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

/// Part of the day a message is composed in, from the local clock hour.
///
/// | Bucket    | Hours         |
/// |-----------|---------------|
/// | morning   | 05:00–11:59   |
/// | afternoon | 12:00–17:59   |
/// | evening   | 18:00–04:59   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeBucket {
  Morning,
  Afternoon,
  Evening,
}

impl TimeBucket {
  pub fn from_hour(hour: u32) -> Self {
    match hour {
      5..=11 => Self::Morning,
      12..=17 => Self::Afternoon,
      _ => Self::Evening,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Morning => "morning",
      Self::Afternoon => "afternoon",
      Self::Evening => "evening",
    }
  }
}

impl fmt::Display for TimeBucket {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for TimeBucket {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "morning" => Ok(Self::Morning),
      "afternoon" => Ok(Self::Afternoon),
      "evening" => Ok(Self::Evening),
      other => Err(Error::UnknownTimeBucket(other.to_owned())),
    }
  }
}

/// A greeting keyed by (style, bucket). A `None` bucket is the style's
/// "any time" fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GreetingTemplate {
  pub template_id:     Uuid,
  pub style:           String,
  pub bucket:          Option<TimeBucket>,
  /// Opening line; `{name}` is replaced with the subject's display name.
  pub greeting:        String,
  pub wellbeing_check: Option<String>,
  pub closing:         Option<String>,
}

/// Input to `SqliteStore::add_greeting_template`.
#[derive(Debug, Clone)]
pub struct NewGreetingTemplate {
  pub style:           String,
  pub bucket:          Option<TimeBucket>,
  pub greeting:        String,
  pub wellbeing_check: Option<String>,
  pub closing:         Option<String>,
}
