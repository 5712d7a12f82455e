//! Engine tuning, deserialised from the `[engine]` section of the server's
//! configuration file.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::zone::ReferenceZone;

/// When a due occurrence counts toward `attempts_today`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptCounting {
  /// Every unsatisfied due occurrence counts once, whatever the delivery
  /// outcome. Completion is signalled only by `last_satisfied_at`.
  #[default]
  Occurrence,
  /// An occurrence counts once only if no channel delivered successfully.
  FailedDelivery,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  pub zone:                     ReferenceZone,
  pub attempt_counting:         AttemptCounting,
  /// Bound on each gateway send; a timeout is logged as a failure.
  pub gateway_timeout_secs:     u64,
  /// Bound on each voice-clone synthesis; a timeout triggers the fallback.
  pub speech_timeout_secs:      u64,
  /// Pause between consecutive escalation sends.
  pub escalation_send_delay_ms: u64,
  /// Speaking rate used for the spoken-duration estimate.
  pub words_per_minute:         u32,
  /// Cap on the spoken-duration estimate.
  pub max_spoken_secs:          u32,
  /// Provider voice for synthesized speech; `None` uses the provider default.
  pub default_voice:            Option<String>,
  /// Read the reminder twice on synthesized voice calls.
  pub repeat_voice_message:     bool,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      zone:                     ReferenceZone::default(),
      attempt_counting:         AttemptCounting::default(),
      gateway_timeout_secs:     15,
      speech_timeout_secs:      20,
      escalation_send_delay_ms: 1_000,
      words_per_minute:         150,
      max_spoken_secs:          120,
      default_voice:            None,
      repeat_voice_message:     true,
    }
  }
}

impl EngineConfig {
  pub fn gateway_timeout(&self) -> Duration { Duration::from_secs(self.gateway_timeout_secs) }

  pub fn speech_timeout(&self) -> Duration { Duration::from_secs(self.speech_timeout_secs) }

  pub fn escalation_send_delay(&self) -> Duration {
    Duration::from_millis(self.escalation_send_delay_ms)
  }
}
