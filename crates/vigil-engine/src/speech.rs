//! Voice payload rendering.
//!
//! A task with a voice-clone profile is first rendered through the
//! [`SpeechComposer`]. If that fails or times out the call still goes ahead
//! with the gateway's synthesized speech; a voice reminder is never skipped
//! because the clone was unavailable.

use tracing::{debug, warn};
use vigil_core::{gateway::Payload, speech::SpeechComposer, task::ReminderTask};

use crate::config::EngineConfig;

const REPEAT_LEAD_IN: &str = "I'll repeat that.";

/// The payload for a voice call carrying `text`.
pub async fn voice_payload<V>(
  composer: &V,
  config: &EngineConfig,
  task: &ReminderTask,
  text: &str,
) -> Payload
where
  V: SpeechComposer,
{
  let Some(profile) = task.clone_profile() else {
    if task.use_voice_clone {
      warn!(task_id = %task.task_id, "voice clone requested but no profile set; using synthesized speech");
    }
    return synthesized(config, text);
  };

  match tokio::time::timeout(config.speech_timeout(), composer.synthesize(text, profile)).await {
    Ok(Ok(asset)) => {
      debug!(task_id = %task.task_id, url = %asset.url, "voice clone rendered");
      Payload::Audio { url: asset.url, transcript: text.to_owned() }
    }
    Ok(Err(e)) => {
      warn!(task_id = %task.task_id, error = %e, "voice clone failed; using synthesized speech");
      synthesized(config, text)
    }
    Err(_) => {
      warn!(
        task_id = %task.task_id,
        timeout_secs = config.speech_timeout_secs,
        "voice clone timed out; using synthesized speech"
      );
      synthesized(config, text)
    }
  }
}

/// Provider text-to-speech, optionally reading the message twice.
pub fn synthesized(config: &EngineConfig, text: &str) -> Payload {
  let text = if config.repeat_voice_message {
    format!("{text} {REPEAT_LEAD_IN} {text}")
  } else {
    text.to_owned()
  };
  Payload::Speech { text, voice: config.default_voice.clone() }
}
