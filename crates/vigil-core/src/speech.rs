//! The `SpeechComposer` trait: renders reminder text in a subject's cloned
//! voice.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::Error;

/// A playable audio file hosted by the voice-clone provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioAsset {
  pub url: String,
}

/// Abstraction over a voice-clone provider.
///
/// Any error is recovered by the engine, which falls back to the gateway's
/// own synthesized speech; a composer failure never fails a delivery.
pub trait SpeechComposer: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn synthesize<'a>(
    &'a self,
    text: &'a str,
    voice_profile: &'a str,
  ) -> impl Future<Output = Result<AudioAsset, Self::Error>> + Send + 'a;
}

/// A composer for deployments without a voice-clone provider. Every call
/// fails, so voice calls always use synthesized speech.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVoiceClone;

impl SpeechComposer for NoVoiceClone {
  type Error = Error;

  async fn synthesize(&self, _text: &str, _voice_profile: &str) -> Result<AudioAsset, Error> {
    Err(Error::VoiceCloneUnavailable)
  }
}
