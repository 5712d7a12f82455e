//! The `DeliveryGateway` trait: sends one payload to one phone number.
//!
//! Implemented by telephony provider clients (e.g. `vigil-telephony`). The
//! engine applies its own timeout around every call and treats a timeout the
//! same as a provider-reported failure.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{channel::Channel, delivery::DeliveryStatus};

/// What is actually delivered over a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
  /// Literal text for an SMS.
  Text { text: String },
  /// Text the provider reads out with its own synthesized voice.
  Speech {
    text:  String,
    /// Provider voice name; `None` uses the provider default.
    voice: Option<String>,
  },
  /// A pre-rendered audio asset, e.g. a voice-clone recording.
  Audio {
    url:        String,
    /// What the audio says; kept for the delivery log.
    transcript: String,
  },
}

impl Payload {
  /// The human-readable content recorded in the delivery log.
  pub fn content(&self) -> &str {
    match self {
      Self::Text { text } | Self::Speech { text, .. } => text,
      Self::Audio { transcript, .. } => transcript,
    }
  }
}

/// The provider's answer to one send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
  pub status:       DeliveryStatus,
  pub provider_ref: Option<String>,
  /// Provider-supplied reason when `status` is `Failed`.
  pub detail:       Option<String>,
}

impl Receipt {
  pub fn sent(provider_ref: impl Into<String>) -> Self {
    Self { status: DeliveryStatus::Sent, provider_ref: Some(provider_ref.into()), detail: None }
  }

  pub fn failed(detail: impl Into<String>) -> Self {
    Self { status: DeliveryStatus::Failed, provider_ref: None, detail: Some(detail.into()) }
  }
}

/// Abstraction over a telephony provider.
///
/// `Err` means the send could not be completed at all (transport error,
/// provider 5xx); a provider that answered but refused the message returns
/// `Ok` with a failed [`Receipt`].
pub trait DeliveryGateway: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn send<'a>(
    &'a self,
    recipient: &'a str,
    channel: Channel,
    payload: &'a Payload,
  ) -> impl Future<Output = Result<Receipt, Self::Error>> + Send + 'a;
}
