//! SMS and voice-call delivery over the provider's messages API.
//!
//! `POST {base_url}/messages` with
//! `{ "to": "+44…", "channel": "sms" | "voice_call", "payload": { "kind": … } }`.
//! The provider answers `{ "id": "…", "status": "queued" | "sent" | "failed",
//! "error": "…" }`.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use vigil_core::{
  channel::Channel,
  delivery::DeliveryStatus,
  gateway::{DeliveryGateway, Payload, Receipt},
};

use crate::{Error, ProviderConfig, Result};

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
  to:      &'a str,
  channel: Channel,
  payload: &'a Payload,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
  id:     Option<String>,
  status: String,
  #[serde(default)]
  error:  Option<String>,
}

/// Telephony provider client. Cheap to clone; the inner [`reqwest::Client`]
/// is `Arc`-based.
#[derive(Clone)]
pub struct HttpGateway {
  client: Client,
  config: ProviderConfig,
}

impl HttpGateway {
  pub fn new(config: ProviderConfig) -> Result<Self> {
    Ok(Self { client: config.client()?, config })
  }
}

impl DeliveryGateway for HttpGateway {
  type Error = Error;

  async fn send(&self, recipient: &str, channel: Channel, payload: &Payload) -> Result<Receipt> {
    let body = SendRequest { to: recipient, channel, payload };
    let resp = self
      .config
      .auth(self.client.post(self.config.url("/messages")))
      .json(&body)
      .send()
      .await?;

    let status = resp.status();
    let text = resp.text().await?;
    debug!(%channel, status = status.as_u16(), "provider answered");
    interpret(status, &text)
  }
}

/// Map a provider answer onto a [`Receipt`].
///
/// A 4xx is the provider refusing this particular message, so it is a failed
/// receipt. A 5xx is the provider being down, so it is an error.
fn interpret(status: StatusCode, body: &str) -> Result<Receipt> {
  if status.is_server_error() {
    return Err(Error::Status { status: status.as_u16(), body: body.to_owned() });
  }
  if status.is_client_error() {
    return Ok(Receipt::failed(format!("rejected ({}): {}", status.as_u16(), body.trim())));
  }
  if !status.is_success() {
    return Err(Error::Status { status: status.as_u16(), body: body.to_owned() });
  }

  let resp: SendResponse = serde_json::from_str(body)?;
  if resp.status == "failed" {
    let detail = resp.error.unwrap_or_else(|| "provider reported failure".to_owned());
    return Ok(Receipt { status: DeliveryStatus::Failed, provider_ref: resp.id, detail: Some(detail) });
  }
  Ok(Receipt { status: DeliveryStatus::Sent, provider_ref: resp.id, detail: None })
}
