//! Voice-clone synthesis over the provider's voices API.
//!
//! `POST {base_url}/voices/{profile}/synthesize` with `{ "text": "…" }`,
//! answered by `{ "asset_url": "…" }`.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use vigil_core::speech::{AudioAsset, SpeechComposer};

use crate::{Error, ProviderConfig, Result};

#[derive(Debug, Serialize)]
struct SynthesizeRequest<'a> {
  text: &'a str,
}

#[derive(Debug, Deserialize)]
struct SynthesizeResponse {
  asset_url: String,
}

#[derive(Clone)]
pub struct HttpSpeechComposer {
  client: Client,
  config: ProviderConfig,
}

impl HttpSpeechComposer {
  pub fn new(config: ProviderConfig) -> Result<Self> {
    Ok(Self { client: config.client()?, config })
  }

  fn synthesize_url(&self, voice_profile: &str) -> String {
    self.config.url(&format!("/voices/{voice_profile}/synthesize"))
  }
}

impl SpeechComposer for HttpSpeechComposer {
  type Error = Error;

  async fn synthesize(&self, text: &str, voice_profile: &str) -> Result<AudioAsset> {
    let resp = self
      .config
      .auth(self.client.post(self.synthesize_url(voice_profile)))
      .json(&SynthesizeRequest { text })
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(Error::Status { status: status.as_u16(), body });
    }

    let parsed: SynthesizeResponse = resp.json().await?;
    debug!(voice_profile, url = %parsed.asset_url, "voice clone synthesized");
    Ok(AudioAsset { url: parsed.asset_url })
  }
}

#[cfg(test)]
mod tests {
  use axum::{Json, Router, extract::Path, http::StatusCode, routing::post};
  use serde_json::{Value, json};

  use super::*;

  async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
  }

  #[tokio::test]
  async fn returns_asset_url_for_profile() {
    let app = Router::new().route(
      "/voices/{profile}/synthesize",
      post(|Path(profile): Path<String>, Json(body): Json<Value>| async move {
        assert_eq!(body["text"], "Hello Margaret");
        Json(json!({ "asset_url": format!("https://cdn.test/{profile}.mp3") }))
      }),
    );
    let composer = HttpSpeechComposer::new(ProviderConfig::new(serve(app).await)).unwrap();

    let asset = composer.synthesize("Hello Margaret", "margaret-v1").await.unwrap();
    assert_eq!(asset.url, "https://cdn.test/margaret-v1.mp3");
  }

  #[tokio::test]
  async fn unknown_profile_is_an_error() {
    let app = Router::new().route(
      "/voices/{profile}/synthesize",
      post(|| async { (StatusCode::NOT_FOUND, "no such voice") }),
    );
    let composer = HttpSpeechComposer::new(ProviderConfig::new(serve(app).await)).unwrap();

    let err = composer.synthesize("Hello", "missing").await.unwrap_err();
    assert!(matches!(err, Error::Status { status: 404, .. }));
  }
}
