use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Connection settings for one provider API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
  pub base_url:     String,
  /// Sent as a bearer token when set.
  #[serde(default)]
  pub api_token:    Option<String>,
  /// Client-side request timeout. The engine applies its own, usually
  /// tighter, bound on top of this.
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 { 30 }

impl ProviderConfig {
  pub fn new(base_url: impl Into<String>) -> Self {
    Self { base_url: base_url.into(), api_token: None, timeout_secs: default_timeout_secs() }
  }

  pub(crate) fn client(&self) -> Result<Client> {
    Ok(Client::builder().timeout(Duration::from_secs(self.timeout_secs)).build()?)
  }

  pub(crate) fn url(&self, path: &str) -> String {
    format!("{}{}", self.base_url.trim_end_matches('/'), path)
  }

  pub(crate) fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    match &self.api_token {
      Some(token) if !token.is_empty() => req.bearer_auth(token),
      _ => req,
    }
  }
}
