//! HTTP surface and process wiring for the Vigil engine.
//!
//! Exposes an axum [`Router`] that lets an external scheduler drive ticks
//! (`POST /tick`), lets the surrounding product record completions and read
//! the delivery audit trail. An optional in-process [`ticker`] replaces the
//! external scheduler.

pub mod error;
pub mod handlers;
pub mod ticker;

pub use error::ApiError;

use std::path::PathBuf;

use axum::{
  Router,
  routing::{get, post},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use vigil_core::{gateway::DeliveryGateway, speech::SpeechComposer, store::ReminderStore};
use vigil_engine::{Engine, EngineConfig};
use vigil_telephony::ProviderConfig;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Everything read from `vigil.toml` and `VIGIL__*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  pub server:    ServerConfig,
  #[serde(default)]
  pub engine:    EngineConfig,
  /// SMS and voice-call provider.
  pub telephony: ProviderConfig,
  /// Voice-clone provider. Without it every voice call uses synthesized
  /// speech.
  #[serde(default)]
  pub speech:    Option<ProviderConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  /// Run the minute ticker in-process instead of waiting for `POST /tick`.
  #[serde(default)]
  pub ticker:     bool,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("vigil.db") }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, G, V> {
  pub engine: Engine<S, G, V>,
}

impl<S, G, V> Clone for AppState<S, G, V> {
  fn clone(&self) -> Self { Self { engine: self.engine.clone() } }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the server.
pub fn router<S, G, V>(state: AppState<S, G, V>) -> Router
where
  S: ReminderStore + 'static,
  G: DeliveryGateway + 'static,
  V: SpeechComposer + 'static,
{
  Router::new()
    .route("/health",                    get(handlers::health))
    .route("/tick",                      post(handlers::tick::<S, G, V>))
    .route("/tasks/{id}/deliveries",     get(handlers::task_deliveries::<S, G, V>))
    .route("/tasks/{id}/satisfied",      post(handlers::mark_satisfied::<S, G, V>))
    .route("/subjects/{id}/deliveries",  get(handlers::subject_deliveries::<S, G, V>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use serde_json::Value;
  use tower::ServiceExt;
  use uuid::Uuid;
  use vigil_core::{
    channel::Channel,
    gateway::{Payload, Receipt},
    schedule::{ScheduleDay, TimeOfDay},
    speech::NoVoiceClone,
    subject::NewSubject,
    task::{NewTask, ReminderTask},
  };
  use vigil_store_sqlite::SqliteStore;

  use super::*;

  #[derive(Debug, thiserror::Error)]
  #[error("unreachable")]
  struct Never;

  #[derive(Default)]
  struct RecordingGateway {
    sent: Mutex<Vec<String>>,
  }

  impl DeliveryGateway for RecordingGateway {
    type Error = Never;

    async fn send(
      &self,
      recipient: &str,
      _channel: Channel,
      _payload: &Payload,
    ) -> Result<Receipt, Never> {
      self.sent.lock().unwrap().push(recipient.to_owned());
      Ok(Receipt::sent("ref-1"))
    }
  }

  type TestState = AppState<SqliteStore, RecordingGateway, NoVoiceClone>;

  async fn make_state() -> (TestState, ReminderTask) {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let subject = store
      .add_subject(NewSubject::new("Margaret", "+447700900001"))
      .await
      .unwrap();
    let task = store
      .add_task(NewTask::new(subject.subject_id, "Take your heart tablets"))
      .await
      .unwrap();
    store
      .add_schedule(task.task_id, ScheduleDay::EveryDay, TimeOfDay::new(8, 0).unwrap())
      .await
      .unwrap();

    let engine = Engine::new(
      store,
      Arc::new(RecordingGateway::default()),
      Arc::new(NoVoiceClone),
      EngineConfig::default(),
    );
    (AppState { engine }, task)
  }

  async fn call(state: TestState, method: &str, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
      .method(method)
      .uri(uri)
      .body(Body::empty())
      .unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json)
  }

  #[tokio::test]
  async fn health_is_ok() {
    let (state, _) = make_state().await;
    let (status, body) = call(state, "GET", "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
  }

  #[tokio::test]
  async fn tick_at_due_minute_delivers_and_reports() {
    let (state, task) = make_state().await;

    let (status, summary) = call(state.clone(), "POST", "/tick?at=2024-03-04T08:00:00Z").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["schedules_due"], 1);
    assert_eq!(summary["deliveries_succeeded"], 1);

    let (status, log) =
      call(state, "GET", &format!("/tasks/{}/deliveries", task.task_id)).await;
    assert_eq!(status, StatusCode::OK);
    let entries = log.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["status"], "sent");
    assert_eq!(entries[0]["channel"], "sms");
    assert_eq!(entries[0]["provider_ref"], "ref-1");
  }

  #[tokio::test]
  async fn subject_audit_lists_all_tasks() {
    let (state, task) = make_state().await;
    call(state.clone(), "POST", "/tick?at=2024-03-04T08:00:00Z").await;

    let (status, log) =
      call(state, "GET", &format!("/subjects/{}/deliveries", task.subject_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(log.as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn satisfied_task_is_skipped_by_next_tick() {
    let (state, task) = make_state().await;

    let (status, _) = call(
      state.clone(),
      "POST",
      &format!("/tasks/{}/satisfied?at=2024-03-04T07:30:00Z", task.task_id),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, summary) = call(state, "POST", "/tick?at=2024-03-04T08:00:00Z").await;
    assert_eq!(summary["skipped_satisfied"], 1);
    assert_eq!(summary["deliveries_attempted"], 0);
  }

  #[tokio::test]
  async fn unknown_task_is_404() {
    let (state, _) = make_state().await;
    let id = Uuid::new_v4();

    let (status, body) = call(state.clone(), "GET", &format!("/tasks/{id}/deliveries")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains(&id.to_string()));

    let (status, _) = call(state, "POST", &format!("/tasks/{id}/satisfied")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[test]
  fn settings_fill_defaults() {
    let settings: Settings = serde_json::from_value(serde_json::json!({
      "server": { "port": 9090 },
      "telephony": { "base_url": "http://relay.test" }
    }))
    .unwrap();
    assert_eq!(settings.server.host, "127.0.0.1");
    assert_eq!(settings.server.port, 9090);
    assert!(!settings.server.ticker);
    assert!(settings.speech.is_none());
    assert_eq!(settings.engine.gateway_timeout_secs, 15);
  }
}
