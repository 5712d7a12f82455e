//! Route handlers.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/health` | Liveness |
//! | `POST` | `/tick` | Optional `?at=<rfc3339>`; returns the tick summary |
//! | `POST` | `/tasks/:id/satisfied` | Optional `?at=<rfc3339>`; 204 |
//! | `GET`  | `/tasks/:id/deliveries` | Delivery log, oldest first |
//! | `GET`  | `/subjects/:id/deliveries` | Delivery log across the subject's tasks |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;
use vigil_core::{
  delivery::DeliveryLogEntry, gateway::DeliveryGateway, speech::SpeechComposer,
  store::ReminderStore,
};
use vigil_engine::TickSummary;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct AtParams {
  /// Defaults to the current instant.
  pub at: Option<DateTime<Utc>>,
}

/// `GET /health`
pub async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

/// `POST /tick[?at=<rfc3339>]`
pub async fn tick<S, G, V>(
  State(state): State<AppState<S, G, V>>,
  Query(params): Query<AtParams>,
) -> Json<TickSummary>
where
  S: ReminderStore + 'static,
  G: DeliveryGateway + 'static,
  V: SpeechComposer + 'static,
{
  let now = params.at.unwrap_or_else(Utc::now);
  Json(state.engine.tick(now).await)
}

/// `POST /tasks/:id/satisfied[?at=<rfc3339>]`
pub async fn mark_satisfied<S, G, V>(
  State(state): State<AppState<S, G, V>>,
  Path(id): Path<Uuid>,
  Query(params): Query<AtParams>,
) -> Result<StatusCode, ApiError>
where
  S: ReminderStore + 'static,
  G: DeliveryGateway + 'static,
  V: SpeechComposer + 'static,
{
  let store = state.engine.store();
  if store.get_task(id).await.map_err(ApiError::store)?.is_none() {
    return Err(ApiError::NotFound(format!("task {id}")));
  }
  let at = params.at.unwrap_or_else(Utc::now);
  store.mark_satisfied(id, at).await.map_err(ApiError::store)?;
  tracing::info!(task_id = %id, %at, "task satisfied");
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /tasks/:id/deliveries`
pub async fn task_deliveries<S, G, V>(
  State(state): State<AppState<S, G, V>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<DeliveryLogEntry>>, ApiError>
where
  S: ReminderStore + 'static,
  G: DeliveryGateway + 'static,
  V: SpeechComposer + 'static,
{
  let store = state.engine.store();
  if store.get_task(id).await.map_err(ApiError::store)?.is_none() {
    return Err(ApiError::NotFound(format!("task {id}")));
  }
  let entries = store.deliveries_for_task(id).await.map_err(ApiError::store)?;
  Ok(Json(entries))
}

/// `GET /subjects/:id/deliveries`
pub async fn subject_deliveries<S, G, V>(
  State(state): State<AppState<S, G, V>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<DeliveryLogEntry>>, ApiError>
where
  S: ReminderStore + 'static,
  G: DeliveryGateway + 'static,
  V: SpeechComposer + 'static,
{
  let store = state.engine.store();
  if store.get_subject(id).await.map_err(ApiError::store)?.is_none() {
    return Err(ApiError::NotFound(format!("subject {id}")));
  }
  let entries = store.deliveries_for_subject(id).await.map_err(ApiError::store)?;
  Ok(Json(entries))
}
