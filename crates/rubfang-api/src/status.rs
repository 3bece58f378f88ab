//! Liveness and public client settings.

use axum::{Json, extract::State};
use rubfang_core::store::DocumentStore;
use serde_json::{Value, json};

use crate::AppState;

/// `GET /health`
pub async fn health() -> Json<Value> { Json(json!({ "ok": true })) }

/// `GET /api/client-config`: what the browser needs to start the login
/// gate. A `null` client id puts the gate straight into its error state.
pub async fn client_config<S>(State(state): State<AppState<S>>) -> Json<Value>
where
  S: DocumentStore + 'static,
{
  Json(json!({ "lineClientId": state.client.line_client_id }))
}
