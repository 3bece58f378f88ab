//! Handlers for `/api/registration`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/registration` | Upsert by `lineUserId`; 201 with the record |
//! | `GET`  | `/api/registration?lineUserId=` | 404 if not registered |

use axum::{
  Json,
  extract::{
    Query, State,
    rejection::{JsonRejection, QueryRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use rubfang_core::{
  registration::{Registration, RegistrationInput},
  store::DocumentStore,
};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

// ─── Upsert ──────────────────────────────────────────────────────────────────

/// `POST /api/registration`
pub async fn upsert<S>(
  State(state): State<AppState<S>>,
  body: Result<Json<RegistrationInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore + 'static,
{
  let Json(input) = body?;
  let record = state.survey.register(input).await.map_err(ApiError::saving)?;
  Ok((StatusCode::CREATED, Json(record)))
}

// ─── Lookup ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupParams {
  pub line_user_id: Option<String>,
}

/// `GET /api/registration?lineUserId=<id>`
pub async fn lookup<S>(
  State(state): State<AppState<S>>,
  params: Result<Query<LookupParams>, QueryRejection>,
) -> Result<Json<Registration>, ApiError>
where
  S: DocumentStore + 'static,
{
  let Query(params) = params?;
  let line_user_id = params
    .line_user_id
    .filter(|id| !id.trim().is_empty())
    .ok_or_else(|| ApiError::BadRequest("ต้องส่ง lineUserId".to_string()))?;

  let record = state
    .survey
    .registration(line_user_id.trim())
    .await
    .map_err(ApiError::loading)?
    .ok_or_else(|| ApiError::NotFound("ไม่พบข้อมูล".to_string()))?;
  Ok(Json(record))
}
