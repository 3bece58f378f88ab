//! Handlers for `/api/feedback` and `/api/progress`.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `POST`  | `/api/feedback` | Create or resubmit phase 1; 201 |
//! | `PATCH` | `/api/feedback` | Owner-checked update; 403 on mismatch |
//! | `GET`   | `/api/feedback?lineUserId=` | Record or `null` |
//! | `GET`   | `/api/feedback?id=` | Record or 404 |
//! | `GET`   | `/api/feedback?all=true[&hasPhase1=true][&hasPhase2=true][&groupNumber=1,2]` | Joined listing; dashboard session required |
//! | `GET`   | `/api/progress?lineUserId=` | What the identity has answered |
//!
//! The listing carries registration details, so it needs the same session as
//! the dashboard. Browsers only send that cookie under `/dashboard`, where the
//! listing is also served as `/dashboard/feedback`.

use axum::{
  Json,
  extract::{
    Query, State,
    rejection::{JsonRejection, QueryRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use rubfang_core::{
  dashboard::{FeedbackListing, ListFilter, parse_group_numbers},
  feedback::{Feedback, FeedbackPatch, FeedbackSubmission, Progress},
  store::DocumentStore,
};
use serde::{Deserialize, Serialize};

use crate::{
  AppState,
  error::{ApiError, NOT_FOUND_ITEM},
};

// ─── Writes ──────────────────────────────────────────────────────────────────

/// `POST /api/feedback`
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  body: Result<Json<FeedbackSubmission>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore + 'static,
{
  let Json(input) = body?;
  let record = state.survey.submit_feedback(input).await.map_err(ApiError::saving)?;
  Ok((StatusCode::CREATED, Json(record)))
}

/// `PATCH /api/feedback`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  body: Result<Json<FeedbackPatch>, JsonRejection>,
) -> Result<Json<Feedback>, ApiError>
where
  S: DocumentStore + 'static,
{
  let Json(patch) = body?;
  let record = state.survey.patch_feedback(patch).await.map_err(ApiError::updating)?;
  Ok(Json(record))
}

// ─── Reads ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackParams {
  pub line_user_id: Option<String>,
  pub id:           Option<String>,
  pub all:          Option<String>,
  pub has_phase1:   Option<String>,
  pub has_phase2:   Option<String>,
  /// `5` or a comma-separated list such as `1,2,3`.
  pub group_number: Option<String>,
}

/// Either a single record (possibly `null`) or a listing.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum FeedbackResponse {
  One(Option<Feedback>),
  All(Vec<FeedbackListing>),
}

fn non_blank(value: Option<String>) -> Option<String> {
  value
    .map(|v| v.trim().to_string())
    .filter(|v| !v.is_empty())
}

fn is_true(value: Option<&str>) -> bool { value.is_some_and(|v| v.trim() == "true") }

/// Listing filter from `hasPhase1`, `hasPhase2` and `groupNumber`.
pub(crate) fn list_filter(
  has_phase1: Option<&str>,
  has_phase2: Option<&str>,
  group_number: Option<&str>,
) -> Result<ListFilter, ApiError> {
  Ok(ListFilter {
    has_phase1:    is_true(has_phase1),
    has_phase2:    is_true(has_phase2),
    group_numbers: group_number
      .map(parse_group_numbers)
      .transpose()?
      .unwrap_or_default(),
  })
}

/// `GET /api/feedback`: `lineUserId`, then `id`, then `all=true`.
pub async fn query<S>(
  State(state): State<AppState<S>>,
  jar: CookieJar,
  params: Result<Query<FeedbackParams>, QueryRejection>,
) -> Result<Json<FeedbackResponse>, ApiError>
where
  S: DocumentStore + 'static,
{
  let Query(params) = params?;
  let survey = &state.survey;

  if let Some(line_user_id) = non_blank(params.line_user_id) {
    let record = survey
      .feedback_for(&line_user_id)
      .await
      .map_err(ApiError::loading_data)?;
    return Ok(Json(FeedbackResponse::One(record)));
  }

  if let Some(id) = non_blank(params.id) {
    let record = survey
      .feedback_by_id(&id)
      .await
      .map_err(ApiError::loading_data)?
      .ok_or_else(|| ApiError::NotFound(NOT_FOUND_ITEM.to_string()))?;
    return Ok(Json(FeedbackResponse::One(Some(record))));
  }

  if is_true(params.all.as_deref()) {
    state.auth.authorize(&jar, Utc::now())?;
    let filter = list_filter(
      params.has_phase1.as_deref(),
      params.has_phase2.as_deref(),
      params.group_number.as_deref(),
    )?;
    let rows = survey.listing(&filter).await.map_err(ApiError::loading_data)?;
    return Ok(Json(FeedbackResponse::All(rows)));
  }

  Err(ApiError::BadRequest("ต้องส่ง lineUserId หรือ all=true".to_string()))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressParams {
  pub line_user_id: Option<String>,
}

/// `GET /api/progress?lineUserId=<id>`
pub async fn progress<S>(
  State(state): State<AppState<S>>,
  params: Result<Query<ProgressParams>, QueryRejection>,
) -> Result<Json<Progress>, ApiError>
where
  S: DocumentStore + 'static,
{
  let Query(params) = params?;
  let line_user_id = non_blank(params.line_user_id)
    .ok_or_else(|| ApiError::BadRequest("ต้องส่ง lineUserId".to_string()))?;
  let progress = state
    .survey
    .progress(&line_user_id)
    .await
    .map_err(ApiError::loading_data)?;
  Ok(Json(progress))
}
