//! Dashboard reads for signed-in staff.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/dashboard/feedback[?hasPhase1=true][&hasPhase2=true][&groupNumber=1,2]` | Joined listing |
//! | `GET`  | `/dashboard/summary[?base=base2][&groupNumber=1,2]` | Per-question answers |

use axum::{
  Json,
  extract::{Query, State, rejection::QueryRejection},
};
use rubfang_core::{
  dashboard::{FeedbackListing, Summary, SummaryFilter, parse_group_numbers},
  feedback::Base,
  store::DocumentStore,
};
use serde::Deserialize;

use crate::{AppState, auth::DashboardSession, error::ApiError, feedback::list_filter};

// ─── Listing ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingParams {
  pub has_phase1:   Option<String>,
  pub has_phase2:   Option<String>,
  pub group_number: Option<String>,
}

/// `GET /dashboard/feedback`
pub async fn listing<S>(
  _session: DashboardSession,
  State(state): State<AppState<S>>,
  params: Result<Query<ListingParams>, QueryRejection>,
) -> Result<Json<Vec<FeedbackListing>>, ApiError>
where
  S: DocumentStore + 'static,
{
  let Query(params) = params?;
  let filter = list_filter(
    params.has_phase1.as_deref(),
    params.has_phase2.as_deref(),
    params.group_number.as_deref(),
  )?;
  let rows = state.survey.listing(&filter).await.map_err(ApiError::loading_data)?;
  Ok(Json(rows))
}

// ─── Summary ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryParams {
  /// `base1`..`base4`; absent, empty or `all` selects every base.
  pub base:         Option<String>,
  pub group_number: Option<String>,
}

impl SummaryParams {
  fn into_filter(self) -> Result<SummaryFilter, ApiError> {
    let base = match self.base.as_deref().map(str::trim) {
      None | Some("" | "all") => None,
      Some(raw) => Some(
        raw
          .parse::<Base>()
          .map_err(|_| ApiError::BadRequest(format!("ไม่รู้จักฐาน {raw}")))?,
      ),
    };
    Ok(SummaryFilter {
      base,
      group_numbers: self
        .group_number
        .as_deref()
        .map(parse_group_numbers)
        .transpose()?
        .unwrap_or_default(),
    })
  }
}

/// `GET /dashboard/summary`
pub async fn summary<S>(
  _session: DashboardSession,
  State(state): State<AppState<S>>,
  params: Result<Query<SummaryParams>, QueryRejection>,
) -> Result<Json<Summary>, ApiError>
where
  S: DocumentStore + 'static,
{
  let Query(params) = params?;
  let filter = params.into_filter()?;
  let summary = state.survey.summary(&filter).await.map_err(ApiError::loading_data)?;
  Ok(Json(summary))
}
