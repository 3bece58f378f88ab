//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error leaves the API as `{"error": "<message>"}` with a Thai message
//! meant for the respondent. Storage failures are logged with their cause and
//! reported with a generic message.

use axum::{
  Json,
  extract::rejection::{JsonRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use rubfang_core::error::Invalid;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  /// The server is missing configuration the request depends on.
  #[error("misconfigured: {0}")]
  Misconfigured(String),

  #[error("store error while {action}: {source}")]
  Store {
    action:  &'static str,
    message: &'static str,
    #[source]
    source:  Box<dyn std::error::Error + Send + Sync>,
  },
}

impl ApiError {
  /// Map a core error raised by a write that creates records.
  pub fn saving(e: rubfang_core::Error) -> Self {
    Self::from_core(e, "saving", "เกิดข้อผิดพลาดในการบันทึก")
  }

  /// Map a core error raised by an owner-checked update.
  pub fn updating(e: rubfang_core::Error) -> Self {
    Self::from_core(e, "updating", "เกิดข้อผิดพลาดในการอัปเดต")
  }

  /// Map a core error raised by a registration read.
  pub fn loading(e: rubfang_core::Error) -> Self {
    Self::from_core(e, "loading", "เกิดข้อผิดพลาดในการโหลด")
  }

  /// Map a core error raised by a feedback or dashboard read.
  pub fn loading_data(e: rubfang_core::Error) -> Self {
    Self::from_core(e, "loading data", "เกิดข้อผิดพลาดในการโหลดข้อมูล")
  }

  fn from_core(e: rubfang_core::Error, action: &'static str, message: &'static str) -> Self {
    use rubfang_core::Error as E;
    match e {
      E::Invalid(invalid) => invalid.into(),
      E::FeedbackNotFound(_) => ApiError::NotFound(NOT_FOUND_ITEM.to_string()),
      E::NotOwner { .. } => ApiError::Forbidden("ไม่มีสิทธิ์แก้ไขรายการนี้".to_string()),
      E::Store(source) => ApiError::Store { action, message, source },
    }
  }
}

/// Message for an unknown feedback id.
pub const NOT_FOUND_ITEM: &str = "ไม่พบรายการนี้";

fn invalid_message(invalid: &Invalid) -> String {
  match invalid {
    Invalid::MissingRegistrationFields => "ต้องส่ง lineUserId, fullName, role".to_string(),
    Invalid::UnknownRole(_) => "ตำแหน่ง (role) ไม่ถูกต้อง".to_string(),
    Invalid::GroupNumberOutOfRange { max } => format!("กลุ่มต้องเป็นเลข 1-{max}"),
    Invalid::MissingConstituency => "ต้องส่ง provinceId และ districtId".to_string(),
    Invalid::MissingProvince => "ต้องส่ง province".to_string(),
    Invalid::MissingLineUserId => "ต้องส่ง lineUserId (กรุณาเข้าสู่ระบบด้วย LINE)".to_string(),
    Invalid::MissingPhase1 => "ต้องส่ง phase1".to_string(),
    Invalid::MissingPatchKeys => "ต้องส่ง id และ lineUserId".to_string(),
    Invalid::EmptyPatch => "ต้องส่ง phase1 หรือ phase2 เพื่ออัปเดต".to_string(),
    Invalid::GroupFilter(raw) => format!("groupNumber ไม่ถูกต้อง: {raw}"),
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    tracing::debug!(%rejection, "rejected request body");
    ApiError::BadRequest("รูปแบบข้อมูลไม่ถูกต้อง".to_string())
  }
}

impl From<Invalid> for ApiError {
  fn from(invalid: Invalid) -> Self { ApiError::BadRequest(invalid_message(&invalid)) }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self {
    tracing::debug!(%rejection, "rejected query string");
    ApiError::BadRequest("รูปแบบพารามิเตอร์ไม่ถูกต้อง".to_string())
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match self {
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
      ApiError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
      ApiError::Misconfigured(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
      ApiError::Store { action, message, source } => {
        tracing::error!(error = %source, "store failure while {action}");
        (StatusCode::INTERNAL_SERVER_ERROR, message.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
