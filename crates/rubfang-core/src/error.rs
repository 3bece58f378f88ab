//! Error types for `rubfang-core`.

use thiserror::Error;

/// A submission that cannot be applied as sent. Always the caller's to fix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Invalid {
  #[error("lineUserId, fullName and role are required")]
  MissingRegistrationFields,

  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("groupNumber must be an integer between 1 and {max}")]
  GroupNumberOutOfRange { max: u8 },

  #[error("provinceId and districtId are required for constituency candidates")]
  MissingConstituency,

  #[error("province is required for the provincial team")]
  MissingProvince,

  #[error("lineUserId is required")]
  MissingLineUserId,

  #[error("phase1 must contain at least one answer")]
  MissingPhase1,

  #[error("id and lineUserId are required")]
  MissingPatchKeys,

  #[error("nothing to update: send phase1 or phase2")]
  EmptyPatch,

  #[error("groupNumber filter names no valid group: {0:?}")]
  GroupFilter(String),
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid request: {0}")]
  Invalid(#[from] Invalid),

  #[error("feedback not found: {0}")]
  FeedbackNotFound(String),

  #[error("feedback {id} is not owned by {line_user_id}")]
  NotOwner { id: String, line_user_id: String },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Error::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
