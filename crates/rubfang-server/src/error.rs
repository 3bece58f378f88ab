//! Error type for assembling the server from configuration.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("configuration error: {0}")]
  Config(#[from] config::ConfigError),

  #[error("invalid CORS origin: {0:?}")]
  InvalidOrigin(String),

  #[error("session_secret cannot be used as an HMAC key")]
  SessionKey,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
