//! Runtime configuration: an optional TOML file layered with `RUBFANG_*`
//! environment variables.
//!
//! Nested keys use `__` in the environment, e.g.
//! `RUBFANG_BACKEND__KIND=sqlite RUBFANG_BACKEND__PATH=/var/lib/rubfang.db`.
//! `RUBFANG_CORS_ORIGINS` is a comma-separated list.

use std::path::{Path, PathBuf};

use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use rubfang_core::SurveyRules;
use serde::Deserialize;

use crate::Result;

// ─── Server ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                    String,
  pub port:                    u16,
  pub backend:                 BackendConfig,
  /// Allowed browser origins. Empty mirrors whatever origin asks.
  pub cors_origins:            Vec<String>,
  pub max_group_number:        u8,
  /// LINE login channel id handed to the browser.
  pub line_client_id:          Option<String>,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub dashboard_password_hash: Option<String>,
  /// HMAC key for dashboard sessions. Random per process when unset.
  pub session_secret:          Option<String>,
  pub secure_cookies:          bool,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                    "0.0.0.0".to_string(),
      port:                    3000,
      backend:                 BackendConfig::default(),
      cors_origins:            Vec::new(),
      max_group_number:        SurveyRules::default().max_group_number,
      line_client_id:          None,
      dashboard_password_hash: None,
      session_secret:          None,
      secure_cookies:          false,
    }
  }
}

impl ServerConfig {
  /// Read `path` (if it exists) and the environment.
  pub fn load(path: &Path) -> Result<Self> {
    Self::from_builder(
      Config::builder()
        .add_source(File::from(path).required(false))
        .add_source(
          Environment::with_prefix("RUBFANG")
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("cors_origins")
            .try_parsing(true),
        ),
    )
  }

  fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
    let mut config: Self = builder.build()?.try_deserialize()?;
    config.backend = config.backend.expand_paths();
    Ok(config)
  }

  pub fn rules(&self) -> SurveyRules {
    SurveyRules { max_group_number: self.max_group_number }
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Backend ─────────────────────────────────────────────────────────────────

/// Which [`rubfang_core::store::DocumentStore`] to open at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
  /// Process-local; everything is lost on restart.
  Memory,
  File {
    data_dir: PathBuf,
  },
  Sqlite {
    path: PathBuf,
  },
  Redis {
    url:        String,
    #[serde(default = "default_key_prefix")]
    key_prefix: String,
  },
}

fn default_key_prefix() -> String { rubfang_store_redis::DEFAULT_KEY_PREFIX.to_string() }

impl Default for BackendConfig {
  fn default() -> Self { BackendConfig::File { data_dir: PathBuf::from("data") } }
}

impl BackendConfig {
  fn expand_paths(self) -> Self {
    match self {
      BackendConfig::File { data_dir } => BackendConfig::File { data_dir: expand_tilde(&data_dir) },
      BackendConfig::Sqlite { path } => BackendConfig::Sqlite { path: expand_tilde(&path) },
      other => other,
    }
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
