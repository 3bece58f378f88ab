//! rubfang-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) plus
//! `RUBFANG_*` environment variables, opens the configured store, and serves
//! the survey API over HTTP.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for `dashboard_password_hash`:
//!
//! ```text
//! cargo run -p rubfang-server -- --hash-password
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use rand_core::OsRng;
use rubfang_core::{memory::MemoryStore, store::DocumentStore};
use rubfang_server::{BackendConfig, ServerConfig};
use rubfang_store_file::FileStore;
use rubfang_store_redis::RedisStore;
use rubfang_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Rubfang survey server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_password {
    let password = read_password()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  let config = ServerConfig::load(&cli.config).context("failed to load configuration")?;

  match config.backend.clone() {
    BackendConfig::Memory => {
      tracing::warn!("using the in-memory backend; data is lost on restart");
      serve(MemoryStore::new(), &config).await
    }
    BackendConfig::File { data_dir } => {
      tracing::info!(data_dir = %data_dir.display(), "using the JSON file backend");
      let store = FileStore::open(&data_dir)
        .await
        .with_context(|| format!("failed to open data directory {data_dir:?}"))?;
      serve(store, &config).await
    }
    BackendConfig::Sqlite { path } => {
      tracing::info!(path = %path.display(), "using the SQLite backend");
      let store = SqliteStore::open(&path)
        .await
        .with_context(|| format!("failed to open store at {path:?}"))?;
      serve(store, &config).await
    }
    BackendConfig::Redis { url, key_prefix } => {
      tracing::info!(%key_prefix, "using the Redis backend");
      let store = RedisStore::connect(&url, key_prefix)
        .await
        .context("failed to connect to redis")?;
      serve(store, &config).await
    }
  }
}

async fn serve<S>(store: S, config: &ServerConfig) -> anyhow::Result<()>
where
  S: DocumentStore + 'static,
{
  let state = rubfang_server::app_state(store, config).context("invalid dashboard settings")?;
  let app = rubfang_server::app(state, config).context("invalid CORS settings")?;
  let address = config.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  tracing::info!("server stopped");
  Ok(())
}

async fn shutdown_signal() {
  match tokio::signal::ctrl_c().await {
    Ok(()) => tracing::info!("received Ctrl+C, shutting down"),
    Err(e) => {
      tracing::error!(error = %e, "failed to listen for Ctrl+C");
      std::future::pending::<()>().await;
    }
  }
}

/// Read a password line from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}
