//! [`RedisStore`]: a [`DocumentStore`] over Redis string keys.

use redis::{
  AsyncCommands as _, Client,
  aio::{ConnectionManager, ConnectionManagerConfig},
};
use rubfang_core::store::{Collection, DocumentStore, Record};

use crate::{Error, Result};

pub const DEFAULT_KEY_PREFIX: &str = "rubfang";

/// Key holding `collection` under `prefix`.
fn collection_key(prefix: &str, collection: Collection) -> String {
  format!("{prefix}:{}", collection.name())
}

/// A survey store backed by Redis.
///
/// Cloning is cheap; the connection manager is shared and reconnects on
/// its own.
#[derive(Clone)]
pub struct RedisStore {
  conn:   ConnectionManager,
  prefix: String,
}

impl RedisStore {
  /// Connect to `url`. Keys are namespaced under `prefix`.
  pub async fn connect(url: &str, prefix: impl Into<String>) -> Result<Self> {
    let config = ConnectionManagerConfig::new().set_number_of_retries(3);

    let client = Client::open(url)?;
    let conn = client.get_connection_manager_with_config(config).await?;
    let prefix = prefix.into();
    tracing::debug!(%prefix, "connected to redis");
    Ok(Self { conn, prefix })
  }

  fn key(&self, collection: Collection) -> String {
    collection_key(&self.prefix, collection)
  }
}

impl DocumentStore for RedisStore {
  type Error = Error;

  async fn get<R: Record>(&self) -> Result<Vec<R>> {
    let key = self.key(R::COLLECTION);
    let mut conn = self.conn.clone();
    let raw: Option<String> = conn.get(&key).await?;
    match raw {
      Some(raw) => serde_json::from_str(&raw).map_err(|source| Error::Json { key, source }),
      None => Ok(Vec::new()),
    }
  }

  async fn put<R: Record>(&self, records: Vec<R>) -> Result<()> {
    let key = self.key(R::COLLECTION);
    let body = serde_json::to_string(&records)
      .map_err(|source| Error::Json { key: key.clone(), source })?;
    let mut conn = self.conn.clone();
    conn.set::<_, _, ()>(&key, body).await?;
    tracing::trace!(%key, count = records.len(), "collection written");
    Ok(())
  }
}
