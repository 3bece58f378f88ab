//! [`SqliteStore`]: the SQLite implementation of [`DocumentStore`].

use std::path::Path;

use rubfang_core::store::{DocumentStore, Record};

use crate::{
  Result,
  encode::{decode_bodies, encode_rows},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A survey store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store; useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for SqliteStore {
  type Error = crate::Error;

  async fn get<R: Record>(&self) -> Result<Vec<R>> {
    let sql = format!("SELECT body FROM {} ORDER BY position", R::COLLECTION.name());

    let bodies: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;

    decode_bodies(bodies)
  }

  async fn put<R: Record>(&self, records: Vec<R>) -> Result<()> {
    let table = R::COLLECTION.name();
    let rows = encode_rows(&records)?;
    let count = rows.len();
    let delete = format!("DELETE FROM {table}");
    let insert = format!(
      "INSERT INTO {table} (record_key, line_user_id, position, body)
       VALUES (?1, ?2, ?3, ?4)"
    );

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(&delete, [])?;
        {
          let mut stmt = tx.prepare(&insert)?;
          for row in &rows {
            stmt.execute(rusqlite::params![
              row.record_key,
              row.line_user_id,
              row.position,
              row.body,
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::trace!(collection = table, count, "collection replaced");
    Ok(())
  }
}
