//! The `DocumentStore` trait and the record types it persists.
//!
//! A store holds two collections, each a plain list of JSON documents. The
//! service layer reads a whole collection, changes it in memory and writes
//! it back; backends never see the upsert rules. Backends live in their own
//! crates (`rubfang-store-file`, `rubfang-store-sqlite`,
//! `rubfang-store-redis`) plus the in-process [`crate::memory::MemoryStore`].

use std::future::Future;

use serde::{Serialize, de::DeserializeOwned};

// ─── Collections ─────────────────────────────────────────────────────────────

/// The two collections every backend must provide.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  strum::IntoStaticStr,
  strum::Display,
)]
#[strum(serialize_all = "snake_case")]
pub enum Collection {
  Feedback,
  Registrations,
}

impl Collection {
  /// Stable name used for tables, files and keys.
  pub fn name(self) -> &'static str { self.into() }
}

/// A document type that lives in exactly one [`Collection`].
pub trait Record:
  Serialize + DeserializeOwned + Clone + Send + Sync + 'static
{
  const COLLECTION: Collection;

  /// Primary key of the document within its collection.
  fn key(&self) -> String;

  /// The external identity that owns the document. Unique per collection.
  fn line_user_id(&self) -> &str;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Capability interface over a persistence backend.
///
/// `put` replaces the whole collection. There is no locking across
/// processes: the last write wins.
pub trait DocumentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read every document of `R`'s collection, in stored order. A collection
  /// that was never written reads as empty.
  fn get<R: Record>(
    &self,
  ) -> impl Future<Output = Result<Vec<R>, Self::Error>> + Send + '_;

  /// Replace `R`'s collection with `records`.
  fn put<R: Record>(
    &self,
    records: Vec<R>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
