//! [`MemoryStore`]: a process-local [`DocumentStore`].
//!
//! Collections are kept as serialised JSON so reads hand out fresh copies,
//! exactly like the persistent backends. Nothing survives a restart.

use std::{
  collections::HashMap,
  sync::{Mutex, PoisonError},
};

use crate::store::{Collection, DocumentStore, Record};

#[derive(Debug, Default)]
pub struct MemoryStore {
  collections: Mutex<HashMap<Collection, serde_json::Value>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }
}

impl DocumentStore for MemoryStore {
  type Error = serde_json::Error;

  async fn get<R: Record>(&self) -> Result<Vec<R>, Self::Error> {
    let stored = self
      .collections
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .get(&R::COLLECTION)
      .cloned();
    match stored {
      Some(value) => serde_json::from_value(value),
      None => Ok(Vec::new()),
    }
  }

  async fn put<R: Record>(&self, records: Vec<R>) -> Result<(), Self::Error> {
    let value = serde_json::to_value(records)?;
    self
      .collections
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(R::COLLECTION, value);
    Ok(())
  }
}
