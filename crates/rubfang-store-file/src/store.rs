//! [`FileStore`]: a [`DocumentStore`] over one JSON file per collection.

use std::{
  io::ErrorKind,
  path::{Path, PathBuf},
};

use rubfang_core::store::{Collection, DocumentStore, Record};

use crate::{Error, Result};

/// A survey store that keeps each collection in `<data_dir>/<name>.json`.
///
/// Writes go to a sibling `.tmp` file which is then renamed over the
/// collection file, so a crash never leaves a half-written collection.
#[derive(Debug, Clone)]
pub struct FileStore {
  data_dir: PathBuf,
}

impl FileStore {
  /// Use `data_dir`, creating it if it does not exist.
  pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
    let data_dir = data_dir.into();
    tokio::fs::create_dir_all(&data_dir)
      .await
      .map_err(|source| Error::Io { path: data_dir.clone(), source })?;
    Ok(Self { data_dir })
  }

  pub fn data_dir(&self) -> &Path { &self.data_dir }

  fn path_for(&self, collection: Collection) -> PathBuf {
    self.data_dir.join(format!("{}.json", collection.name()))
  }
}

impl DocumentStore for FileStore {
  type Error = Error;

  async fn get<R: Record>(&self) -> Result<Vec<R>> {
    let path = self.path_for(R::COLLECTION);
    let raw = match tokio::fs::read(&path).await {
      Ok(raw) => raw,
      Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
      Err(source) => return Err(Error::Io { path, source }),
    };
    serde_json::from_slice(&raw).map_err(|source| Error::Json { path, source })
  }

  async fn put<R: Record>(&self, records: Vec<R>) -> Result<()> {
    let path = self.path_for(R::COLLECTION);
    let body = serde_json::to_vec_pretty(&records)
      .map_err(|source| Error::Json { path: path.clone(), source })?;

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, &body)
      .await
      .map_err(|source| Error::Io { path: tmp_path.clone(), source })?;
    if let Err(source) = tokio::fs::rename(&tmp_path, &path).await {
      let _ = tokio::fs::remove_file(&tmp_path).await;
      return Err(Error::Io { path, source });
    }

    tracing::trace!(path = %path.display(), count = records.len(), "collection written");
    Ok(())
  }
}
