//! Whole-document JSON stores.
//!
//! Load-all / append-in-memory / overwrite-on-save. Not transactional;
//! the last writer wins across processes. Within one process, writes to a
//! [`JsonDocumentStore`] are serialized by a lock.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tokio::sync::{Mutex, RwLock};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("Failed to serialize records: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Ordered collection of records persisted as one document.
#[async_trait]
pub trait DocumentStore<T>: Send + Sync
where
    T: Send + Sync + 'static,
{
    /// Every record, in insertion order. A missing document is empty.
    async fn load(&self) -> Result<Vec<T>, StoreError>;

    /// Replace the whole document.
    async fn save_whole(&self, records: &[T]) -> Result<(), StoreError>;

    /// Append one record.
    async fn append(&self, record: T) -> Result<(), StoreError> {
        let mut records = self.load().await?;
        records.push(record);
        self.save_whole(&records).await
    }
}

/// JSON array in a file.
pub struct JsonDocumentStore<T> {
    path: PathBuf,
    persist_lock: Arc<Mutex<()>>,
    _records: PhantomData<fn() -> T>,
}

impl<T> Clone for JsonDocumentStore<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            persist_lock: Arc::clone(&self.persist_lock),
            _records: PhantomData,
        }
    }
}

impl<T> JsonDocumentStore<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            persist_lock: Arc::new(Mutex::new(())),
            _records: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<T>, StoreError> {
        Ok(read_document(&self.path).await?.unwrap_or_default())
    }

    async fn write_all(&self, records: &[T]) -> Result<(), StoreError> {
        write_document(&self.path, records).await
    }
}

/// Parse the JSON document at `path`. Missing or blank files are `None`.
pub(super) async fn read_document<V>(path: &Path) -> Result<Option<V>, StoreError>
where
    V: DeserializeOwned,
{
    match fs::read(path).await {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(None),
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Parse {
                path: path.display().to_string(),
                source,
            }),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StoreError::Read {
            path: path.display().to_string(),
            source,
        }),
    }
}

/// Write `value` next to `path` and rename it into place.
pub(super) async fn write_document<V>(path: &Path, value: &V) -> Result<(), StoreError>
where
    V: Serialize + ?Sized,
{
    let write_err = |source| StoreError::Write {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(write_err)?;
    }
    let data = serde_json::to_vec_pretty(value)?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, data).await.map_err(write_err)?;
    fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}

#[async_trait]
impl<T> DocumentStore<T> for JsonDocumentStore<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn load(&self) -> Result<Vec<T>, StoreError> {
        self.read_all().await
    }

    async fn save_whole(&self, records: &[T]) -> Result<(), StoreError> {
        let _guard = self.persist_lock.lock().await;
        self.write_all(records).await
    }

    async fn append(&self, record: T) -> Result<(), StoreError> {
        let _guard = self.persist_lock.lock().await;
        let mut records = self.read_all().await?;
        records.push(record);
        self.write_all(&records).await
    }
}

/// In-process store with the same semantics, for tests and dry runs.
pub struct InMemoryStore<T> {
    records: RwLock<Vec<T>>,
}

impl<T> InMemoryStore<T> {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    pub fn with_records(records: Vec<T>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }
}

impl<T> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T> DocumentStore<T> for InMemoryStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn load(&self) -> Result<Vec<T>, StoreError> {
        Ok(self.records.read().await.clone())
    }

    async fn save_whole(&self, records: &[T]) -> Result<(), StoreError> {
        *self.records.write().await = records.to_vec();
        Ok(())
    }

    async fn append(&self, record: T) -> Result<(), StoreError> {
        self.records.write().await.push(record);
        Ok(())
    }
}
