// brandforge: Object-store backends underneath the asset store

use super::StoredAsset;
use crate::error::{BrandError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Minimal key-addressed record store. `id` is the primary key.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Insert a new record. Fails with `AssetExists` if the id is taken.
    async fn insert(&self, record: StoredAsset) -> Result<()>;
    /// All records in insertion order.
    async fn scan(&self) -> Result<Vec<StoredAsset>>;
    /// Remove a record. Missing ids are not an error.
    async fn delete_by_key(&self, id: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryObjectStore {
    records: Mutex<Vec<StoredAsset>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn insert(&self, record: StoredAsset) -> Result<()> {
        let mut records = self.records.lock().await;
        if records.iter().any(|r| r.id == record.id) {
            return Err(BrandError::AssetExists(record.id));
        }
        records.push(record);
        Ok(())
    }

    async fn scan(&self) -> Result<Vec<StoredAsset>> {
        Ok(self.records.lock().await.clone())
    }

    async fn delete_by_key(&self, id: &str) -> Result<()> {
        self.records.lock().await.retain(|r| r.id != id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JSON file
// ---------------------------------------------------------------------------

/// Stores every asset in one JSON array file.
///
/// The file is read on first use and kept in memory afterwards. Writes go
/// through a temp file and a rename. A file that exists but cannot be read
/// or parsed makes the store unavailable; it is never overwritten.
pub struct JsonFileObjectStore {
    path: PathBuf,
    cache: Mutex<Option<Vec<StoredAsset>>>,
}

impl JsonFileObjectStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<StoredAsset>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(Vec::new()),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                tracing::error!(path = %self.path.display(), "Asset store is corrupt: {}", e);
                BrandError::storage(format!("corrupt asset store {}: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(BrandError::storage(format!(
                "cannot read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn persist(&self, records: &[StoredAsset]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(BrandError::storage)?;
        }
        let content = serde_json::to_string_pretty(records).map_err(BrandError::storage)?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &content)
            .await
            .map_err(BrandError::storage)?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(BrandError::storage)?;
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for JsonFileObjectStore {
    async fn insert(&self, record: StoredAsset) -> Result<()> {
        let mut cache = self.cache.lock().await;
        if cache.is_none() {
            *cache = Some(self.load().await?);
        }
        let records = cache.get_or_insert_with(Vec::new);
        if records.iter().any(|r| r.id == record.id) {
            return Err(BrandError::AssetExists(record.id));
        }

        let mut next = records.clone();
        next.push(record);
        self.persist(&next).await?;
        *records = next;
        Ok(())
    }

    async fn scan(&self) -> Result<Vec<StoredAsset>> {
        let mut cache = self.cache.lock().await;
        if let Some(records) = cache.as_ref() {
            return Ok(records.clone());
        }
        let records = self.load().await?;
        *cache = Some(records.clone());
        Ok(records)
    }

    async fn delete_by_key(&self, id: &str) -> Result<()> {
        let mut cache = self.cache.lock().await;
        if cache.is_none() {
            *cache = Some(self.load().await?);
        }
        let records = cache.get_or_insert_with(Vec::new);
        if !records.iter().any(|r| r.id == id) {
            return Ok(());
        }

        let next: Vec<StoredAsset> = records.iter().filter(|r| r.id != id).cloned().collect();
        self.persist(&next).await?;
        *records = next;
        Ok(())
    }
}
