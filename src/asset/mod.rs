// brandforge: Asset store for logo images
//
// Logos are kept as data URLs in a small embedded object store. Records are
// immutable once written; lookups by virtual path are a linear scan since a
// user only ever accumulates a handful of logos.

pub mod backend;
pub mod data_url;

use crate::error::{BrandError, Result};
use backend::ObjectStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use data_url::{decode_data_url, encode_data_url, extension_for_mime, mime_for_path};

/// Logical pointer to a stored logo. This is what the branding profile keeps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    pub id: String,
    pub virtual_path: String,
    pub mime_type: String,
    pub filename: String,
    pub created_at: DateTime<Utc>,
}

/// A logo record as held by the object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAsset {
    pub id: String,
    pub virtual_path: String,
    pub data_url: String,
    pub mime_type: String,
    pub filename: String,
    pub created_at: DateTime<Utc>,
}

impl StoredAsset {
    pub fn asset_ref(&self) -> AssetRef {
        AssetRef {
            id: self.id.clone(),
            virtual_path: self.virtual_path.clone(),
            mime_type: self.mime_type.clone(),
            filename: self.filename.clone(),
            created_at: self.created_at,
        }
    }

    /// The raw image bytes, or `None` if the record holds a malformed data URL.
    pub fn decode(&self) -> Option<Vec<u8>> {
        decode_data_url(&self.data_url).map(|(_, bytes)| bytes)
    }
}

pub struct AssetStore {
    backend: Arc<dyn ObjectStore>,
    namespace: String,
    subpath: String,
}

impl AssetStore {
    pub fn new(
        backend: Arc<dyn ObjectStore>,
        namespace: impl Into<String>,
        subpath: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            namespace: namespace.into(),
            subpath: subpath.into(),
        }
    }

    /// Store a logo and return a reference to it.
    ///
    /// When no path is suggested the asset lands at
    /// `/{namespace}/{subpath}/logo_<millis>.{ext}`.
    pub async fn put(
        &self,
        payload: &[u8],
        mime_type: &str,
        suggested_path: Option<&str>,
    ) -> Result<AssetRef> {
        if !data_url::looks_like_image(payload, mime_type) {
            return Err(BrandError::UnsupportedFileType(format!(
                "payload is not a decodable {} image",
                mime_type
            )));
        }

        let created_at = Utc::now();
        let millis = created_at.timestamp_millis();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let id = format!("logo_{}_{}", millis, &suffix[..8]);
        let ext = extension_for_mime(mime_type);

        let (virtual_path, filename) = match suggested_path.filter(|p| !p.trim().is_empty()) {
            Some(path) => {
                let filename = path
                    .rsplit('/')
                    .next()
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("logo.{}", ext));
                (path.to_string(), filename)
            }
            None => {
                let filename = format!("logo_{}.{}", millis, ext);
                (self.virtual_path_for(&filename), filename)
            }
        };

        let record = StoredAsset {
            id,
            virtual_path,
            data_url: encode_data_url(mime_type, payload),
            mime_type: mime_type.to_string(),
            filename,
            created_at,
        };
        let asset_ref = record.asset_ref();
        self.backend.insert(record).await?;

        tracing::info!(
            asset_id = %asset_ref.id,
            path = %asset_ref.virtual_path,
            bytes = payload.len(),
            "Logo stored"
        );
        Ok(asset_ref)
    }

    /// First record whose virtual path matches exactly.
    pub async fn get_by_path(&self, virtual_path: &str) -> Result<Option<StoredAsset>> {
        let records = self.backend.scan().await?;
        Ok(records.into_iter().find(|r| r.virtual_path == virtual_path))
    }

    pub async fn get(&self, id: &str) -> Result<Option<StoredAsset>> {
        let records = self.backend.scan().await?;
        Ok(records.into_iter().find(|r| r.id == id))
    }

    /// All assets, most recent first. Equal timestamps list the later insert first.
    pub async fn list_all(&self) -> Result<Vec<StoredAsset>> {
        let mut records = self.backend.scan().await?;
        records.reverse();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.backend.delete_by_key(id).await?;
        tracing::debug!(asset_id = %id, "Logo deleted");
        Ok(())
    }

    fn virtual_path_for(&self, filename: &str) -> String {
        format!(
            "/{}/{}/{}",
            self.namespace.trim_matches('/'),
            self.subpath.trim_matches('/'),
            filename
        )
    }
}
