// brandforge: Logo acquisition
//
// File picks, drops and pasted data URLs all reduce to "bytes plus a mime
// type", which is stored and then written into the branding profile.
// Storage falls back in three tiers:
//   1. the asset store (durable reference),
//   2. a client-side download plus a session-only logo,
//   3. an error, with the profile's logo left as it was.

pub mod capability;

use crate::asset::data_url::looks_like_image;
use crate::asset::{decode_data_url, encode_data_url, extension_for_mime, AssetRef};
use crate::branding::{BrandingPatch, BrandingState, ExtractionTicket, LogoPatch};
use crate::error::{BrandError, Result};
use capability::{DownloadSink, LogoSaver};
use std::path::PathBuf;
use std::sync::Arc;

/// Where an acquired logo ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquiredLogo {
    Stored(AssetRef),
    /// The store refused the logo; it lives in memory for this session and
    /// a copy was written to `download`.
    SessionOnly { download: PathBuf },
}

/// One file from a drop event.
#[derive(Debug, Clone)]
pub struct DroppedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

pub struct LogoAcquisition {
    state: Arc<BrandingState>,
    saver: Option<Arc<dyn LogoSaver>>,
    downloads: Option<Arc<dyn DownloadSink>>,
}

impl LogoAcquisition {
    pub fn new(
        state: Arc<BrandingState>,
        saver: Option<Arc<dyn LogoSaver>>,
        downloads: Option<Arc<dyn DownloadSink>>,
    ) -> Self {
        Self {
            state,
            saver,
            downloads,
        }
    }

    /// Store an uploaded image and make it the profile's logo.
    pub async fn acquire_from_file(&self, bytes: &[u8], mime_type: &str) -> Result<AcquiredLogo> {
        if !mime_type.to_ascii_lowercase().starts_with("image/") {
            return Err(BrandError::UnsupportedFileType(mime_type.to_string()));
        }
        if !looks_like_image(bytes, mime_type) {
            return Err(BrandError::UnsupportedFileType(format!(
                "payload is not a decodable {} image",
                mime_type
            )));
        }
        let data_url = encode_data_url(mime_type, bytes);

        let stored = match &self.saver {
            Some(saver) => match saver.save_logo(bytes, mime_type).await {
                Ok(asset) => Some(asset),
                Err(e @ BrandError::UnsupportedFileType(_)) => return Err(e),
                Err(e) => {
                    tracing::warn!("Asset store refused logo, falling back to download: {}", e);
                    None
                }
            },
            None => None,
        };

        if let Some(asset) = stored {
            self.state.update(BrandingPatch::new().logo(LogoPatch::Stored {
                asset: asset.clone(),
                data_url: Some(data_url),
            }));
            return Ok(AcquiredLogo::Stored(asset));
        }

        let Some(downloads) = &self.downloads else {
            return Err(BrandError::storage("no logo storage or download target available"));
        };
        let filename = format!("logo.{}", extension_for_mime(mime_type));
        let download = downloads.offer(bytes, &filename).map_err(|e| {
            tracing::error!("Logo could not be stored or downloaded: {}", e);
            e
        })?;

        self.state
            .update(BrandingPatch::new().logo(LogoPatch::SessionOnly { data_url }));
        Ok(AcquiredLogo::SessionOnly { download })
    }

    /// Pasted `data:image/...;base64,...` content.
    pub async fn acquire_from_data_url(&self, data_url: &str) -> Result<AcquiredLogo> {
        let (mime_type, bytes) = decode_data_url(data_url)
            .ok_or_else(|| BrandError::UnsupportedFileType("not a base64 data URL".into()))?;
        self.acquire_from_file(&bytes, &mime_type).await
    }

    /// The first dropped file that is an image; other files are ignored.
    pub async fn acquire_from_drop(&self, files: &[DroppedFile]) -> Result<AcquiredLogo> {
        let file = files
            .iter()
            .find(|f| f.mime_type.to_ascii_lowercase().starts_with("image/"))
            .ok_or_else(|| {
                let types: Vec<&str> = files.iter().map(|f| f.mime_type.as_str()).collect();
                BrandError::UnsupportedFileType(format!("no image among dropped files {:?}", types))
            })?;
        tracing::debug!(name = %file.name, "Using dropped file as logo");
        self.acquire_from_file(&file.bytes, &file.mime_type).await
    }

    /// Apply a finished extraction. Returns `false` when the result was stale.
    pub fn acquire_from_extraction(&self, ticket: ExtractionTicket, patch: BrandingPatch) -> bool {
        self.state.apply_extraction(ticket, patch)
    }
}

#[cfg(test)]
mod tests {
    use super::capability::DirectoryDownloadSink;
    use super::*;
    use crate::asset::backend::MemoryObjectStore;
    use crate::asset::tests::{UnavailableObjectStore, PNG, SVG};
    use crate::asset::AssetStore;
    use crate::branding::kv::MemoryKvStore;
    use tempfile::TempDir;

    struct BrokenSink;

    impl DownloadSink for BrokenSink {
        fn offer(&self, _bytes: &[u8], _filename: &str) -> Result<PathBuf> {
            Err(BrandError::storage("downloads blocked"))
        }
    }

    fn state() -> Arc<BrandingState> {
        Arc::new(BrandingState::load(Arc::new(MemoryKvStore::new())))
    }

    fn working_store() -> Arc<AssetStore> {
        Arc::new(AssetStore::new(Arc::new(MemoryObjectStore::new()), "brandforge", "brand_logos"))
    }

    fn broken_store() -> Arc<AssetStore> {
        Arc::new(AssetStore::new(Arc::new(UnavailableObjectStore), "brandforge", "brand_logos"))
    }

    #[tokio::test]
    async fn test_file_is_stored_and_referenced() {
        let state = state();
        let store = working_store();
        let acq = LogoAcquisition::new(state.clone(), Some(store.clone()), None);

        let outcome = acq.acquire_from_file(SVG, "image/svg+xml").await.unwrap();
        let AcquiredLogo::Stored(asset) = outcome else {
            panic!("expected stored logo");
        };

        let profile = state.get_current();
        assert_eq!(profile.logo_ref.as_ref(), Some(&asset));
        assert!(profile.logo_data.is_some());
        assert!(store.get(&asset.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_non_image_mime_rejected_without_mutation() {
        let state = state();
        let acq = LogoAcquisition::new(state.clone(), Some(working_store()), None);

        let err = acq.acquire_from_file(b"%PDF-1.7", "application/pdf").await.unwrap_err();
        assert_eq!(err, BrandError::UnsupportedFileType("application/pdf".into()));
        assert!(!state.get_current().has_logo());
    }

    #[tokio::test]
    async fn test_undecodable_image_rejected() {
        let state = state();
        let acq = LogoAcquisition::new(state.clone(), Some(working_store()), None);
        let err = acq.acquire_from_file(b"garbage", "image/png").await.unwrap_err();
        assert!(matches!(err, BrandError::UnsupportedFileType(_)));
        assert!(!state.get_current().has_logo());
    }

    #[tokio::test]
    async fn test_storage_unavailable_falls_back_to_download() {
        let tmp = TempDir::new().unwrap();
        let state = state();
        let sink = Arc::new(DirectoryDownloadSink::new(tmp.path()));
        let acq = LogoAcquisition::new(state.clone(), Some(broken_store()), Some(sink));

        let outcome = acq.acquire_from_file(PNG, "image/png").await.unwrap();
        let AcquiredLogo::SessionOnly { download } = outcome else {
            panic!("expected session-only logo");
        };
        assert_eq!(std::fs::read(&download).unwrap(), PNG);
        assert_eq!(download.file_name().unwrap(), "logo.png");

        let profile = state.get_current();
        assert!(profile.logo_ref.is_none());
        assert!(profile.logo_data.unwrap().starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn test_every_tier_failing_leaves_logo_unset() {
        let state = state();
        let acq = LogoAcquisition::new(state.clone(), Some(broken_store()), Some(Arc::new(BrokenSink)));

        let err = acq.acquire_from_file(PNG, "image/png").await.unwrap_err();
        assert!(err.is_storage());
        assert!(!state.get_current().has_logo());
    }

    #[tokio::test]
    async fn test_missing_saver_uses_download_tier() {
        let tmp = TempDir::new().unwrap();
        let state = state();
        let acq = LogoAcquisition::new(
            state.clone(),
            None,
            Some(Arc::new(DirectoryDownloadSink::new(tmp.path()))),
        );
        let outcome = acq.acquire_from_file(SVG, "image/svg+xml").await.unwrap();
        assert!(matches!(outcome, AcquiredLogo::SessionOnly { .. }));
    }

    #[tokio::test]
    async fn test_data_url_paste() {
        let state = state();
        let acq = LogoAcquisition::new(state.clone(), Some(working_store()), None);

        let pasted = encode_data_url("image/png", PNG);
        let outcome = acq.acquire_from_data_url(&pasted).await.unwrap();
        assert!(matches!(outcome, AcquiredLogo::Stored(_)));

        let err = acq.acquire_from_data_url("https://example.com/logo.png").await.unwrap_err();
        assert!(matches!(err, BrandError::UnsupportedFileType(_)));
    }

    #[tokio::test]
    async fn test_drop_picks_first_image() {
        let state = state();
        let acq = LogoAcquisition::new(state.clone(), Some(working_store()), None);

        let files = vec![
            DroppedFile {
                name: "notes.txt".into(),
                mime_type: "text/plain".into(),
                bytes: b"hello".to_vec(),
            },
            DroppedFile {
                name: "logo.svg".into(),
                mime_type: "image/svg+xml".into(),
                bytes: SVG.to_vec(),
            },
        ];
        let AcquiredLogo::Stored(asset) = acq.acquire_from_drop(&files).await.unwrap() else {
            panic!("expected stored logo");
        };
        assert_eq!(asset.mime_type, "image/svg+xml");

        let err = acq.acquire_from_drop(&files[..1]).await.unwrap_err();
        assert!(matches!(err, BrandError::UnsupportedFileType(_)));
    }
}
