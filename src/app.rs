// brandforge: Application context wiring the branding components together
//
// One `BrandingApp` per running process. Every component receives its
// collaborators explicitly; nothing here is global.

use crate::acquire::capability::{DirectoryDownloadSink, DownloadSink, LogoSaver};
use crate::acquire::{AcquiredLogo, DroppedFile, LogoAcquisition};
use crate::asset::backend::{JsonFileObjectStore, ObjectStore};
use crate::asset::{AssetStore, StoredAsset};
use crate::branding::kv::{FileKvStore, KeyValueStore};
use crate::branding::{BrandingPatch, BrandingProfile, BrandingState};
use crate::color::Color;
use crate::config::{Config, StorageConfig};
use crate::error::{BrandError, Result};
use crate::extract::relay::{BrandSource, HttpBrandRelay};
use crate::extract::RemoteBrandExtractor;
use crate::prompt::{build_system_prompt, DEFAULT_BASE_PROMPT};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Values typed into the manual brand form. Blank fields keep their
/// current value.
#[derive(Debug, Clone, Default)]
pub struct ManualBrandForm {
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub accent_color: Option<String>,
    pub font_family: Option<String>,
    pub logo: Option<LogoUpload>,
}

#[derive(Debug, Clone)]
pub struct LogoUpload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Result of a manual form submission. The colors and font always apply;
/// the logo may have failed independently.
#[derive(Debug)]
pub struct ManualOutcome {
    pub profile: BrandingProfile,
    pub logo: Option<Result<AcquiredLogo>>,
}

pub struct BrandingApp {
    state: Arc<BrandingState>,
    assets: Arc<AssetStore>,
    extractor: RemoteBrandExtractor,
    acquisition: LogoAcquisition,
}

impl BrandingApp {
    /// Build the file-backed application described by `config`.
    pub async fn open(config: &Config) -> anyhow::Result<Self> {
        config.validate()?;

        let data_dir = config.data_path()?;
        std::fs::create_dir_all(&data_dir)?;

        let kv = FileKvStore::new(config.kv_path()?);
        let objects = JsonFileObjectStore::new(config.assets_path()?);
        let relay = HttpBrandRelay::new(
            config.extractor.relay_url.clone(),
            Duration::from_secs(config.extractor.timeout_secs),
            &config.extractor.user_agent,
        )?;
        let downloads = DirectoryDownloadSink::new(config.downloads_path()?);

        tracing::debug!(
            profile = %kv.path().display(),
            assets = %objects.path().display(),
            downloads = %downloads.dir().display(),
            relay = %relay.endpoint(),
            "Opening branding app"
        );
        Ok(Self::with_parts(
            Arc::new(kv),
            Arc::new(objects),
            Arc::new(relay),
            Some(Arc::new(downloads)),
            &config.storage,
        )
        .await)
    }

    /// Assemble the application from explicit collaborators, then resolve a
    /// stored logo reference into session bytes.
    pub async fn with_parts(
        kv: Arc<dyn KeyValueStore>,
        objects: Arc<dyn ObjectStore>,
        source: Arc<dyn BrandSource>,
        downloads: Option<Arc<dyn DownloadSink>>,
        storage: &StorageConfig,
    ) -> Self {
        let state = Arc::new(BrandingState::load(kv));
        let assets = Arc::new(AssetStore::new(
            objects,
            storage.namespace.clone(),
            storage.subpath.clone(),
        ));
        let saver: Arc<dyn LogoSaver> = assets.clone();

        let extractor = RemoteBrandExtractor::new(source, Some(saver.clone()));
        let acquisition = LogoAcquisition::new(state.clone(), Some(saver), downloads);

        state.resolve_logo(&assets).await;

        Self {
            state,
            assets,
            extractor,
            acquisition,
        }
    }

    pub fn current(&self) -> BrandingProfile {
        self.state.get_current()
    }

    pub fn subscribe(&self) -> watch::Receiver<BrandingProfile> {
        self.state.subscribe()
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    /// Extract a brand from `url` and apply it.
    ///
    /// Returns `Ok(None)` when the result arrived after a newer extraction
    /// started or branding was turned off; the profile is then untouched.
    pub async fn extract<F>(&self, url: &str, on_progress: F) -> Result<Option<BrandingProfile>>
    where
        F: FnMut(&str) + Send,
    {
        let ticket = self.state.begin_extraction();
        let patch = self.extractor.fetch_brand_info(url, on_progress).await?;
        if self.acquisition.acquire_from_extraction(ticket, patch) {
            Ok(Some(self.state.get_current()))
        } else {
            Ok(None)
        }
    }

    /// Apply the manual brand form and turn custom branding on.
    ///
    /// Colors and the logo type are checked before anything changes. A logo
    /// that cannot be stored degrades through the acquisition fallback and
    /// does not block the rest of the form.
    pub async fn submit_manual(&self, form: &ManualBrandForm) -> Result<ManualOutcome> {
        let parse = |value: &Option<String>| -> Result<Option<Color>> {
            match value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                Some(v) => Color::parse(v).map(Some),
                None => Ok(None),
            }
        };
        let primary = parse(&form.primary_color)?;
        let secondary = parse(&form.secondary_color)?;
        let accent = parse(&form.accent_color)?;

        let logo = match &form.logo {
            Some(upload) => match self
                .acquisition
                .acquire_from_file(&upload.bytes, &upload.mime_type)
                .await
            {
                Err(e @ BrandError::UnsupportedFileType(_)) => return Err(e),
                Err(e) => {
                    tracing::warn!("Manual logo not saved: {}", e);
                    Some(Err(e))
                }
                Ok(acquired) => Some(Ok(acquired)),
            },
            None => None,
        };

        let patch = BrandingPatch {
            primary_color: primary,
            secondary_color: secondary,
            accent_color: accent,
            font_family: form
                .font_family
                .as_deref()
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string),
            is_custom_branding_enabled: Some(true),
            ..Default::default()
        };
        let profile = self.state.update(patch);
        Ok(ManualOutcome { profile, logo })
    }

    pub fn set_enabled(&self, enabled: bool) -> BrandingProfile {
        self.state.update(BrandingPatch::new().enabled(enabled))
    }

    pub fn reset(&self) -> BrandingProfile {
        self.state.reset()
    }

    pub async fn upload_logo(&self, bytes: &[u8], mime_type: &str) -> Result<AcquiredLogo> {
        self.acquisition.acquire_from_file(bytes, mime_type).await
    }

    pub async fn paste_logo(&self, data_url: &str) -> Result<AcquiredLogo> {
        self.acquisition.acquire_from_data_url(data_url).await
    }

    pub async fn drop_logo(&self, files: &[DroppedFile]) -> Result<AcquiredLogo> {
        self.acquisition.acquire_from_drop(files).await
    }

    pub async fn list_logos(&self) -> Result<Vec<StoredAsset>> {
        self.assets.list_all().await
    }

    /// Deleting the logo the profile points at leaves a dangling reference,
    /// which renders as "no logo".
    pub async fn delete_logo(&self, id: &str) -> Result<()> {
        self.assets.delete(id).await
    }

    /// System prompt for the next chat turn.
    pub async fn system_prompt(&self, base: &str) -> String {
        let mut profile = self.state.get_current();

        if let Some(logo) = &profile.logo_ref {
            let present = match self.assets.get(&logo.id).await {
                Ok(found) => found.is_some(),
                Err(e) => {
                    tracing::warn!(asset_id = %logo.id, "Could not verify brand logo: {}", e);
                    false
                }
            };
            if !present {
                tracing::debug!(asset_id = %logo.id, "Brand logo reference is dangling, rendering without it");
                profile.logo_ref = None;
            }
        }

        build_system_prompt(base, &profile)
    }
}

/// Base prompt from the configured file, or the built-in one.
pub fn load_base_prompt(config: &Config) -> anyhow::Result<String> {
    match config.base_prompt_path()? {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => Ok(DEFAULT_BASE_PROMPT.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::backend::MemoryObjectStore;
    use crate::asset::tests::{UnavailableObjectStore, SVG};
    use crate::branding::kv::MemoryKvStore;
    use crate::extract::types::{BrandColor, BrandData, FetchedAsset};
    use crate::prompt::{EXISTING_LOGO_MARKER, SYNTHESIZE_LOGO_MARKER};
    use async_trait::async_trait;
    use tempfile::TempDir;
    use tokio::sync::Notify;

    struct StaticSource(Result<BrandData>);

    #[async_trait]
    impl BrandSource for StaticSource {
        async fn lookup(&self, _domain: &str) -> Result<BrandData> {
            self.0.clone()
        }
        async fn fetch_asset(&self, url: &str) -> Result<FetchedAsset> {
            Err(BrandError::ExtractionFailed(format!("offline: {}", url)))
        }
    }

    /// Holds the relay answer until the gate opens.
    struct GatedSource {
        gate: Arc<Notify>,
        data: BrandData,
    }

    #[async_trait]
    impl BrandSource for GatedSource {
        async fn lookup(&self, _domain: &str) -> Result<BrandData> {
            self.gate.notified().await;
            Ok(self.data.clone())
        }
        async fn fetch_asset(&self, url: &str) -> Result<FetchedAsset> {
            Err(BrandError::ExtractionFailed(format!("offline: {}", url)))
        }
    }

    async fn app_with(source: Result<BrandData>) -> BrandingApp {
        app_with_source(Arc::new(StaticSource(source))).await
    }

    async fn app_with_source(source: Arc<dyn BrandSource>) -> BrandingApp {
        crate::logger::init_test();
        BrandingApp::with_parts(
            Arc::new(MemoryKvStore::new()),
            Arc::new(MemoryObjectStore::new()),
            source,
            None,
            &StorageConfig::default(),
        )
        .await
    }

    fn one_color_brand() -> BrandData {
        BrandData {
            colors: Some(vec![BrandColor {
                hex: Some("#0057FF".into()),
                kind: Some("primary".into()),
                brightness: Some(80.0),
            }]),
            ..Default::default()
        }
    }

    fn form(primary: &str, secondary: &str, accent: &str, font: &str) -> ManualBrandForm {
        ManualBrandForm {
            primary_color: Some(primary.into()),
            secondary_color: Some(secondary.into()),
            accent_color: Some(accent.into()),
            font_family: Some(font.into()),
            logo: None,
        }
    }

    #[tokio::test]
    async fn test_manual_form_end_to_end() {
        let app = app_with(Err(BrandError::RateLimited)).await;
        app.submit_manual(&form("#AA0000", "#00AA00", "#0000AA", "Poppins"))
            .await
            .unwrap();

        let prompt = app.system_prompt(DEFAULT_BASE_PROMPT).await;
        for needle in ["#AA0000", "#00AA00", "#0000AA", "Poppins", SYNTHESIZE_LOGO_MARKER] {
            assert!(prompt.contains(needle), "missing {}", needle);
        }
        assert!(!prompt.contains(EXISTING_LOGO_MARKER));
    }

    #[tokio::test]
    async fn test_invalid_manual_color_changes_nothing() {
        let app = app_with(Err(BrandError::RateLimited)).await;
        let err = app
            .submit_manual(&form("#AA0000", "green", "#0000AA", "Poppins"))
            .await
            .unwrap_err();
        assert!(matches!(err, BrandError::InvalidColor(_)));
        assert_eq!(app.current(), BrandingProfile::default());
    }

    #[tokio::test]
    async fn test_manual_form_with_logo() {
        let app = app_with(Err(BrandError::RateLimited)).await;
        let mut submission = form("#AA0000", "", "", "");
        submission.logo = Some(LogoUpload {
            bytes: SVG.to_vec(),
            mime_type: "image/svg+xml".into(),
        });

        let outcome = app.submit_manual(&submission).await.unwrap();
        assert!(matches!(outcome.logo, Some(Ok(AcquiredLogo::Stored(_)))));
        assert!(outcome.profile.logo_ref.is_some());
        assert!(outcome.profile.is_custom_branding_enabled);
    }

    #[tokio::test]
    async fn test_manual_form_rejects_non_image_logo_before_mutation() {
        let app = app_with(Err(BrandError::RateLimited)).await;
        let mut submission = form("#AA0000", "", "", "Lato");
        submission.logo = Some(LogoUpload {
            bytes: b"hello".to_vec(),
            mime_type: "text/plain".into(),
        });

        let err = app.submit_manual(&submission).await.unwrap_err();
        assert!(matches!(err, BrandError::UnsupportedFileType(_)));
        assert_eq!(app.current(), BrandingProfile::default());
    }

    #[tokio::test]
    async fn test_manual_logo_storage_failure_keeps_colors() {
        crate::logger::init_test();
        let app = BrandingApp::with_parts(
            Arc::new(MemoryKvStore::new()),
            Arc::new(UnavailableObjectStore),
            Arc::new(StaticSource(Err(BrandError::RateLimited))),
            None,
            &StorageConfig::default(),
        )
        .await;
        let mut submission = form("#AA0000", "", "", "Lato");
        submission.logo = Some(LogoUpload {
            bytes: SVG.to_vec(),
            mime_type: "image/svg+xml".into(),
        });

        let outcome = app.submit_manual(&submission).await.unwrap();
        assert!(matches!(outcome.logo, Some(Err(ref e)) if e.is_storage()));
        assert_eq!(outcome.profile.primary_color.as_str(), "#AA0000");
        assert!(!outcome.profile.has_logo());
    }

    #[tokio::test]
    async fn test_failed_extraction_leaves_profile_unchanged() {
        let app = app_with(Err(BrandError::BrandNotFound("acme.com".into()))).await;
        app.submit_manual(&form("#AA0000", "", "", "Lato")).await.unwrap();
        let before = app.current();

        let err = app.extract("acme.com", |_| {}).await.unwrap_err();
        assert_eq!(err, BrandError::BrandNotFound("acme.com".into()));
        assert_eq!(app.current(), before);
    }

    #[tokio::test]
    async fn test_extraction_applies_full_patch() {
        let app = app_with(Ok(one_color_brand())).await;

        let profile = app.extract("https://acme.com", |_| {}).await.unwrap().unwrap();
        assert!(profile.is_custom_branding_enabled);
        assert_eq!(profile.primary_color.as_str(), "#0057FF");
        assert!(!profile.has_logo());
    }

    #[tokio::test]
    async fn test_extraction_finishing_after_disable_is_dropped() {
        let gate = Arc::new(Notify::new());
        let app = app_with_source(Arc::new(GatedSource {
            gate: gate.clone(),
            data: one_color_brand(),
        }))
        .await;
        app.set_enabled(true);

        let (outcome, _) = tokio::join!(app.extract("acme.com", |_| {}), async {
            app.set_enabled(false);
            gate.notify_one();
        });

        assert_eq!(outcome.unwrap(), None);
        let current = app.current();
        assert!(!current.is_custom_branding_enabled);
        assert_eq!(current.primary_color, BrandingProfile::default().primary_color);
    }

    #[tokio::test]
    async fn test_extraction_finishing_after_reset_is_dropped() {
        let gate = Arc::new(Notify::new());
        let app = app_with_source(Arc::new(GatedSource {
            gate: gate.clone(),
            data: one_color_brand(),
        }))
        .await;
        app.submit_manual(&form("#AA0000", "", "", "Lato")).await.unwrap();

        let (outcome, _) = tokio::join!(app.extract("acme.com", |_| {}), async {
            app.reset();
            gate.notify_one();
        });

        assert_eq!(outcome.unwrap(), None);
        assert_eq!(app.current(), BrandingProfile::default());
    }

    #[tokio::test]
    async fn test_deleted_logo_renders_as_no_logo() {
        let app = app_with(Err(BrandError::RateLimited)).await;
        app.set_enabled(true);
        let AcquiredLogo::Stored(asset) = app.upload_logo(SVG, "image/svg+xml").await.unwrap() else {
            panic!("expected stored logo");
        };
        assert!(app
            .system_prompt("base")
            .await
            .contains(EXISTING_LOGO_MARKER));

        app.delete_logo(&asset.id).await.unwrap();
        let prompt = app.system_prompt("base").await;
        assert!(prompt.contains(SYNTHESIZE_LOGO_MARKER));
        assert!(!prompt.contains(EXISTING_LOGO_MARKER));
        // No cascade: the profile still holds the reference.
        assert_eq!(app.current().logo_ref, Some(asset));
    }

    #[tokio::test]
    async fn test_open_persists_profile_and_logo() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.storage.data_dir = tmp.path().join("data").to_string_lossy().to_string();
        config.storage.downloads_dir = tmp.path().join("downloads").to_string_lossy().to_string();

        let app = BrandingApp::open(&config).await.unwrap();
        app.submit_manual(&form("#123456", "", "", "Roboto")).await.unwrap();
        app.upload_logo(SVG, "image/svg+xml").await.unwrap();
        drop(app);

        let reopened = BrandingApp::open(&config).await.unwrap();
        let profile = reopened.current();
        assert_eq!(profile.primary_color.as_str(), "#123456");
        assert_eq!(profile.font_family, "Roboto");
        assert!(profile.logo_ref.is_some());
        assert!(profile.logo_data.is_some());
        assert_eq!(reopened.list_logos().await.unwrap().len(), 1);
    }

    #[test]
    fn test_base_prompt_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("base.txt");
        std::fs::write(&path, "Custom base").unwrap();

        let mut config = Config::default();
        assert_eq!(load_base_prompt(&config).unwrap(), DEFAULT_BASE_PROMPT);
        config.prompt.base_prompt_file = path.to_string_lossy().to_string();
        assert_eq!(load_base_prompt(&config).unwrap(), "Custom base");
    }
}
