// brandforge: Remote brand extraction
//
// Turns a URL typed by the user into a complete branding patch: the relay
// supplies whatever the brand API knows, the heuristics fill in the rest.

pub mod heuristics;
pub mod relay;
pub mod types;

use crate::acquire::capability::LogoSaver;
use crate::asset::data_url::looks_like_image;
use crate::asset::encode_data_url;
use crate::branding::{BrandingPatch, LogoPatch};
use crate::error::{BrandError, Result};
use relay::BrandSource;
use std::sync::Arc;
use url::Url;

pub use heuristics::{derive_palette, normalize_font, summarize, Palette, FALLBACK_FONT};
pub use relay::HttpBrandRelay;
pub use types::{BrandData, ExtractionResult, FetchedAsset};

/// Normalize user input into an absolute URL, or `None` if it does not name
/// a dotted host.
pub fn validate_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lower = trimmed.to_ascii_lowercase();
    let candidate = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&candidate).ok()?;
    let host = url.host_str()?;
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return None;
    }
    Some(url.to_string())
}

/// Host of a normalized URL without a leading `www.`.
pub fn extract_domain(url: &str) -> String {
    let host = match Url::parse(url) {
        Ok(parsed) => parsed.host_str().unwrap_or_default().to_string(),
        Err(_) => {
            let without_scheme = url
                .split_once("://")
                .map(|(_, rest)| rest)
                .unwrap_or(url);
            without_scheme
                .split(['/', '?', '#'])
                .next()
                .unwrap_or_default()
                .to_string()
        }
    };
    host.strip_prefix("www.").unwrap_or(&host).to_string()
}

pub struct RemoteBrandExtractor {
    source: Arc<dyn BrandSource>,
    saver: Option<Arc<dyn LogoSaver>>,
}

impl RemoteBrandExtractor {
    pub fn new(source: Arc<dyn BrandSource>, saver: Option<Arc<dyn LogoSaver>>) -> Self {
        Self { source, saver }
    }

    /// Look up a brand and fold it into a complete patch with branding
    /// enabled.
    ///
    /// Only the relay lookup can fail the extraction. Logo download and
    /// storage are best-effort: when they fail the patch clears the logo.
    /// `on_progress` receives one message per phase.
    pub async fn fetch_brand_info<F>(&self, url: &str, mut on_progress: F) -> Result<BrandingPatch>
    where
        F: FnMut(&str) + Send,
    {
        let normalized = validate_url(url).ok_or_else(|| BrandError::InvalidUrl(url.to_string()))?;
        let domain = extract_domain(&normalized);
        if domain.len() < 3 || !domain.contains('.') {
            return Err(BrandError::InvalidUrl(url.to_string()));
        }

        on_progress("Contacting the brand relay...");
        let data = self.source.lookup(&domain).await?;

        on_progress("Analyzing brand data...");
        let summary = summarize(&data);

        on_progress("Extracting brand colors...");
        let palette = derive_palette(&summary.colors);

        on_progress("Extracting fonts...");
        let font = summary
            .font_candidate
            .as_deref()
            .map(normalize_font)
            .unwrap_or(FALLBACK_FONT);

        on_progress("Retrieving logo...");
        let logo = match &summary.logo_candidate_url {
            Some(logo_url) => self.persist_logo(logo_url, &mut on_progress).await,
            None => LogoPatch::Clear,
        };

        on_progress("Brand guidelines retrieved.");
        tracing::info!(
            domain = %domain,
            primary = %palette.primary,
            font = %font,
            "Brand extracted"
        );

        Ok(BrandingPatch::new()
            .logo(logo)
            .primary_color(palette.primary)
            .secondary_color(palette.secondary)
            .accent_color(palette.accent)
            .font_family(font)
            .enabled(true))
    }

    async fn persist_logo<F>(&self, logo_url: &str, on_progress: &mut F) -> LogoPatch
    where
        F: FnMut(&str) + Send,
    {
        let asset = match self.source.fetch_asset(logo_url).await {
            Ok(asset) => asset,
            Err(e) => {
                tracing::warn!(url = %logo_url, "Could not download brand logo: {}", e);
                return LogoPatch::Clear;
            }
        };
        if !looks_like_image(&asset.bytes, &asset.mime_type) {
            tracing::warn!(url = %logo_url, mime = %asset.mime_type, "Brand logo is not a usable image");
            return LogoPatch::Clear;
        }

        let data_url = encode_data_url(&asset.mime_type, &asset.bytes);
        let Some(saver) = &self.saver else {
            return LogoPatch::SessionOnly { data_url };
        };

        on_progress("Saving logo to the asset store...");
        match saver.save_logo(&asset.bytes, &asset.mime_type).await {
            Ok(stored) => {
                on_progress(&format!("Logo saved to {}", stored.virtual_path));
                LogoPatch::Stored {
                    asset: stored,
                    data_url: Some(data_url),
                }
            }
            Err(e) => {
                tracing::warn!(url = %logo_url, "Brand logo kept for this session only: {}", e);
                LogoPatch::SessionOnly { data_url }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::types::{BrandColor, BrandLogo};
    use super::*;
    use crate::asset::tests::{memory_store, UnavailableObjectStore, SVG};
    use crate::asset::AssetStore;
    use crate::branding::BrandingProfile;
    use crate::color::Color;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeSource {
        lookup: Result<BrandData>,
        asset: Option<FetchedAsset>,
        domains: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn new(lookup: Result<BrandData>) -> Self {
            Self {
                lookup,
                asset: None,
                domains: Mutex::new(Vec::new()),
            }
        }

        fn with_asset(mut self, bytes: &[u8], mime: &str) -> Self {
            self.asset = Some(FetchedAsset {
                bytes: bytes.to_vec(),
                mime_type: mime.to_string(),
            });
            self
        }
    }

    #[async_trait]
    impl BrandSource for FakeSource {
        async fn lookup(&self, domain: &str) -> Result<BrandData> {
            self.domains.lock().unwrap().push(domain.to_string());
            self.lookup.clone()
        }

        async fn fetch_asset(&self, url: &str) -> Result<FetchedAsset> {
            self.asset
                .clone()
                .ok_or_else(|| BrandError::ExtractionFailed(format!("no asset at {}", url)))
        }
    }

    fn one_color_brand() -> BrandData {
        BrandData {
            colors: Some(vec![BrandColor {
                hex: Some("#0057FF".into()),
                kind: Some("brand".into()),
                brightness: None,
            }]),
            ..Default::default()
        }
    }

    fn brand_with_logo() -> BrandData {
        BrandData {
            logos: Some(vec![BrandLogo {
                format: Some("svg".into()),
                src: Some("https://cdn.acme.com/logo.svg".into()),
                kind: Some("logo".into()),
            }]),
            ..one_color_brand()
        }
    }

    #[test]
    fn test_validate_url() {
        assert_eq!(validate_url("  acme.com ").as_deref(), Some("https://acme.com/"));
        assert_eq!(
            validate_url("HTTP://www.acme.com/about").as_deref(),
            Some("http://www.acme.com/about")
        );
        assert_eq!(validate_url("localhost"), None);
        assert_eq!(validate_url(""), None);
        assert_eq!(validate_url("acme..com"), None);
        assert_eq!(validate_url("not a url at all"), None);
    }

    #[test]
    fn test_extract_domain() {
        assert_eq!(extract_domain("https://www.acme.com/about?x=1"), "acme.com");
        assert_eq!(extract_domain("https://shop.acme.co.uk/"), "shop.acme.co.uk");
        assert_eq!(extract_domain("www.acme.com/path"), "acme.com");
    }

    #[tokio::test]
    async fn test_single_color_fallbacks() {
        let source = Arc::new(FakeSource::new(Ok(one_color_brand())));
        let extractor = RemoteBrandExtractor::new(source.clone(), None);

        let patch = extractor.fetch_brand_info("acme.com", |_| {}).await.unwrap();
        let profile = BrandingProfile::default().merged(patch.clone());

        let primary = Color::parse("#0057FF").unwrap();
        assert!(patch.is_complete());
        assert_eq!(profile.primary_color.as_str(), "#0057FF");
        assert_eq!(profile.secondary_color, primary.lighten(20.0));
        assert!(!profile.accent_color.same_as(&profile.primary_color));
        assert!(!profile.accent_color.same_as(&profile.secondary_color));
        assert_eq!(profile.font_family, FALLBACK_FONT);
        assert!(profile.is_custom_branding_enabled);
        assert!(!profile.has_logo());
        assert_eq!(*source.domains.lock().unwrap(), vec!["acme.com".to_string()]);
    }

    #[tokio::test]
    async fn test_progress_reported_per_phase() {
        let source = Arc::new(FakeSource::new(Ok(one_color_brand())));
        let extractor = RemoteBrandExtractor::new(source, None);

        let mut messages = Vec::new();
        extractor
            .fetch_brand_info("https://www.acme.com", |m| messages.push(m.to_string()))
            .await
            .unwrap();

        assert!(messages.len() >= 6);
        assert!(messages[0].contains("relay"));
        assert!(messages.iter().any(|m| m.contains("colors")));
        assert!(messages.iter().any(|m| m.contains("fonts")));
        assert!(messages.iter().any(|m| m.contains("logo")));
    }

    #[tokio::test]
    async fn test_invalid_url_never_hits_relay() {
        let source = Arc::new(FakeSource::new(Ok(one_color_brand())));
        let extractor = RemoteBrandExtractor::new(source.clone(), None);

        let err = extractor.fetch_brand_info("localhost", |_| {}).await.unwrap_err();
        assert_eq!(err, BrandError::InvalidUrl("localhost".into()));
        assert!(source.domains.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_relay_errors_propagate() {
        let extractor = RemoteBrandExtractor::new(
            Arc::new(FakeSource::new(Err(BrandError::RateLimited))),
            None,
        );
        let err = extractor.fetch_brand_info("acme.com", |_| {}).await.unwrap_err();
        assert_eq!(err, BrandError::RateLimited);
    }

    #[tokio::test]
    async fn test_logo_is_stored_when_saver_available() {
        let store = Arc::new(memory_store());
        let source = Arc::new(FakeSource::new(Ok(brand_with_logo())).with_asset(SVG, "image/svg+xml"));
        let extractor = RemoteBrandExtractor::new(source, Some(store.clone()));

        let patch = extractor.fetch_brand_info("acme.com", |_| {}).await.unwrap();
        let Some(LogoPatch::Stored { asset, data_url }) = patch.logo else {
            panic!("expected stored logo");
        };
        assert!(data_url.is_some());
        assert!(store.get_by_path(&asset.virtual_path).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_logo_download_failure_does_not_fail_extraction() {
        let source = Arc::new(FakeSource::new(Ok(brand_with_logo())));
        let extractor = RemoteBrandExtractor::new(source, Some(Arc::new(memory_store())));

        let patch = extractor.fetch_brand_info("acme.com", |_| {}).await.unwrap();
        assert_eq!(patch.logo, Some(LogoPatch::Clear));
        assert!(patch.is_complete());
    }

    #[tokio::test]
    async fn test_logo_store_failure_keeps_session_copy() {
        let broken = Arc::new(AssetStore::new(
            Arc::new(UnavailableObjectStore),
            "brandforge",
            "brand_logos",
        ));
        let source = Arc::new(FakeSource::new(Ok(brand_with_logo())).with_asset(SVG, "image/svg+xml"));
        let extractor = RemoteBrandExtractor::new(source, Some(broken));

        let patch = extractor.fetch_brand_info("acme.com", |_| {}).await.unwrap();
        assert!(matches!(patch.logo, Some(LogoPatch::SessionOnly { .. })));
    }
}
