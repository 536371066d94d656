// brandforge: HTTP client for the brand-data relay

use super::types::{BrandData, FetchedAsset};
use crate::asset::mime_for_path;
use crate::error::{BrandError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = concat!("brandforge/", env!("CARGO_PKG_VERSION"));

/// Largest logo download accepted.
pub const DEFAULT_MAX_ASSET_BYTES: usize = 5 * 1024 * 1024;

/// Where brand records and logo bytes come from.
#[async_trait]
pub trait BrandSource: Send + Sync {
    async fn lookup(&self, domain: &str) -> Result<BrandData>;
    async fn fetch_asset(&self, url: &str) -> Result<FetchedAsset>;
}

/// Talks to the server-side relay that holds the brand API credentials.
pub struct HttpBrandRelay {
    endpoint: String,
    client: Client,
    max_asset_bytes: usize,
}

impl HttpBrandRelay {
    pub fn new(endpoint: impl Into<String>, timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(if user_agent.is_empty() {
                DEFAULT_USER_AGENT
            } else {
                user_agent
            })
            .build()
            .map_err(|e| BrandError::ExtractionFailed(format!("HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
            max_asset_bytes: DEFAULT_MAX_ASSET_BYTES,
        })
    }

    pub fn with_max_asset_bytes(mut self, limit: usize) -> Self {
        self.max_asset_bytes = limit;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl BrandSource for HttpBrandRelay {
    async fn lookup(&self, domain: &str) -> Result<BrandData> {
        tracing::debug!(domain = %domain, endpoint = %self.endpoint, "Querying brand relay");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "domain": domain }))
            .send()
            .await
            .map_err(|e| BrandError::ExtractionFailed(format!("relay request failed: {}", e)))?;

        let status = response.status();
        match status {
            s if s.is_success() => {}
            StatusCode::NOT_FOUND => return Err(BrandError::BrandNotFound(domain.to_string())),
            StatusCode::TOO_MANY_REQUESTS => return Err(BrandError::RateLimited),
            other => {
                let body = response.text().await.unwrap_or_default();
                tracing::warn!(status = %other, domain = %domain, "Brand relay error: {}", body);
                return Err(BrandError::ExtractionFailed(format!("relay returned {}", other)));
            }
        }

        response
            .json::<BrandData>()
            .await
            .map_err(|e| BrandError::ExtractionFailed(format!("malformed brand data: {}", e)))
    }

    async fn fetch_asset(&self, url: &str) -> Result<FetchedAsset> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BrandError::ExtractionFailed(format!("logo download failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BrandError::ExtractionFailed(format!(
                "logo download returned {}",
                status
            )));
        }

        let header_mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_ascii_lowercase())
            .filter(|v| v.starts_with("image/"));

        let mime_type = header_mime
            .or_else(|| mime_for_path(url).map(str::to_string))
            .unwrap_or_else(|| "image/png".to_string());

        let too_large = || {
            BrandError::ExtractionFailed(format!(
                "logo exceeds {} bytes",
                self.max_asset_bytes
            ))
        };
        if response
            .content_length()
            .is_some_and(|len| len > self.max_asset_bytes as u64)
        {
            return Err(too_large());
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| BrandError::ExtractionFailed(format!("logo download failed: {}", e)))?
        {
            if bytes.len() + chunk.len() > self.max_asset_bytes {
                return Err(too_large());
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(FetchedAsset { bytes, mime_type })
    }
}
