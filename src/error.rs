// brandforge: Error kinds shared by the branding subsystem

use thiserror::Error;

/// Errors produced while acquiring, storing or extracting brand assets.
///
/// Every variant is meant to be caught at the command boundary and shown to
/// the user; none of them should interrupt prompt assembly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrandError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("no brand found for domain {0}")]
    BrandNotFound(String),
    #[error("brand lookup rate limited, try again later")]
    RateLimited,
    #[error("brand extraction failed: {0}")]
    ExtractionFailed(String),
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("asset '{0}' already exists")]
    AssetExists(String),
    #[error("invalid color '{0}': expected 6 hex digits")]
    InvalidColor(String),
}

impl BrandError {
    pub fn storage(err: impl std::fmt::Display) -> Self {
        BrandError::StorageUnavailable(err.to_string())
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, BrandError::StorageUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, BrandError>;
