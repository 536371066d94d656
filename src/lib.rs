// brandforge: Branding context and prompt injection for AI site generation
// License: Apache-2.0

pub mod acquire;
pub mod app;
pub mod asset;
pub mod branding;
pub mod color;
pub mod config;
pub mod error;
pub mod extract;
pub mod logger;
pub mod prompt;

pub use app::{BrandingApp, LogoUpload, ManualBrandForm, ManualOutcome};
pub use error::{BrandError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
