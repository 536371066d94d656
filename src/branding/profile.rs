// brandforge: Branding profile and partial patches

use crate::asset::AssetRef;
use crate::color::Color;
use serde::{Deserialize, Serialize};

pub const DEFAULT_FONT: &str = "Inter";

/// The active brand identity. Exactly one lives in a running application,
/// owned by [`super::BrandingState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandingProfile {
    pub logo_ref: Option<AssetRef>,
    /// Data URL of the logo for this session only. Filled from the asset
    /// store on startup, or the only copy when the store was unavailable.
    #[serde(skip)]
    pub logo_data: Option<String>,
    pub primary_color: Color,
    pub secondary_color: Color,
    pub accent_color: Color,
    pub font_family: String,
    pub is_custom_branding_enabled: bool,
}

impl Default for BrandingProfile {
    fn default() -> Self {
        Self {
            logo_ref: None,
            logo_data: None,
            primary_color: Color::from_rgb(0x3b, 0x82, 0xf6),
            secondary_color: Color::from_rgb(0x10, 0xb9, 0x81),
            accent_color: Color::from_rgb(0xf5, 0x9e, 0x0b),
            font_family: DEFAULT_FONT.to_string(),
            is_custom_branding_enabled: false,
        }
    }
}

impl BrandingProfile {
    pub fn has_logo(&self) -> bool {
        self.logo_ref.is_some() || self.logo_data.is_some()
    }

    /// Shallow merge: fields the patch leaves as `None` keep their value.
    pub fn apply(&mut self, patch: BrandingPatch) {
        if let Some(logo) = patch.logo {
            match logo {
                LogoPatch::Stored { asset, data_url } => {
                    self.logo_ref = Some(asset);
                    self.logo_data = data_url;
                }
                LogoPatch::SessionOnly { data_url } => {
                    self.logo_ref = None;
                    self.logo_data = Some(data_url);
                }
                LogoPatch::Clear => {
                    self.logo_ref = None;
                    self.logo_data = None;
                }
            }
        }
        if let Some(color) = patch.primary_color {
            self.primary_color = color;
        }
        if let Some(color) = patch.secondary_color {
            self.secondary_color = color;
        }
        if let Some(color) = patch.accent_color {
            self.accent_color = color;
        }
        if let Some(font) = patch.font_family {
            self.font_family = font;
        }
        if let Some(enabled) = patch.is_custom_branding_enabled {
            self.is_custom_branding_enabled = enabled;
        }
    }

    pub fn merged(mut self, patch: BrandingPatch) -> Self {
        self.apply(patch);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoPatch {
    /// Logo persisted in the asset store; `data_url` caches its bytes.
    Stored {
        asset: AssetRef,
        data_url: Option<String>,
    },
    /// Logo kept in memory only, after the asset store refused it.
    SessionOnly { data_url: String },
    Clear,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrandingPatch {
    pub logo: Option<LogoPatch>,
    pub primary_color: Option<Color>,
    pub secondary_color: Option<Color>,
    pub accent_color: Option<Color>,
    pub font_family: Option<String>,
    pub is_custom_branding_enabled: Option<bool>,
}

impl BrandingPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn logo(mut self, logo: LogoPatch) -> Self {
        self.logo = Some(logo);
        self
    }

    pub fn primary_color(mut self, color: Color) -> Self {
        self.primary_color = Some(color);
        self
    }

    pub fn secondary_color(mut self, color: Color) -> Self {
        self.secondary_color = Some(color);
        self
    }

    pub fn accent_color(mut self, color: Color) -> Self {
        self.accent_color = Some(color);
        self
    }

    pub fn font_family(mut self, font: impl Into<String>) -> Self {
        self.font_family = Some(font.into());
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.is_custom_branding_enabled = Some(enabled);
        self
    }

    /// True when every profile field is set.
    pub fn is_complete(&self) -> bool {
        self.logo.is_some()
            && self.primary_color.is_some()
            && self.secondary_color.is_some()
            && self.accent_color.is_some()
            && self.font_family.is_some()
            && self.is_custom_branding_enabled.is_some()
    }

    pub fn disables_branding(&self) -> bool {
        self.is_custom_branding_enabled == Some(false)
    }
}
