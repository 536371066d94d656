// brandforge: Brand data payload returned by the relay

use crate::color::Color;
use serde::{Deserialize, Serialize};

/// Brand record as relayed from the brand-data API. Every field is optional;
/// the API routinely omits colors, fonts or logos for smaller brands.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrandData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub colors: Option<Vec<BrandColor>>,
    #[serde(default)]
    pub fonts: Option<Vec<BrandFont>>,
    #[serde(default)]
    pub logos: Option<Vec<BrandLogo>>,
    #[serde(default)]
    pub icon: Option<BrandIcon>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrandColor {
    #[serde(default)]
    pub hex: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub brightness: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrandFont {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrandLogo {
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub src: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrandIcon {
    #[serde(default)]
    pub src: Option<String>,
}

/// What the heuristics make of a [`BrandData`] record before it is folded
/// into a profile patch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionResult {
    /// Candidate colors, best first.
    pub colors: Vec<Color>,
    pub font_candidate: Option<String>,
    pub logo_candidate_url: Option<String>,
}

/// An image downloaded from a logo URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedAsset {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}
