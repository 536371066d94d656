// brandforge: Heuristics turning partial brand data into a full palette

use super::types::{BrandColor, BrandData, BrandFont, BrandLogo, ExtractionResult};
use crate::branding::BrandingProfile;
use crate::color::Color;
use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

pub const FALLBACK_FONT: &str = "Inter";

/// Font families the generated sites can load.
pub const KNOWN_FONTS: [&str; 11] = [
    "Inter",
    "Poppins",
    "Montserrat",
    "Roboto",
    "Open Sans",
    "Lato",
    "Raleway",
    "Playfair Display",
    "Source Code Pro",
    "Merriweather",
    "Space Grotesk",
];

/// Luminance step used to derive a missing secondary color.
pub const LIGHTEN_PERCENT: f64 = 20.0;

/// WCAG AA contrast for normal text.
pub const MIN_ACCENT_CONTRAST: f64 = 4.5;

static FONT_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9 ]").expect("static pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub primary: Color,
    pub secondary: Color,
    pub accent: Color,
}

/// Reduce a relay record to ranked colors and logo/font candidates.
pub fn summarize(data: &BrandData) -> ExtractionResult {
    ExtractionResult {
        colors: rank_colors(data.colors.as_deref().unwrap_or_default()),
        font_candidate: select_font(data.fonts.as_deref().unwrap_or_default()),
        logo_candidate_url: select_logo(data),
    }
}

/// Primary-typed colors first, then everything by ascending brightness.
/// Entries without a valid hex value are dropped.
pub fn rank_colors(colors: &[BrandColor]) -> Vec<Color> {
    let mut ranked: Vec<(bool, f64, Color)> = colors
        .iter()
        .filter_map(|c| {
            let color = Color::parse(c.hex.as_deref()?).ok()?;
            let is_primary = c.kind.as_deref() == Some("primary");
            let brightness = c.brightness.unwrap_or_else(|| color.brightness());
            Some((is_primary, brightness, color))
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then_with(|| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
    });
    ranked.into_iter().map(|(_, _, color)| color).collect()
}

/// Pick primary, secondary and accent from ranked candidates, synthesizing
/// whatever is missing.
pub fn derive_palette(ranked: &[Color]) -> Palette {
    let Some(primary) = ranked.first().cloned() else {
        let defaults = BrandingProfile::default();
        return Palette {
            primary: defaults.primary_color,
            secondary: defaults.secondary_color,
            accent: defaults.accent_color,
        };
    };

    let secondary = ranked
        .get(1)
        .cloned()
        .unwrap_or_else(|| primary.lighten(LIGHTEN_PERCENT));

    let contrasting = ranked
        .iter()
        .skip(1)
        .filter(|c| !c.same_as(&primary) && !c.same_as(&secondary))
        .find(|c| c.contrast_ratio(&primary) > MIN_ACCENT_CONTRAST)
        .cloned();

    let accent = contrasting
        .or_else(|| {
            ranked
                .iter()
                .skip(2)
                .find(|c| !c.same_as(&primary) && !c.same_as(&secondary))
                .cloned()
        })
        .unwrap_or_else(|| {
            let rotated = primary.rotate_hue(180.0);
            if rotated.same_as(&primary) || rotated.same_as(&secondary) {
                highest_contrast_neutral(&primary)
            } else {
                rotated
            }
        });

    Palette {
        primary,
        secondary,
        accent,
    }
}

fn highest_contrast_neutral(against: &Color) -> Color {
    let white = Color::from_rgb(0xff, 0xff, 0xff);
    let black = Color::from_rgb(0, 0, 0);
    if white.contrast_ratio(against) >= black.contrast_ratio(against) {
        white
    } else {
        black
    }
}

/// Raw name of the first primary/heading/brand font, if any.
pub fn select_font(fonts: &[BrandFont]) -> Option<String> {
    fonts
        .iter()
        .find(|f| matches!(f.kind.as_deref(), Some("primary" | "heading" | "brand")))
        .and_then(|f| f.name.clone())
        .filter(|name| !name.trim().is_empty())
}

/// Map a raw font name onto [`KNOWN_FONTS`], or [`FALLBACK_FONT`].
pub fn normalize_font(raw: &str) -> &'static str {
    let cleaned = FONT_NOISE.replace_all(raw, "").to_lowercase();
    KNOWN_FONTS
        .iter()
        .find(|font| cleaned.contains(&font.to_lowercase()))
        .copied()
        .unwrap_or(FALLBACK_FONT)
}

/// SVG logo, then a primary logo, then any logo with a source, then the icon.
pub fn select_logo(data: &BrandData) -> Option<String> {
    let logos = data.logos.as_deref().unwrap_or_default();

    first_src(logos, |l| l.format.as_deref() == Some("svg"))
        .or_else(|| {
            first_src(logos, |l| {
                l.kind.as_deref() == Some("primary")
                    && matches!(l.format.as_deref(), Some("svg" | "png"))
            })
        })
        .or_else(|| first_src(logos, |_| true))
        .or_else(|| {
            data.icon
                .as_ref()
                .and_then(|i| i.src.clone())
                .filter(|s| !s.is_empty())
        })
}

fn first_src(logos: &[BrandLogo], pred: impl Fn(&BrandLogo) -> bool) -> Option<String> {
    logos
        .iter()
        .filter(|l| l.src.as_deref().is_some_and(|s| !s.is_empty()))
        .find(|l| pred(l))
        .and_then(|l| l.src.clone())
}
