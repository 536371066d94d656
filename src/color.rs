// brandforge: Hex colors and the palette math used by extraction

use crate::error::{BrandError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A `#RRGGBB` color. The hex digits are kept exactly as the user or the
/// brand service supplied them, so rendering echoes them verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    hex: String,
    rgb: [u8; 3],
}

impl Color {
    /// Parse `#RRGGBB` or `RRGGBB`. Surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(BrandError::InvalidColor(raw.to_string()));
        }

        let value =
            u32::from_str_radix(digits, 16).map_err(|_| BrandError::InvalidColor(raw.to_string()))?;
        Ok(Self {
            hex: format!("#{}", digits),
            rgb: [(value >> 16) as u8, (value >> 8) as u8, value as u8],
        })
    }

    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            hex: format!("#{:02x}{:02x}{:02x}", r, g, b),
            rgb: [r, g, b],
        }
    }

    pub fn as_str(&self) -> &str {
        &self.hex
    }

    pub fn rgb(&self) -> [u8; 3] {
        self.rgb
    }

    /// Add `round(2.55 * percent)` to every channel, clamping at 0 and 255.
    pub fn lighten(&self, percent: f64) -> Self {
        let amount = (2.55 * percent).round() as i32;
        let [r, g, b] = self.rgb.map(|c| (c as i32 + amount).clamp(0, 255) as u8);
        Self::from_rgb(r, g, b)
    }

    /// Perceived brightness on a 0..=255 scale (ITU-R BT.601 weights).
    pub fn brightness(&self) -> f64 {
        let [r, g, b] = self.rgb;
        (299.0 * r as f64 + 587.0 * g as f64 + 114.0 * b as f64) / 1000.0
    }

    /// WCAG relative luminance.
    pub fn relative_luminance(&self) -> f64 {
        let [r, g, b] = self.rgb.map(|c| {
            let c = c as f64 / 255.0;
            if c <= 0.03928 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        });
        0.2126 * r + 0.7152 * g + 0.0722 * b
    }

    /// WCAG contrast ratio, from 1.0 (identical) to 21.0 (black on white).
    pub fn contrast_ratio(&self, other: &Color) -> f64 {
        let a = self.relative_luminance();
        let b = other.relative_luminance();
        let (light, dark) = if a >= b { (a, b) } else { (b, a) };
        (light + 0.05) / (dark + 0.05)
    }

    /// Rotate the hue in HSL space, keeping saturation and lightness.
    pub fn rotate_hue(&self, degrees: f64) -> Self {
        let [r, g, b] = self.rgb.map(|c| c as f64 / 255.0);
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;

        let (h, s) = if max == min {
            (0.0, 0.0)
        } else {
            let d = max - min;
            let s = if l > 0.5 {
                d / (2.0 - max - min)
            } else {
                d / (max + min)
            };
            let h = if max == r {
                (g - b) / d + if g < b { 6.0 } else { 0.0 }
            } else if max == g {
                (b - r) / d + 2.0
            } else {
                (r - g) / d + 4.0
            };
            (h / 6.0, s)
        };

        let h = (h * 360.0 + degrees).rem_euclid(360.0) / 360.0;

        let (r, g, b) = if s == 0.0 {
            (l, l, l)
        } else {
            let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
            let p = 2.0 * l - q;
            (
                hue_to_rgb(p, q, h + 1.0 / 3.0),
                hue_to_rgb(p, q, h),
                hue_to_rgb(p, q, h - 1.0 / 3.0),
            )
        };

        let to_byte = |c: f64| (c * 255.0).round().clamp(0.0, 255.0) as u8;
        Self::from_rgb(to_byte(r), to_byte(g), to_byte(b))
    }

    /// Same color regardless of digit case.
    pub fn same_as(&self, other: &Color) -> bool {
        self.rgb == other.rgb
    }
}

fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex)
    }
}

impl FromStr for Color {
    type Err = BrandError;

    fn from_str(s: &str) -> Result<Self> {
        Color::parse(s)
    }
}

impl TryFrom<String> for Color {
    type Error = BrandError;

    fn try_from(value: String) -> Result<Self> {
        Color::parse(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.hex
    }
}
