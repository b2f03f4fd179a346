//! Colours and font descriptors shared by the config, profiles and renderer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// RGBA colour, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` (the leading `#` is optional).
    pub fn from_hex(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        let bad = || Error::InvalidConfig(format!("invalid colour '{s}'"));
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(bad());
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| bad());
        match hex.len() {
            3 => {
                let nib = |i: usize| {
                    u8::from_str_radix(&hex[i..i + 1], 16)
                        .map(|v| v * 17)
                        .map_err(|_| bad())
                };
                Ok(Self::rgb(nib(0)?, nib(1)?, nib(2)?))
            }
            6 => Ok(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Self::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => Err(bad()),
        }
    }

    /// Replace the alpha channel with an opacity in `[0, 1]`.
    ///
    /// Out-of-range and NaN opacities are clamped; NaN counts as fully opaque.
    pub fn with_alpha(self, opacity: f32) -> Self {
        let opacity = if opacity.is_nan() { 1.0 } else { opacity.clamp(0.0, 1.0) };
        Self {
            a: (opacity * 255.0).round() as u8,
            ..self
        }
    }

    /// Multiply the existing alpha by `opacity`.
    pub fn scale_alpha(self, opacity: f32) -> Self {
        let opacity = if opacity.is_nan() { 1.0 } else { opacity.clamp(0.0, 1.0) };
        Self {
            a: (f32::from(self.a) * opacity).round() as u8,
            ..self
        }
    }

    /// `#RRGGBBAA`, upper case.
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl TryFrom<String> for Color {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::from_hex(&s)
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_hex()
    }
}

/// Line height as a multiple of font size, matching browser `normal`.
pub const LINE_HEIGHT_FACTOR: f32 = 1.2;

/// A CSS-like font descriptor such as `32px sans-serif`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FontSpec {
    pub size_px: f32,
    pub family: String,
}

impl FontSpec {
    pub fn new(size_px: f32, family: impl Into<String>) -> Self {
        Self {
            size_px,
            family: family.into(),
        }
    }

    /// Parse `"<size>px <family...>"`.
    ///
    /// Words before the size token (e.g. `bold`) are accepted and ignored.
    /// A missing family means `sans-serif`.
    pub fn parse(s: &str) -> Result<Self> {
        let bad = |why: &str| Error::InvalidConfig(format!("invalid font '{s}': {why}"));
        let tokens: Vec<&str> = s.split_whitespace().collect();
        let size_idx = tokens
            .iter()
            .position(|t| t.ends_with("px"))
            .ok_or_else(|| bad("no size in px"))?;
        let size_px: f32 = tokens[size_idx]
            .trim_end_matches("px")
            .parse()
            .map_err(|_| bad("size is not a number"))?;
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(bad("size must be positive"));
        }
        let family = tokens[size_idx + 1..].join(" ");
        let family = if family.is_empty() {
            "sans-serif".to_string()
        } else {
            family.trim_matches(|c| c == '"' || c == '\'').to_string()
        };
        Ok(Self { size_px, family })
    }

    /// Default line height for this font.
    pub fn line_height(&self) -> f32 {
        self.size_px * LINE_HEIGHT_FACTOR
    }

    /// Stable key for caches (f32 is not `Hash`).
    pub(crate) fn cache_key(&self) -> (u32, String) {
        (self.size_px.to_bits(), self.family.clone())
    }
}

impl Default for FontSpec {
    fn default() -> Self {
        Self::new(32.0, "sans-serif")
    }
}

impl fmt::Display for FontSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}px {}", self.size_px, self.family)
    }
}

impl TryFrom<String> for FontSpec {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<FontSpec> for String {
    fn from(f: FontSpec) -> Self {
        f.to_string()
    }
}
