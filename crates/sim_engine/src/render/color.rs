//! RGBA colors with hex string parsing

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failure to parse a hex color string
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid color '{0}': expected #RGB, #RRGGBB or #RRGGBBAA")]
pub struct ColorParseError(pub String);

/// Linear RGBA color with components in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
    /// Alpha
    pub a: f32,
}

impl Color {
    /// Opaque white
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    /// Opaque black
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    /// Opaque red
    pub const RED: Self = Self::rgb(1.0, 0.0, 0.0);
    /// Opaque green
    pub const GREEN: Self = Self::rgb(0.0, 1.0, 0.0);
    /// Opaque blue
    pub const BLUE: Self = Self::rgb(0.0, 0.0, 1.0);
    /// Opaque yellow
    pub const YELLOW: Self = Self::rgb(1.0, 1.0, 0.0);
    /// Opaque cyan
    pub const CYAN: Self = Self::rgb(0.0, 1.0, 1.0);
    /// Fully transparent black
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);

    /// Opaque color from components
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Color from components including alpha
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Builder pattern: replace alpha
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.a = alpha.clamp(0.0, 1.0);
        self
    }

    /// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA`; the `#` is optional
    pub fn from_hex(text: &str) -> Result<Self, ColorParseError> {
        let error = || ColorParseError(text.to_string());
        let digits = text.trim().trim_start_matches('#');
        if !digits.is_ascii() {
            return Err(error());
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map(|value| f32::from(value) / 255.0)
        };
        let short = |index: usize| {
            u8::from_str_radix(&digits[index..=index], 16).map(|value| f32::from(value * 17) / 255.0)
        };

        let parsed = match digits.len() {
            3 => (short(0), short(1), short(2), Ok(1.0)),
            6 => (channel(0..2), channel(2..4), channel(4..6), Ok(1.0)),
            8 => (channel(0..2), channel(2..4), channel(4..6), channel(6..8)),
            _ => return Err(error()),
        };
        match parsed {
            (Ok(r), Ok(g), Ok(b), Ok(a)) => Ok(Self { r, g, b, a }),
            _ => Err(error()),
        }
    }

    /// Format as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque
    pub fn to_hex(&self) -> String {
        let byte = |value: f32| (value.clamp(0.0, 1.0) * 255.0).round() as u8;
        if byte(self.a) == u8::MAX {
            format!("#{:02X}{:02X}{:02X}", byte(self.r), byte(self.g), byte(self.b))
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", byte(self.r), byte(self.g), byte(self.b), byte(self.a))
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        Self::from_hex(&text)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}
