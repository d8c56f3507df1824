//! Separator colors and their preference-store representation.

use std::fmt;
use std::str::FromStr;

use palette::Srgba;
use serde::{Deserialize, Serialize};

/// An sRGB color with straight alpha, used for built-in separators.
///
/// Serializes as a `#RRGGBBAA` hex string:
///
/// ```
/// use splitter_icons::IconColor;
///
/// let red: IconColor = "#ff000080".parse().unwrap();
/// assert_eq!(red.to_string(), "#FF000080");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IconColor {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

/// Error returned when a color string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color {0:?}: expected #RRGGBB or #RRGGBBAA")]
pub struct ParseColorError(String);

impl IconColor {
    /// The neutral foreground tone used for template rendering.
    pub fn label() -> Self {
        Self::rgba(0, 0, 0, 217)
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    pub fn components(&self) -> (u8, u8, u8, u8) {
        (self.r, self.g, self.b, self.a)
    }

    /// Returns the color as floating-point components in 0.0-1.0.
    pub fn to_f32(&self) -> Srgba<f32> {
        Srgba::new(self.r, self.g, self.b, self.a).into_format()
    }
}

impl From<Srgba<u8>> for IconColor {
    fn from(color: Srgba<u8>) -> Self {
        Self::rgba(color.red, color.green, color.blue, color.alpha)
    }
}

impl fmt::Display for IconColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (r, g, b, a) = self.components();
        write!(f, "#{r:02X}{g:02X}{b:02X}{a:02X}")
    }
}

impl FromStr for IconColor {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseColorError(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(err)?;
        if !hex.is_ascii() || (hex.len() != 6 && hex.len() != 8) {
            return Err(err());
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
        let alpha = if hex.len() == 8 { byte(6)? } else { 255 };
        Ok(Self::rgba(byte(0)?, byte(2)?, byte(4)?, alpha))
    }
}

impl TryFrom<String> for IconColor {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<IconColor> for String {
    fn from(color: IconColor) -> Self {
        color.to_string()
    }
}
