use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorParseError {
    #[error("invalid hex color format: {0:?}")]
    Format(String),
    #[error("invalid {channel} component in {input:?}")]
    Channel { channel: &'static str, input: String },
}

/// Opaque RGB color. Alpha is never chosen by the user; it is derived from
/// brightness at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn with_alpha(self, a: u8) -> Rgba {
        Rgba { color: self, a }
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Channels normalized to `[0.0, 1.0]`.
    pub fn to_unit(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[u8; 3]> for Color {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);

        if hex.len() != 6 || !hex.is_ascii() {
            return Err(ColorParseError::Format(s.to_string()));
        }

        let channel = |range: std::ops::Range<usize>, name: &'static str| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| ColorParseError::Channel {
                channel: name,
                input: s.to_string(),
            })
        };

        Ok(Self {
            r: channel(0..2, "red")?,
            g: channel(2..4, "green")?,
            b: channel(4..6, "blue")?,
        })
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RGB({}, {}, {})", self.r, self.g, self.b)
    }
}

/// A color with its resolved alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub color: Color,
    pub a: u8,
}

impl Rgba {
    pub fn alpha_unit(self) -> f32 {
        self.a as f32 / 255.0
    }

    pub fn is_transparent(self) -> bool {
        self.a == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_and_without_hash() {
        assert_eq!("#FFF0DC".parse::<Color>(), Ok(Color::rgb(255, 240, 220)));
        assert_eq!("fffaf0".parse::<Color>(), Ok(Color::rgb(255, 250, 240)));
        assert_eq!("  #00ff7f ".parse::<Color>(), Ok(Color::rgb(0, 255, 127)));
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!("#FFF".parse::<Color>(), Err(ColorParseError::Format(_))));
        assert!(matches!("".parse::<Color>(), Err(ColorParseError::Format(_))));
        assert!(matches!("#GG0000".parse::<Color>(), Err(ColorParseError::Channel { channel: "red", .. })));
        assert!(matches!("#00ZZ00".parse::<Color>(), Err(ColorParseError::Channel { channel: "green", .. })));
        assert!(matches!("#ééé".parse::<Color>(), Err(ColorParseError::Format(_))));
    }

    #[test]
    fn hex_formatting_is_uppercase() {
        assert_eq!(Color::rgb(255, 240, 220).to_hex(), "#FFF0DC");
        assert_eq!(Color::rgb(1, 2, 3).to_hex(), "#010203");
    }

    #[test]
    fn default_is_white() {
        assert_eq!(Color::default(), Color::WHITE);
        assert_eq!(Color::WHITE.to_unit(), [1.0, 1.0, 1.0]);
    }
}
