use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("hex color must be in format #RRGGBB, got {0:?}")]
    Format(String),

    #[error("invalid hex digits in {0:?}")]
    Digits(String),
}

/// Colour value applied to the light strip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB`
    pub fn from_hex(hex: &str) -> Result<Self, ColorError> {
        let digits = match hex.strip_prefix('#') {
            Some(d) if hex.len() == 7 && d.is_ascii() => d,
            _ => return Err(ColorError::Format(hex.to_string())),
        };

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| ColorError::Digits(hex.to_string()))
        };

        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Line sent to the controller firmware
    pub fn command(&self) -> String {
        format!("RGB:{},{},{}\n", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RGB({}, {}, {})", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        assert_eq!(Rgb::from_hex("#FF8040").unwrap(), Rgb::new(255, 128, 64));
        assert_eq!(Rgb::from_hex("#00ff0a").unwrap(), Rgb::new(0, 255, 10));
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert!(matches!(Rgb::from_hex("FF8040"), Err(ColorError::Format(_))));
        assert!(matches!(Rgb::from_hex("#FF80"), Err(ColorError::Format(_))));
        assert!(matches!(Rgb::from_hex("#GG8040"), Err(ColorError::Digits(_))));
        assert!(matches!(Rgb::from_hex("#ÿ8040"), Err(ColorError::Format(_))));
    }

    #[test]
    fn test_command_format() {
        let color = Rgb::new(255, 0, 12);
        assert_eq!(color.command(), "RGB:255,0,12\n");
        assert_eq!(color.to_hex(), "#FF000C");
        assert_eq!(color.to_string(), "RGB(255, 0, 12)");
    }
}
