//! Key color model and the per-pixel color predicates used by the stages

use crate::error::{MatteError, Result};
use serde::{Deserialize, Serialize};

/// Hex form of the backdrop color the generator is instructed to paint.
///
/// Prompt construction embeds this exact string, so the matte and the
/// prompt must agree on it.
pub const CHROMA_GREEN_HEX: &str = "#00FF00";

/// Largest possible Euclidean distance between two RGB colors.
pub const MAX_RGB_DISTANCE: f32 = 441.673;

/// RGB triple the matte keys on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl KeyColor {
    /// Pure chroma green, `rgb(0, 255, 0)`
    pub const CHROMA_GREEN: Self = Self::new(0, 255, 0);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` or `RRGGBB` (case-insensitive).
    ///
    /// # Errors
    /// Returns `MatteError::InvalidConfig` for anything that is not exactly
    /// six hex digits with an optional leading `#`.
    ///
    /// # Examples
    /// ```rust
    /// use pixelforge_matte::KeyColor;
    ///
    /// let key = KeyColor::from_hex("#00ff00").unwrap();
    /// assert_eq!(key, KeyColor::CHROMA_GREEN);
    /// assert!(KeyColor::from_hex("#0f0").is_err());
    /// ```
    pub fn from_hex(hex: &str) -> Result<Self> {
        let trimmed = hex.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);

        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(MatteError::invalid_config(format!(
                "Key color must be #RRGGBB, got '{}'",
                hex
            )));
        }

        let channel = |range: std::ops::Range<usize>| -> Result<u8> {
            digits
                .get(range)
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .ok_or_else(|| MatteError::invalid_config(format!("Invalid key color '{}'", hex)))
        };

        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Lenient parse that falls back to chroma green on malformed input
    #[must_use]
    pub fn from_hex_or_default(hex: &str) -> Self {
        Self::from_hex(hex).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Falling back to {}", CHROMA_GREEN_HEX);
            Self::CHROMA_GREEN
        })
    }

    /// Upper-case `#RRGGBB` form
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    #[must_use]
    pub const fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl Default for KeyColor {
    fn default() -> Self {
        Self::CHROMA_GREEN
    }
}

impl std::fmt::Display for KeyColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::str::FromStr for KeyColor {
    type Err = MatteError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for KeyColor {
    type Error = MatteError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(&value)
    }
}

impl From<KeyColor> for String {
    fn from(value: KeyColor) -> Self {
        value.to_hex()
    }
}

/// Euclidean distance between two RGB triples
#[must_use]
pub fn color_distance(a: [u8; 3], b: [u8; 3]) -> f32 {
    let sum: i32 = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = i32::from(x) - i32::from(y);
            d * d
        })
        .sum();
    (sum as f32).sqrt()
}

/// Clearly green pixel: bright green with low red and blue, well separated.
#[must_use]
pub fn is_strongly_green(r: u8, g: u8, b: u8) -> bool {
    let (r, g, b) = (u16::from(r), u16::from(g), u16::from(b));
    g > 180 && r < 100 && b < 100 && g > r + 80 && g > b + 80
}

/// Wider green test used while flooding from the border
#[must_use]
pub fn is_greenish(r: u8, g: u8, b: u8) -> bool {
    g > 150 && g > r && g > b
}

/// Blown-out highlight, treated as backdrop when found on the border
#[must_use]
pub fn is_near_white(r: u8, g: u8, b: u8) -> bool {
    r > 240 && g > 240 && b > 240
}

/// Green tint strong enough to warrant despill on a matte edge
#[must_use]
pub fn has_green_spill(r: u8, g: u8, b: u8) -> bool {
    u16::from(g) > u16::from(r.max(b)) + 30
}

/// Edge pixel that is mostly backdrop and should be dropped
#[must_use]
pub fn is_severe_spill(r: u8, g: u8, b: u8) -> bool {
    g > 200 && r < 80 && b < 80
}

/// Green channel after despill: clamped to the red/blue midpoint plus a margin
#[must_use]
pub fn despilled_green(r: u8, g: u8, b: u8) -> u8 {
    let midpoint = (u16::from(r) + u16::from(b)) / 2;
    let ceiling = midpoint + 30;
    u16::from(g).min(ceiling) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_distance() {
        assert!(color_distance([0, 255, 0], [0, 255, 0]).abs() < f32::EPSILON);
        assert!((color_distance([0, 0, 0], [3, 4, 0]) - 5.0).abs() < 1e-6);
        let max = color_distance([0, 0, 0], [255, 255, 255]);
        assert!(max <= MAX_RGB_DISTANCE);
        assert!(MAX_RGB_DISTANCE - max < 0.01);
    }

    #[test]
    fn test_hex_parsing() {
        assert_eq!(KeyColor::from_hex("#00FF00").unwrap(), KeyColor::CHROMA_GREEN);
        assert_eq!(KeyColor::from_hex("00ff00").unwrap(), KeyColor::CHROMA_GREEN);
        assert_eq!(
            KeyColor::from_hex(" #1a2B3c ").unwrap(),
            KeyColor::new(0x1a, 0x2b, 0x3c)
        );
        assert!(KeyColor::from_hex("").is_err());
        assert!(KeyColor::from_hex("#00FF0").is_err());
        assert!(KeyColor::from_hex("#00FF00FF").is_err());
        assert!(KeyColor::from_hex("#GG0000").is_err());
    }

    #[test]
    fn test_lenient_parse_falls_back() {
        assert_eq!(KeyColor::from_hex_or_default("nope"), KeyColor::CHROMA_GREEN);
        assert_eq!(
            KeyColor::from_hex_or_default("#0000FF"),
            KeyColor::new(0, 0, 255)
        );
    }

    #[test]
    fn test_hex_roundtrip_through_serde() {
        let key = KeyColor::new(255, 0, 128);
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"#FF0080\"");
        let parsed: KeyColor = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, key);
        assert!(serde_json::from_str::<KeyColor>("\"red\"").is_err());
    }

    #[test]
    fn test_strongly_green_boundaries() {
        assert!(is_strongly_green(10, 220, 10));
        // green must exceed 180
        assert!(!is_strongly_green(10, 180, 10));
        // red and blue must stay below 100
        assert!(!is_strongly_green(100, 255, 10));
        assert!(is_strongly_green(99, 181, 99));
        assert!(!is_strongly_green(20, 190, 100));
        // no overflow at the top of the range
        assert!(is_strongly_green(0, 255, 0));
    }

    #[test]
    fn test_greenish_and_near_white() {
        assert!(is_greenish(120, 200, 110));
        assert!(!is_greenish(200, 200, 10));
        assert!(!is_greenish(0, 150, 0));
        assert!(is_near_white(241, 241, 241));
        assert!(!is_near_white(240, 255, 255));
    }

    #[test]
    fn test_despill_helpers() {
        assert!(has_green_spill(90, 150, 80));
        assert!(!has_green_spill(90, 120, 80));
        assert!(!has_green_spill(255, 255, 255));
        assert_eq!(despilled_green(90, 150, 80), 115);
        assert_eq!(despilled_green(255, 255, 255), 255);
        assert_eq!(despilled_green(10, 20, 10), 20);
        assert!(is_severe_spill(10, 220, 10));
        assert!(!is_severe_spill(80, 220, 10));
    }
}
