// =============================================================================
// color.rs - Analyse et normalisation des couleurs
// color.rs - Color parsing and normalization
// =============================================================================

use bigcolor::BigColor;
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Couleur analysée, sous forme canonique
/// Parsed color, in canonical form
///
/// `hex` is always `#rrggbb` in lowercase and `srgb8bit` is its exact channel
/// decomposition. Alpha, when the input had one, is dropped.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PickedColor {
    /// Texte d'origine (après suppression des espaces)
    /// Original text (trimmed)
    pub input: String,

    /// Forme canonique "#rrggbb"
    /// Canonical "#rrggbb" form
    pub hex: String,

    /// Composantes RGB 8 bits
    /// 8-bit RGB components
    #[serde(rename = "srgb8bit")]
    pub srgb8bit: (u8, u8, u8),
}

impl PickedColor {
    fn from_rgb(input: &str, (r, g, b): (u8, u8, u8)) -> Self {
        Self {
            input: input.to_string(),
            hex: format_hex(r, g, b),
            srgb8bit: (r, g, b),
        }
    }

    /// Si la couleur est sombre (le texte posé dessus doit être clair)
    /// If the color is dark (text drawn over it should be light)
    pub fn is_dark(&self) -> bool {
        let (r, g, b) = self.srgb8bit;
        BigColor::from_rgb(r, g, b, 1.0).is_dark()
    }
}

/// Formate une couleur RGB en "#rrggbb"
/// Formats an RGB color as "#rrggbb"
#[inline]
pub fn format_hex(r: u8, g: u8, b: u8) -> String {
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

/// Analyse un texte de couleur
/// Parses a color text
///
/// Accepts `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb()`/`rgba()` and the
/// CSS 2.1 basic color names. Surrounding whitespace is ignored.
///
/// # Errors
/// [`ParseError::Empty`] for blank input, [`ParseError::Unrecognized`] for
/// anything outside the grammar.
pub fn parse_picked_color(text: &str) -> Result<PickedColor, ParseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }

    let rgb = parse_hex(trimmed)
        .or_else(|| parse_rgb_function(trimmed))
        .or_else(|| named_color(trimmed))
        .ok_or_else(|| ParseError::Unrecognized(trimmed.to_string()))?;

    Ok(PickedColor::from_rgb(trimmed, rgb))
}

fn parse_hex(text: &str) -> Option<(u8, u8, u8)> {
    let digits = text.strip_prefix('#')?;
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match digits.len() {
        // #rgb / #rgba : chaque chiffre est dupliqué
        // #rgb / #rgba: each digit is doubled
        3 | 4 => {
            let short = |i: usize| channel(&digits[i..=i].repeat(2));
            Some((short(0)?, short(1)?, short(2)?))
        }
        6 | 8 => Some((channel(&digits[0..2])?, channel(&digits[2..4])?, channel(&digits[4..6])?)),
        _ => None,
    }
}

fn parse_rgb_function(text: &str) -> Option<(u8, u8, u8)> {
    let lower = text.to_ascii_lowercase();
    let body = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))?
        .strip_suffix(')')?;

    let parts: Vec<&str> = body
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect();

    match parts.as_slice() {
        [r, g, b] => Some((rgb_channel(r)?, rgb_channel(g)?, rgb_channel(b)?)),
        [r, g, b, a] => {
            // Alpha validé puis ignoré / Alpha validated then ignored
            alpha_channel(a)?;
            Some((rgb_channel(r)?, rgb_channel(g)?, rgb_channel(b)?))
        }
        _ => None,
    }
}

fn rgb_channel(part: &str) -> Option<u8> {
    let value = match part.strip_suffix('%') {
        Some(percent) => {
            let p: f64 = percent.parse().ok()?;
            if !(0.0..=100.0).contains(&p) {
                return None;
            }
            p * 255.0 / 100.0
        }
        None => {
            let v: f64 = part.parse().ok()?;
            if !(0.0..=255.0).contains(&v) {
                return None;
            }
            v
        }
    };
    Some(value.round() as u8)
}

fn alpha_channel(part: &str) -> Option<f64> {
    let value = match part.strip_suffix('%') {
        Some(percent) => percent.parse::<f64>().ok()? / 100.0,
        None => part.parse().ok()?,
    };
    (0.0..=1.0).contains(&value).then_some(value)
}

/// Couleurs nommées CSS 2.1 / CSS 2.1 basic named colors
const NAMED_COLORS: [(&str, (u8, u8, u8)); 17] = [
    ("aqua", (0x00, 0xff, 0xff)),
    ("black", (0x00, 0x00, 0x00)),
    ("blue", (0x00, 0x00, 0xff)),
    ("fuchsia", (0xff, 0x00, 0xff)),
    ("gray", (0x80, 0x80, 0x80)),
    ("green", (0x00, 0x80, 0x00)),
    ("lime", (0x00, 0xff, 0x00)),
    ("maroon", (0x80, 0x00, 0x00)),
    ("navy", (0x00, 0x00, 0x80)),
    ("olive", (0x80, 0x80, 0x00)),
    ("orange", (0xff, 0xa5, 0x00)),
    ("purple", (0x80, 0x00, 0x80)),
    ("red", (0xff, 0x00, 0x00)),
    ("silver", (0xc0, 0xc0, 0xc0)),
    ("teal", (0x00, 0x80, 0x80)),
    ("white", (0xff, 0xff, 0xff)),
    ("yellow", (0xff, 0xff, 0x00)),
];

fn named_color(text: &str) -> Option<(u8, u8, u8)> {
    NAMED_COLORS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(text))
        .map(|&(_, rgb)| rgb)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_hex_forms() {
        assert_eq!(parse_picked_color("#abc").unwrap().hex, "#aabbcc");
        assert_eq!(parse_picked_color("  #FF0080 ").unwrap().hex, "#ff0080");
        assert_eq!(parse_picked_color("#ff008080").unwrap().hex, "#ff0080");
        assert_eq!(parse_picked_color("#f08c").unwrap().hex, "#ff0088");
        assert_eq!(parse_picked_color("#123456").unwrap().srgb8bit, (0x12, 0x34, 0x56));
    }

    #[test]
    fn test_input_is_kept_trimmed() {
        let color = parse_picked_color("\t#ABC\n").unwrap();
        assert_eq!(color.input, "#ABC");
    }

    #[test]
    fn test_rgb_function() {
        assert_eq!(parse_picked_color("rgb(255, 0, 128)").unwrap().hex, "#ff0080");
        assert_eq!(parse_picked_color("RGBA(0,0,0,0.5)").unwrap().hex, "#000000");
        assert_eq!(parse_picked_color("rgb(100% 50% 0% / 20%)").unwrap().srgb8bit, (255, 128, 0));
        assert!(parse_picked_color("rgb(256, 0, 0)").is_err());
        assert!(parse_picked_color("rgb(1, 2)").is_err());
        assert!(parse_picked_color("rgba(1, 2, 3, 4)").is_err());
    }

    #[test]
    fn test_named() {
        assert_eq!(parse_picked_color("White").unwrap().hex, "#ffffff");
        assert_eq!(parse_picked_color("orange").unwrap().srgb8bit, (255, 165, 0));
    }

    #[test]
    fn test_rejects() {
        assert_eq!(parse_picked_color("   "), Err(ParseError::Empty));
        assert_eq!(
            parse_picked_color("#12345"),
            Err(ParseError::Unrecognized("#12345".to_string()))
        );
        assert!(parse_picked_color("#ggg").is_err());
        assert!(parse_picked_color("abc").is_err());
        assert!(parse_picked_color("#ffffff on #000000").is_err());
    }

    #[test]
    fn test_is_dark() {
        assert!(parse_picked_color("#000000").unwrap().is_dark());
        assert!(!parse_picked_color("#ffffff").unwrap().is_dark());
    }

    proptest! {
        #[test]
        fn prop_short_hex_expands(r in 0u8..16, g in 0u8..16, b in 0u8..16) {
            let input = format!("#{:x}{:x}{:x}", r, g, b);
            let expected = format!("#{0:x}{0:x}{1:x}{1:x}{2:x}{2:x}", r, g, b);
            prop_assert_eq!(parse_picked_color(&input).unwrap().hex, expected);
        }

        #[test]
        fn prop_six_digit_is_idempotent(r: u8, g: u8, b: u8, upper: bool) {
            let mut input = format!("#{:02x}{:02x}{:02x}", r, g, b);
            if upper {
                input = input.to_uppercase();
            }
            let once = parse_picked_color(&input).unwrap();
            let twice = parse_picked_color(&once.hex).unwrap();
            prop_assert_eq!(&once.hex, &twice.hex);
            prop_assert_eq!(once.srgb8bit, (r, g, b));
            prop_assert_eq!(once.hex.len(), 7);
        }
    }
}
