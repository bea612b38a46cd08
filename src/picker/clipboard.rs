// =============================================================================
// picker/clipboard.rs - Repli presse-papiers : deux couleurs depuis du texte
// picker/clipboard.rs - Clipboard fallback: two colors from text
// =============================================================================
//
// Deux passes indépendantes, dans cet ordre :
// 1. scanner strict : sous-chaînes hexadécimales (#rgb, #rrggbb, #rrggbbaa)
// 2. découpeur permissif : segments séparés par "on", virgules, points-virgules
//    et retours à la ligne, chacun analysé comme une couleur
// Two independent passes, in this order:
// 1. strict scanner: hex substrings (#rgb, #rrggbb, #rrggbbaa)
// 2. permissive tokenizer: segments split on "on", commas, semicolons and line
//    breaks, each parsed as a color

use std::error::Error;
use std::sync::OnceLock;

use regex::Regex;

use crate::color::{parse_picked_color, PickedColor};
use crate::error::PickError;

// =============================================================================
// SERVICE PRESSE-PAPIERS
// CLIPBOARD SERVICE
// =============================================================================

pub type ClipboardResult<T> = Result<T, Box<dyn Error + Send + Sync + 'static>>;

/// Abstraction du presse-papiers, injectable pour les tests
/// Clipboard abstraction, injectable for tests
pub trait ClipboardService: Send {
    fn try_to_put_content_into_clipboard(&mut self, content: String) -> ClipboardResult<()>;
    fn try_to_get_content_from_clipboard(&mut self) -> ClipboardResult<String>;
}

#[derive(Debug, Default)]
pub struct SystemClipboard;

#[cfg(target_os = "linux")]
use copypasta_ext::{copypasta::ClipboardProvider, x11_fork::ClipboardContext};

#[cfg(not(target_os = "linux"))]
use copypasta_ext::copypasta::{ClipboardContext, ClipboardProvider};

impl ClipboardService for SystemClipboard {
    fn try_to_put_content_into_clipboard(&mut self, content: String) -> ClipboardResult<()> {
        let mut ctx = ClipboardContext::new()?;
        ctx.set_contents(content)?;
        tracing::debug!(message = "copied text to clipboard");
        Ok(())
    }

    fn try_to_get_content_from_clipboard(&mut self) -> ClipboardResult<String> {
        let mut ctx = ClipboardContext::new()?;
        let content = ctx.get_contents()?;
        Ok(content)
    }
}

pub mod test_fixtures {
    use super::{ClipboardResult, ClipboardService};

    #[derive(Debug, Default)]
    pub struct TestClipboard {
        pub content: String,
    }

    impl TestClipboard {
        pub fn with_content(content: &str) -> Self {
            Self { content: content.to_string() }
        }
    }

    impl ClipboardService for TestClipboard {
        fn try_to_put_content_into_clipboard(&mut self, content: String) -> ClipboardResult<()> {
            self.content = content;
            Ok(())
        }

        fn try_to_get_content_from_clipboard(&mut self) -> ClipboardResult<String> {
            Ok(self.content.clone())
        }
    }
}

// =============================================================================
// EXTRACTION
// =============================================================================

/// Deux couleurs extraites d'un texte / Two colors extracted from a text
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TwoColors {
    pub foreground: PickedColor,
    pub background: PickedColor,
}

fn hex_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Le plus long d'abord, sinon "#123456" donnerait "#123"
    // Longest first, otherwise "#123456" would yield "#123"
    PATTERN.get_or_init(|| {
        Regex::new(r"#(?:[0-9a-fA-F]{8}|[0-9a-fA-F]{6}|[0-9a-fA-F]{3})\b").expect("static hex pattern")
    })
}

fn on_word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)\bon\b").expect("static separator pattern"))
}

/// Passe stricte : toutes les couleurs hexadécimales, dans l'ordre
/// Strict pass: every hex color, in order of appearance
pub fn scan_hex_colors(text: &str) -> Vec<PickedColor> {
    hex_pattern()
        .find_iter(text)
        .filter_map(|found| parse_picked_color(found.as_str()).ok())
        .collect()
}

/// Passe permissive : chaque segment qui s'analyse comme une couleur
/// Permissive pass: every segment that parses as a color
pub fn tokenize_colors(text: &str) -> Vec<PickedColor> {
    let separated = on_word_pattern().replace_all(text, "\n");
    separated
        .split(['\r', '\n', ',', ';'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(|part| parse_picked_color(part).ok())
        .collect()
}

/// Extrait premier plan et arrière-plan d'un texte libre
/// Extracts foreground and background from free text
///
/// # Errors
/// [`PickError::EmptyInput`] for blank text, [`PickError::NotEnoughColors`]
/// when neither pass finds two colors.
pub fn parse_two_colors_from_text(text: &str) -> Result<TwoColors, PickError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(PickError::EmptyInput);
    }

    let mut colors = scan_hex_colors(trimmed);
    if colors.len() < 2 {
        colors = tokenize_colors(trimmed);
    }

    let mut colors = colors.into_iter();
    match (colors.next(), colors.next()) {
        (Some(foreground), Some(background)) => Ok(TwoColors { foreground, background }),
        _ => Err(PickError::NotEnoughColors),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn hexes(colors: &[PickedColor]) -> Vec<&str> {
        colors.iter().map(|c| c.hex.as_str()).collect()
    }

    #[test]
    fn test_on_separated() {
        let two = parse_two_colors_from_text("#ffffff on #000000").unwrap();
        assert_eq!(two.foreground.hex, "#ffffff");
        assert_eq!(two.background.hex, "#000000");
    }

    #[test]
    fn test_scanner_prefers_longest() {
        let colors = scan_hex_colors("text #123456, border #abc, shadow #11223344 #1234567");
        assert_eq!(hexes(&colors), ["#123456", "#aabbcc", "#112233"]);
    }

    #[test]
    fn test_scanner_inside_prose() {
        let two = parse_two_colors_from_text("color: #FFF;\nbackground-color: #333;").unwrap();
        assert_eq!(two.foreground.hex, "#ffffff");
        assert_eq!(two.background.hex, "#333333");
    }

    #[test]
    fn test_tokenizer_fallback() {
        // Les virgules séparent aussi : rgb() n'est accepté qu'avec des espaces
        // Commas also separate: rgb() only survives in its space-separated form
        let two = parse_two_colors_from_text("white ON rgb(0 0 128)").unwrap();
        assert_eq!(two.foreground.hex, "#ffffff");
        assert_eq!(two.background.hex, "#000080");

        let colors = tokenize_colors("navy; nonsense\r\n#abc, red");
        assert_eq!(hexes(&colors), ["#000080", "#aabbcc", "#ff0000"]);
    }

    #[test]
    fn test_one_hex_then_words() {
        // Une seule couleur hex : la passe permissive prend le relais
        // Only one hex color: the permissive pass takes over
        let two = parse_two_colors_from_text("#000 on white").unwrap();
        assert_eq!(two.background.hex, "#ffffff");
    }

    #[test]
    fn test_not_enough() {
        assert!(matches!(parse_two_colors_from_text("hello, world"), Err(PickError::NotEnoughColors)));
        assert!(matches!(parse_two_colors_from_text("red"), Err(PickError::NotEnoughColors)));
        assert!(matches!(parse_two_colors_from_text("onion, bonbon"), Err(PickError::NotEnoughColors)));
        assert!(matches!(parse_two_colors_from_text("  \n "), Err(PickError::EmptyInput)));
    }

    #[test]
    fn test_fixture_clipboard() {
        let mut clipboard = test_fixtures::TestClipboard::default();
        clipboard.try_to_put_content_into_clipboard("#fff\n#000".to_string()).unwrap();
        assert_eq!(clipboard.try_to_get_content_from_clipboard().unwrap(), "#fff\n#000");
    }
}
