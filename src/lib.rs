// =============================================================================
// lib.rs - Sélection de deux pixels et mesure de contraste
// lib.rs - Two-pixel picking and contrast measurement
// =============================================================================
//
// Flux de données / Data flow:
// PickOrchestrator -> PixelPickResult -> parse_picked_color -> compute_contrast
// -> build_results_text / build_copy_text

// =============================================================================
// MODULES
// =============================================================================

/// Configuration partagée (constantes et fichier de configuration)
/// Shared configuration (constants and configuration file)
pub mod config;

/// Taxonomie des erreurs / Error taxonomy
pub mod error;

/// Analyse des couleurs / Color parsing
pub mod color;

/// Contraste WCAG 2.1 et APCA / WCAG 2.1 and APCA contrast
pub mod contrast;

/// Textes de résumé et de copie / Summary and copy texts
pub mod format;

/// Orchestration de la sélection / Pick orchestration
pub mod picker;

/// Sélection mémorisée / Remembered pick
pub mod store;

/// Plugin Tauri (surface de commandes hôte)
/// Tauri plugin (host command surface)
#[cfg(feature = "tauri")]
pub mod plugin;

// =============================================================================
// SURFACE PUBLIQUE
// PUBLIC SURFACE
// =============================================================================

pub use color::{parse_picked_color, PickedColor};
pub use config::PickerConfig;
pub use contrast::{apca_lc, compute_contrast, wcag_ratio, ApcaLevel, ContrastResults, WcagSummary};
pub use error::{ParseError, PickError, PickErrorKind};
pub use format::{build_copy_text, build_pick_message, build_results_text};
pub use picker::{PickDisplay, PickEvent, PickOrchestrator, PickStrategy, PixelPickResult, Platform};
pub use store::RememberedPickStore;

/// Couleurs et contraste d'une sélection complète
/// Colors and contrast of a complete pick
///
/// # Errors
/// [`ParseError`] when the helper reported a hex that is not a color.
pub fn evaluate_pick(pick: &PixelPickResult) -> Result<(PickedColor, PickedColor, ContrastResults), ParseError> {
    let foreground = parse_picked_color(&pick.foreground.hex)?;
    let background = parse_picked_color(&pick.background.hex)?;
    let results = compute_contrast(&foreground, &background);
    Ok((foreground, background, results))
}

/// Couleurs et contraste de l'état affiché ; `None` pour un côté manquant ou invalide
/// Colors and contrast of the displayed state; `None` for a missing or invalid side
pub fn evaluate_display(
    display: &PickDisplay,
) -> (Option<PickedColor>, Option<PickedColor>, Option<ContrastResults>) {
    let parse = |hex: &Option<String>| hex.as_deref().and_then(|h| parse_picked_color(h).ok());
    let foreground = parse(&display.foreground);
    let background = parse(&display.background);
    let results = match (&foreground, &background) {
        (Some(fg), Some(bg)) => Some(compute_contrast(fg, bg)),
        _ => None,
    };
    (foreground, background, results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::picker::PickedPixel;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_evaluate_pick() {
        let pick = PixelPickResult {
            foreground: PickedPixel { x: 1.0, y: 1.0, hex: "#FFF".into() },
            background: PickedPixel { x: 2.0, y: 2.0, hex: "#000000".into() },
        };
        let (fg, bg, results) = evaluate_pick(&pick).unwrap();
        assert_eq!(fg.hex, "#ffffff");
        assert_eq!(bg.srgb8bit, (0, 0, 0));
        assert!(results.apca < -100.0);
        assert_eq!(build_copy_text(Some(&fg), Some(&bg), Some(&results)).lines().last(), Some("APCA: 108"));
    }

    #[test]
    fn test_evaluate_display() {
        let display = PickDisplay { foreground: Some("#777".into()), background: Some("oops".into()), is_picking: false };
        let (fg, bg, results) = evaluate_display(&display);
        assert_eq!(fg.map(|c| c.hex), Some("#777777".to_string()));
        assert!(bg.is_none());
        assert!(results.is_none());
    }
}
