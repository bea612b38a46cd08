// =============================================================================
// format.rs - Textes de résumé et de copie
// format.rs - Summary and copy texts
// =============================================================================

use crate::color::PickedColor;
use crate::contrast::ContrastResults;
use crate::picker::PixelPickResult;

/// Invite affichée tant qu'il n'y a pas de résultat
/// Prompt shown while there is no result
pub const PICK_PROMPT: &str = "Pick foreground, then background color…";

/// Arrondi "à la JavaScript" : les demis vont vers +∞
/// JavaScript-style rounding: halves go towards +∞
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Ratio WCAG arrondi à deux décimales, sans zéros superflus ("21", "4.5")
/// WCAG ratio rounded to two decimals, without trailing zeros ("21", "4.5")
pub fn format_wcag_ratio(ratio: f64) -> String {
    let rounded = round_half_up(ratio * 100.0) / 100.0;
    format!("{rounded}")
}

/// Magnitude APCA arrondie à l'entier / APCA magnitude rounded to an integer
pub fn format_apca(lc: f64) -> String {
    let rounded = round_half_up(lc).abs();
    format!("{rounded}")
}

/// Hex sans le dièse, pour la copie / Hex without the hash sign, for copying
pub fn copy_hex(color: &PickedColor) -> &str {
    color.hex.trim_start_matches('#')
}

fn hex_or<'a>(color: Option<&'a PickedColor>, missing: &'a str) -> &'a str {
    color.map_or(missing, |c| c.hex.as_str())
}

/// Résumé court pour l'affichage
/// Short summary for display
pub fn build_results_text(
    foreground: Option<&PickedColor>,
    background: Option<&PickedColor>,
    results: Option<&ContrastResults>,
) -> String {
    if results.is_none() {
        return PICK_PROMPT.to_string();
    }

    format!("FG: {}\nBG: {}", hex_or(foreground, "—"), hex_or(background, "—"))
}

/// Texte copié dans le presse-papiers
/// Text copied to the clipboard
pub fn build_copy_text(
    foreground: Option<&PickedColor>,
    background: Option<&PickedColor>,
    results: Option<&ContrastResults>,
) -> String {
    let fg = hex_or(foreground, "");
    let bg = hex_or(background, "");

    match results {
        None => format!("Foreground: {fg}\nBackground: {bg}\n"),
        Some(results) => [
            format!("Foreground: {fg}"),
            format!("Background: {bg}"),
            format!("WCAG: {}", format_wcag_ratio(results.wcag_ratio)),
            format!("APCA: {}", format_apca(results.apca)),
        ]
        .join("\n"),
    }
}

/// Message de succès d'une sélection / Success message of a pick
pub fn build_pick_message(result: &PixelPickResult) -> String {
    format!("{} on {}", result.foreground.hex, result.background.hex)
}

// =============================================================================
// TESTS
// =============================================================================
