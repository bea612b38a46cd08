//! =============================================================================
//! COMMON.RS - Types partagés entre les stratégies de sélection
//! COMMON.RS - Types shared between pick strategies
//! =============================================================================
//!
//! Ce module contient les résultats, la progression et les événements d'une
//! session de sélection.
//! This module contains the results, progress and events of a pick session.

use serde::{Deserialize, Serialize};

use crate::error::PickErrorKind;

// =============================================================================
// STRUCTURES DE RÉSULTAT
// RESULT STRUCTURES
// =============================================================================

/// Un pixel sélectionné / One picked pixel
///
/// `x` and `y` are in the helper's coordinate space and passed through as is.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PickedPixel {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    pub hex: String,
}

/// Résultat complet d'une sélection de deux pixels
/// Complete result of a two-pixel pick
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PixelPickResult {
    pub foreground: PickedPixel,
    pub background: PickedPixel,
}

/// Pixel partiellement connu dans une ligne de progression
/// Partially known pixel in a progress line
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct PartialPixel {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub hex: Option<String>,
}

impl PartialPixel {
    /// Hex non vide, si présent / Non-empty hex, if present
    pub fn hex(&self) -> Option<&str> {
        self.hex.as_deref().filter(|hex| !hex.trim().is_empty())
    }

    fn complete(&self) -> Option<PickedPixel> {
        Some(PickedPixel {
            x: self.x.unwrap_or_default(),
            y: self.y.unwrap_or_default(),
            hex: self.hex()?.to_string(),
        })
    }
}

/// Progression d'une sélection : l'un ou l'autre côté peut manquer
/// Pick progress: either side may still be missing
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct PickProgress {
    pub foreground: Option<PartialPixel>,
    pub background: Option<PartialPixel>,
}

impl PickProgress {
    /// Analyse une ligne NDJSON du helper ; `None` si la ligne est invalide
    /// Parses one NDJSON line from the helper; `None` for malformed lines
    pub fn from_line(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }
        serde_json::from_str(trimmed).ok()
    }

    /// Résultat final si les deux couleurs sont présentes
    /// Final result when both colors are present
    pub fn complete(&self) -> Option<PixelPickResult> {
        Some(PixelPickResult {
            foreground: self.foreground.as_ref()?.complete()?,
            background: self.background.as_ref()?.complete()?,
        })
    }
}

// =============================================================================
// ÉVÉNEMENTS
// EVENTS
// =============================================================================

/// Événement émis par l'orchestrateur vers l'appelant
/// Event sent by the orchestrator to its caller
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PickEvent {
    /// Interactive picking started: click foreground, then background, Esc to cancel
    Started,

    /// A partial line from the helper
    Progress(PickProgress),

    /// Terminal event: both colors are known
    Resolved(PixelPickResult),

    /// Two colors loaded from the clipboard (no coordinates)
    Loaded { foreground: String, background: String },

    /// The session ended without a result
    Failed { kind: PickErrorKind, message: String },
}

// =============================================================================
// ÉTAT AFFICHÉ
// DISPLAYED STATE
// =============================================================================

/// Couleurs actuellement affichées par l'hôte
/// Colors currently displayed by the host
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PickDisplay {
    pub foreground: Option<String>,
    pub background: Option<String>,
    pub is_picking: bool,
}

impl PickDisplay {
    pub fn apply_progress(&mut self, progress: &PickProgress) {
        if let Some(hex) = progress.foreground.as_ref().and_then(PartialPixel::hex) {
            self.foreground = Some(hex.to_string());
        }
        if let Some(hex) = progress.background.as_ref().and_then(PartialPixel::hex) {
            self.background = Some(hex.to_string());
        }
    }

    pub fn apply_result(&mut self, result: &PixelPickResult) {
        self.foreground = Some(result.foreground.hex.clone());
        self.background = Some(result.background.hex.clone());
    }

    /// Échange les couleurs, seulement si les deux sont présentes
    /// Swaps the colors, only when both are set
    pub fn swap(&mut self) -> bool {
        if self.foreground.is_none() || self.background.is_none() {
            return false;
        }
        std::mem::swap(&mut self.foreground, &mut self.background);
        true
    }

    pub fn clear(&mut self) {
        self.foreground = None;
        self.background = None;
    }
}

// =============================================================================
// TESTS
// =============================================================================
