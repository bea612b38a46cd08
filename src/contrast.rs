// =============================================================================
// contrast.rs - Calculs de contraste WCAG 2.1 et APCA
// contrast.rs - WCAG 2.1 and APCA contrast computations
// =============================================================================

use serde::Serialize;

use crate::color::PickedColor;

/// Composantes RGB 8 bits / 8-bit RGB components
pub type Rgb8 = (u8, u8, u8);

// =============================================================================
// CONSTANTES APCA (APCA-W3 0.0.98G-4g)
// APCA CONSTANTS (APCA-W3 0.0.98G-4g)
// =============================================================================

const APCA_MAIN_TRC: f64 = 2.4;
const APCA_R_CO: f64 = 0.2126729;
const APCA_G_CO: f64 = 0.7151522;
const APCA_B_CO: f64 = 0.0721750;

const APCA_NORM_BG: f64 = 0.56;
const APCA_NORM_TXT: f64 = 0.57;
const APCA_REV_TXT: f64 = 0.62;
const APCA_REV_BG: f64 = 0.65;

const APCA_BLK_THRS: f64 = 0.022;
const APCA_BLK_CLMP: f64 = 1.414;
const APCA_SCALE_BOW: f64 = 1.14;
const APCA_SCALE_WOB: f64 = 1.14;
const APCA_LO_BOW_OFFSET: f64 = 0.027;
const APCA_LO_WOB_OFFSET: f64 = 0.027;
const APCA_DELTA_Y_MIN: f64 = 0.0005;
const APCA_LO_CLIP: f64 = 0.1;

// =============================================================================
// RÉSULTATS
// RESULTS
// =============================================================================

/// Résultats de contraste pour une paire de couleurs
/// Contrast results for a color pair
#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContrastResults {
    /// Ratio WCAG 2.1, entre 1 et 21 / WCAG 2.1 ratio, between 1 and 21
    pub wcag_ratio: f64,

    /// APCA Lc, signé selon la polarité / APCA Lc, signed by polarity
    pub apca: f64,
}

/// Calcule les deux métriques pour un texte et son fond
/// Computes both metrics for a text color and its background
pub fn compute_contrast(foreground: &PickedColor, background: &PickedColor) -> ContrastResults {
    ContrastResults {
        wcag_ratio: wcag_ratio(foreground.srgb8bit, background.srgb8bit),
        apca: apca_lc(foreground.srgb8bit, background.srgb8bit),
    }
}

// =============================================================================
// WCAG 2.1
// =============================================================================

fn wcag_linearize(channel: u8) -> f64 {
    let c = f64::from(channel) / 255.0;
    if c <= 0.03928 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Luminance relative WCAG 2.1 d'une couleur
/// WCAG 2.1 relative luminance of a color
pub fn relative_luminance((r, g, b): Rgb8) -> f64 {
    0.2126 * wcag_linearize(r) + 0.7152 * wcag_linearize(g) + 0.0722 * wcag_linearize(b)
}

/// Ratio de contraste WCAG 2.1, indépendant de l'ordre
/// WCAG 2.1 contrast ratio, independent of argument order
pub fn wcag_ratio(a: Rgb8, b: Rgb8) -> f64 {
    let la = relative_luminance(a);
    let lb = relative_luminance(b);
    let (lighter, darker) = if la >= lb { (la, lb) } else { (lb, la) };
    (lighter + 0.05) / (darker + 0.05)
}

// =============================================================================
// APCA
// =============================================================================

fn apca_screen_luminance((r, g, b): Rgb8) -> f64 {
    let trc = |c: u8| (f64::from(c) / 255.0).powf(APCA_MAIN_TRC);
    APCA_R_CO * trc(r) + APCA_G_CO * trc(g) + APCA_B_CO * trc(b)
}

// Adoucit les noirs proches de zéro / Soft clamp near black
fn apca_soft_clamp(y: f64) -> f64 {
    if y > APCA_BLK_THRS {
        y
    } else {
        y + (APCA_BLK_THRS - y).powf(APCA_BLK_CLMP)
    }
}

/// Contraste APCA (Lc) d'un texte sur un fond
/// APCA lightness contrast (Lc) of a text color over a background
///
/// Positive for dark text on a light background, negative for light text on
/// a dark background. The order of the arguments matters.
pub fn apca_lc(text: Rgb8, background: Rgb8) -> f64 {
    let txt_y = apca_soft_clamp(apca_screen_luminance(text));
    let bg_y = apca_soft_clamp(apca_screen_luminance(background));

    if (bg_y - txt_y).abs() < APCA_DELTA_Y_MIN {
        return 0.0;
    }

    let output = if bg_y > txt_y {
        // Texte sombre sur fond clair / Dark text on light background
        let sapc = (bg_y.powf(APCA_NORM_BG) - txt_y.powf(APCA_NORM_TXT)) * APCA_SCALE_BOW;
        if sapc < APCA_LO_CLIP {
            0.0
        } else {
            sapc - APCA_LO_BOW_OFFSET
        }
    } else {
        // Texte clair sur fond sombre / Light text on dark background
        let sapc = (bg_y.powf(APCA_REV_BG) - txt_y.powf(APCA_REV_TXT)) * APCA_SCALE_WOB;
        if sapc > -APCA_LO_CLIP {
            0.0
        } else {
            sapc + APCA_LO_WOB_OFFSET
        }
    };

    output * 100.0
}

// =============================================================================
// RÉSUMÉS
// SUMMARIES
// =============================================================================

/// Tonalité d'une étiquette de résultat / Tone of a result tag
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TagTone {
    Pass,
    Warn,
    Fail,
}

/// Niveaux de conformité WCAG / WCAG conformance levels
#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WcagSummary {
    pub ratio: f64,
    pub aa_normal: bool,
    pub aaa_normal: bool,
    pub aa_large: bool,
    pub aaa_large: bool,
}

impl WcagSummary {
    pub fn from_ratio(ratio: f64) -> Self {
        Self {
            ratio,
            aa_normal: ratio >= 4.5,
            aaa_normal: ratio >= 7.0,
            aa_large: ratio >= 3.0,
            aaa_large: ratio >= 4.5,
        }
    }

    /// Étiquette pour le texte normal / Tag for normal text
    pub fn normal_tag(&self) -> (&'static str, TagTone) {
        let text = if self.aaa_normal { "AAA normal" } else { "AA normal" };
        (text, pass_or_fail(self.aa_normal))
    }

    /// Étiquette pour le grand texte / Tag for large text
    pub fn large_tag(&self) -> (&'static str, TagTone) {
        let text = if self.aaa_large { "AAA large" } else { "AA large" };
        (text, pass_or_fail(self.aa_large))
    }
}

fn pass_or_fail(pass: bool) -> TagTone {
    if pass {
        TagTone::Pass
    } else {
        TagTone::Fail
    }
}

/// Palier d'usage APCA selon |Lc| / APCA usage tier by |Lc|
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum ApcaLevel {
    Invisible,
    NonText,
    UiComponents,
    Headlines,
    ContentText,
    BodyText,
    PreferredBodyText,
}

impl ApcaLevel {
    pub fn from_lc(lc: f64) -> Self {
        match lc.abs() {
            abs if abs >= 90.0 => Self::PreferredBodyText,
            abs if abs >= 75.0 => Self::BodyText,
            abs if abs >= 60.0 => Self::ContentText,
            abs if abs >= 45.0 => Self::Headlines,
            abs if abs >= 30.0 => Self::UiComponents,
            abs if abs >= 15.0 => Self::NonText,
            _ => Self::Invisible,
        }
    }

    pub fn word(self) -> &'static str {
        match self {
            Self::PreferredBodyText => "Body text (preferred)",
            Self::BodyText => "Body text",
            Self::ContentText => "Content text",
            Self::Headlines => "Headlines",
            Self::UiComponents => "UI components",
            Self::NonText => "Non-text only",
            Self::Invisible => "Not readable",
        }
    }

    pub fn tone(self) -> TagTone {
        match self {
            Self::PreferredBodyText | Self::BodyText | Self::ContentText => TagTone::Pass,
            Self::Headlines | Self::UiComponents => TagTone::Warn,
            Self::NonText | Self::Invisible => TagTone::Fail,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
