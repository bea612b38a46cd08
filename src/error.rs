// =============================================================================
// error.rs - Taxonomie des erreurs / Error taxonomy
// =============================================================================

use std::path::PathBuf;

use serde::{Serialize, Serializer};

use crate::picker::Platform;

/// Error returned when a text is not a recognized color
/// Erreur retournée quand un texte n'est pas une couleur reconnue
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty color")]
    Empty,

    #[error("unrecognized color: {0}")]
    Unrecognized(String),
}

/// Failure kinds of one pick session
/// Types d'échec d'une session de sélection
#[derive(thiserror::Error, Debug)]
pub enum PickError {
    /// The clipboard was empty or blank
    #[error("Empty clipboard")]
    EmptyInput,

    /// The clipboard text held fewer than two colors
    #[error("Not enough colors")]
    NotEnoughColors,

    /// The helper executable or script could not be found
    #[error("Missing pixel picker helper: {}", helper.display())]
    HelperMissing { helper: PathBuf },

    /// The user pressed Esc (exit code 2)
    #[error("PICKER_CANCELED")]
    Canceled,

    /// Exit code 4, or the watchdog had to kill the helper
    #[error("PICKER_TIMEOUT")]
    TimedOut,

    /// Any other exit, carrying the helper's diagnostic text
    #[error("{0}")]
    HelperFailed(String),

    /// The system clipboard could not be read
    #[error("Clipboard unavailable: {0}")]
    Clipboard(String),

    #[error("Invalid picker configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Flat tag of a [`PickError`], cheap to clone into events
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PickErrorKind {
    EmptyInput,
    NotEnoughColors,
    HelperMissing,
    Canceled,
    TimedOut,
    HelperFailed,
    Clipboard,
    Config,
    Io,
}

impl PickError {
    pub fn kind(&self) -> PickErrorKind {
        match self {
            Self::EmptyInput => PickErrorKind::EmptyInput,
            Self::NotEnoughColors => PickErrorKind::NotEnoughColors,
            Self::HelperMissing { .. } => PickErrorKind::HelperMissing,
            Self::Canceled => PickErrorKind::Canceled,
            Self::TimedOut => PickErrorKind::TimedOut,
            Self::HelperFailed(_) => PickErrorKind::HelperFailed,
            Self::Clipboard(_) => PickErrorKind::Clipboard,
            Self::Config(_) => PickErrorKind::Config,
            Self::Io(_) => PickErrorKind::Io,
        }
    }

    pub fn is_cancel(&self) -> bool {
        matches!(self, Self::Canceled)
    }

    /// Short title for a notice
    /// Titre court pour une notification
    pub fn title(&self) -> &'static str {
        match self {
            Self::Canceled => "Canceled",
            Self::EmptyInput | Self::NotEnoughColors | Self::Clipboard(_) => {
                "Clipboard doesn't contain two colors"
            }
            _ => "Failed to pick pixels",
        }
    }

    /// Actionable message for the user on the given platform
    /// Message actionnable pour l'utilisateur sur la plateforme donnée
    pub fn remediation(&self, platform: Platform) -> String {
        match self {
            Self::Canceled => return "Press “Pick two pixels” to try again.".to_string(),
            Self::EmptyInput | Self::NotEnoughColors | Self::Clipboard(_) => {
                return "Copy two colors like “#ffffff\n#000000” or “#ffffff on #000000”, then run “Pick two pixels” again."
                    .to_string();
            }
            _ => {}
        }

        let msg = self.to_string();
        match platform {
            Platform::Windows => windows_remediation(self, msg),
            Platform::MacOs => macos_remediation(self, msg),
            Platform::Other => msg,
        }
    }
}

fn windows_remediation(err: &PickError, msg: String) -> String {
    if let PickError::HelperMissing { .. } = err {
        return "Windows helper is missing: put win.exe or win.ps1 in the assets directory, then try again."
            .to_string();
    }

    // Le helper .NET échoue sans le runtime Desktop
    // The .NET helper fails without the Desktop runtime
    let needs_dotnet = [
        "You must install or update .NET to run this application.",
        "The specified framework",
        "Microsoft.WindowsDesktop.App",
        "hostfxr.dll",
    ]
    .iter()
    .any(|marker| msg.contains(marker));

    if needs_dotnet {
        return "Windows helper requires the .NET Desktop Runtime (x64). Install it, then restart and try again."
            .to_string();
    }

    msg
}

fn macos_remediation(err: &PickError, msg: String) -> String {
    match err {
        PickError::HelperMissing { .. } => {
            "Build the macOS helper: run scripts/build-mac.sh (on a Mac), then try again.".to_string()
        }
        PickError::TimedOut => {
            "Timed out waiting for two clicks. Run “Pick two pixels”, then click foreground, then background."
                .to_string()
        }
        _ if msg.contains("Accessibility permission") || msg.contains("event tap") => {
            "Grant Accessibility permission (System Settings → Privacy & Security → Accessibility), then try again."
                .to_string()
        }
        _ if msg.contains("Screen Recording") => {
            "Grant Screen Recording permission (System Settings → Privacy & Security → Screen Recording), then try again."
                .to_string()
        }
        _ => msg,
    }
}

// Les erreurs traversent la frontière hôte sous forme de texte
// Errors cross the host boundary as plain text
impl Serialize for PickError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl Serialize for ParseError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

// =============================================================================
// TESTS
// =============================================================================
