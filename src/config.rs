//! Configuration constants shared across all platforms
//!
//! These values control how the pixel picker helper is launched and supervised.
//! Ces valeurs contrôlent le lancement et la supervision du helper de sélection.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::PickError;

// =============================================================================
// CONSTANTES
// CONSTANTS
// =============================================================================

/// Budget given to the helper for two clicks (in milliseconds)
/// Budget accordé au helper pour les deux clics (en millisecondes)
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Extra time before the watchdog kills the helper
/// The helper enforces its own timeout; this is only a safety net.
/// Délai supplémentaire avant que le chien de garde ne tue le helper
pub const WATCHDOG_GRACE_MS: u64 = 5_000;

/// Helper exit code: the user pressed Esc
/// Code de sortie : l'utilisateur a appuyé sur Échap
pub const EXIT_CODE_CANCELED: i32 = 2;

/// Helper exit code: the helper's internal timeout expired
/// Code de sortie : le délai interne du helper a expiré
pub const EXIT_CODE_TIMED_OUT: i32 = 4;

/// macOS helper binary name, looked up in the assets directory
pub const MAC_HELPER_NAME: &str = "pixel-picker-mac";

/// Windows helper binary name
pub const WINDOWS_HELPER_NAME: &str = "win.exe";

/// Windows script fallback, run through PowerShell when the binary is missing
/// Script de repli Windows, lancé via PowerShell si le binaire est absent
pub const WINDOWS_SCRIPT_NAME: &str = "win.ps1";

/// PowerShell executable used for the script fallback
pub const POWERSHELL_EXE: &str = "powershell.exe";

/// Prefix of the temporary result file handed to the helper with `--out`
/// Préfixe du fichier de résultat temporaire passé au helper avec `--out`
pub const RESULT_FILE_PREFIX: &str = "pixel-picker-result-";

/// File name of the remembered pick inside the support directory
pub const REMEMBERED_PICK_FILE: &str = "remembered-pick.json";

/// Capacity of the event channel returned by `PickOrchestrator::event_channel`
pub const EVENT_CHANNEL_CAPACITY: usize = 32;

/// How long stderr is drained after the helper exited (in milliseconds)
/// A helper that forked children may keep the pipe open forever.
pub const STDERR_DRAIN_MS: u64 = 1_000;

/// Directory name used under the platform data directory
pub const APP_DIR_NAME: &str = "pixel-contrast";

// =============================================================================
// CONFIGURATION CHARGEABLE
// LOADABLE CONFIGURATION
// =============================================================================

/// Runtime configuration of the picker
/// Configuration d'exécution du sélecteur
///
/// Every field is optional in JSON; missing fields fall back to [`Default`].
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct PickerConfig {
    /// Timeout passed to the helper with `--timeout-ms`
    pub timeout_ms: u64,

    /// Added to `timeout_ms` to arm the watchdog
    pub watchdog_grace_ms: u64,

    /// Directory holding the helper binaries and scripts
    /// Répertoire contenant les binaires et scripts du helper
    pub assets_dir: PathBuf,

    /// Writable directory for result files and the remembered pick
    /// Répertoire accessible en écriture pour les résultats et la sélection mémorisée
    pub support_dir: PathBuf,
}

impl Default for PickerConfig {
    fn default() -> Self {
        let base = dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(APP_DIR_NAME);
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            watchdog_grace_ms: WATCHDOG_GRACE_MS,
            assets_dir: base.join("assets"),
            support_dir: base.join("support"),
        }
    }
}

impl PickerConfig {
    /// Parses a configuration from a JSON document
    /// Analyse une configuration depuis un document JSON
    ///
    /// # Errors
    /// Returns [`PickError::Config`] when the document is not valid JSON or a
    /// field has the wrong type.
    pub fn from_json_str(text: &str) -> Result<Self, PickError> {
        serde_json::from_str(text).map_err(|err| PickError::Config(err.to_string()))
    }

    /// Loads the configuration file, or the defaults if it does not exist
    ///
    /// # Errors
    /// Returns [`PickError::Io`] on read failures other than "not found", and
    /// [`PickError::Config`] on invalid content.
    pub async fn load(path: &Path) -> Result<Self, PickError> {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => Self::from_json_str(&text),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no picker config file, using defaults");
                Ok(Self::default())
            }
            Err(err) => Err(PickError::Io(err)),
        }
    }

    /// Total time before the watchdog fires
    pub fn watchdog_ms(&self) -> u64 {
        self.timeout_ms.saturating_add(self.watchdog_grace_ms)
    }

    /// Path of the remembered pick file
    pub fn remembered_pick_path(&self) -> PathBuf {
        self.support_dir.join(REMEMBERED_PICK_FILE)
    }
}

// =============================================================================
// TESTS
// =============================================================================
