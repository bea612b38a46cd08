// =============================================================================
// picker/strategy.rs - Choix de la stratégie selon la plateforme
// picker/strategy.rs - Strategy selection per platform
// =============================================================================

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tokio::process::Command;

use crate::config::{self, PickerConfig};

/// Plateforme courante / Current platform
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Windows,
    Other,
}

impl Platform {
    /// Plateforme détectée à la compilation
    /// Platform detected at compile time
    pub const fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "windows") {
            Self::Windows
        } else {
            Self::Other
        }
    }
}

/// Une façon de lancer le helper / One way to launch the helper
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HelperCommand {
    /// Native binary: `<path> --timeout-ms <n> --out <file>`
    Executable { path: PathBuf },

    /// PowerShell script, reports through stdout only (no `--out` file)
    PowerShellScript { script: PathBuf },
}

impl HelperCommand {
    /// Fichier qui doit exister pour que ce helper soit utilisable
    /// File that must exist for this helper to be usable
    pub fn required_path(&self) -> &Path {
        match self {
            Self::Executable { path } => path,
            Self::PowerShellScript { script } => script,
        }
    }

    /// Construit la commande / Builds the command
    pub fn build(&self, timeout_ms: u64, out_file: &Path) -> Command {
        let (program, args): (OsString, Vec<OsString>) = match self {
            Self::Executable { path } => (
                path.clone().into_os_string(),
                vec![
                    "--timeout-ms".into(),
                    timeout_ms.to_string().into(),
                    "--out".into(),
                    out_file.as_os_str().to_owned(),
                ],
            ),
            Self::PowerShellScript { script } => (
                config::POWERSHELL_EXE.into(),
                vec![
                    "-NoProfile".into(),
                    "-ExecutionPolicy".into(),
                    "Bypass".into(),
                    "-File".into(),
                    script.as_os_str().to_owned(),
                    "-TimeoutMs".into(),
                    timeout_ms.to_string().into(),
                ],
            ),
        };

        let mut command = Command::new(program);
        command.args(args);
        command
    }
}

/// Stratégie de sélection, choisie une fois au démarrage
/// Pick strategy, selected once at startup
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PickStrategy {
    /// Interactive helper, with an optional fallback tried when the primary is missing
    Helper { primary: HelperCommand, secondary: Option<HelperCommand> },

    /// No helper on this platform: read two colors from the clipboard
    Clipboard,
}

impl PickStrategy {
    pub fn detect(config: &PickerConfig) -> Self {
        Self::for_platform(Platform::current(), &config.assets_dir)
    }

    pub fn for_platform(platform: Platform, assets_dir: &Path) -> Self {
        match platform {
            Platform::MacOs => Self::Helper {
                primary: HelperCommand::Executable { path: assets_dir.join(config::MAC_HELPER_NAME) },
                secondary: None,
            },
            Platform::Windows => Self::Helper {
                primary: HelperCommand::Executable { path: assets_dir.join(config::WINDOWS_HELPER_NAME) },
                secondary: Some(HelperCommand::PowerShellScript {
                    script: assets_dir.join(config::WINDOWS_SCRIPT_NAME),
                }),
            },
            Platform::Other => Self::Clipboard,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
