// =============================================================================
// store.rs - Sélection mémorisée entre deux lancements
// store.rs - Pick remembered between two launches
// =============================================================================

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::PickerConfig;
use crate::error::PickError;
use crate::picker::PixelPickResult;

/// Enregistrement sur disque / On-disk record
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
struct RememberedPick {
    #[serde(flatten)]
    pick: PixelPickResult,

    /// Horodatage (ms depuis l'epoch Unix) / Timestamp (ms since the Unix epoch)
    saved_at_ms: u64,
}

/// Fichier JSON contenant la dernière sélection réussie
/// JSON file holding the last successful pick
#[derive(Clone, Debug)]
pub struct RememberedPickStore {
    path: PathBuf,
}

impl RememberedPickStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &PickerConfig) -> Self {
        Self::new(config.remembered_pick_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Charge la sélection mémorisée ; un fichier absent ou illisible donne `None`
    /// Loads the remembered pick; a missing or unreadable file yields `None`
    pub async fn load(&self) -> Option<PixelPickResult> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(err) => {
                if err.kind() != io::ErrorKind::NotFound {
                    warn!(path = %self.path.display(), error = %err, "could not read remembered pick");
                }
                return None;
            }
        };

        match serde_json::from_str::<RememberedPick>(&text) {
            Ok(record) => Some(record.pick),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "ignoring corrupt remembered pick");
                None
            }
        }
    }

    /// Enregistre une sélection / Saves a pick
    ///
    /// # Errors
    /// [`PickError::Io`] when the directory or file cannot be written.
    pub async fn save(&self, pick: &PixelPickResult) -> Result<(), PickError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let saved_at_ms = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        let record = RememberedPick { pick: pick.clone(), saved_at_ms };
        let json = serde_json::to_string_pretty(&record).map_err(io::Error::other)?;

        tokio::fs::write(&self.path, json).await?;
        debug!(path = %self.path.display(), "remembered pick saved");
        Ok(())
    }

    /// Oublie la sélection / Forgets the pick
    ///
    /// # Errors
    /// [`PickError::Io`] on failures other than "not found".
    pub async fn clear(&self) -> Result<(), PickError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(PickError::Io(err)),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
