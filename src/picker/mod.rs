// =============================================================================
// picker/mod.rs - Orchestration d'une sélection de deux pixels
// picker/mod.rs - Orchestration of a two-pixel pick
// =============================================================================

/// Types communs (résultats, progression, événements)
/// Common types (results, progress, events)
pub mod common;

/// Repli presse-papiers / Clipboard fallback
pub mod clipboard;

/// Exécution du helper externe / External helper execution
mod helper;

/// Choix de la stratégie par plateforme / Per-platform strategy selection
pub mod strategy;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

pub use self::clipboard::{ClipboardService, SystemClipboard};
pub use self::common::{PickDisplay, PickEvent, PickProgress, PickedPixel, PixelPickResult};
pub use self::strategy::{HelperCommand, PickStrategy, Platform};

use self::clipboard::parse_two_colors_from_text;
use self::helper::HelperRun;
use crate::config::{self, PickerConfig};
use crate::error::PickError;

// =============================================================================
// ÉTAT DE SESSION
// SESSION STATE
// =============================================================================

/// Phase de la session en cours / Phase of the current session
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PickPhase {
    #[default]
    Idle,
    Starting,
    Picking,
}

/// Issue de la dernière session / Outcome of the last session
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PickOutcome {
    Resolved,
    Loaded,
    Canceled,
    TimedOut,
    Failed,
}

impl PickOutcome {
    fn from_error(err: &PickError) -> Self {
        match err {
            PickError::Canceled => Self::Canceled,
            PickError::TimedOut => Self::TimedOut,
            _ => Self::Failed,
        }
    }
}

#[derive(Debug, Default)]
struct SessionState {
    phase: PickPhase,
    last_outcome: Option<PickOutcome>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Accès exclusif à la session, libéré sur tous les chemins de sortie
/// Exclusive access to the session, released on every exit path
#[derive(Debug)]
struct PickGuard<'a> {
    owner: &'a PickOrchestrator,
}

impl PickGuard<'_> {
    fn enter_picking(&self) {
        lock(&self.owner.session).phase = PickPhase::Picking;
    }

    fn finish(&self, outcome: PickOutcome) {
        lock(&self.owner.session).last_outcome = Some(outcome);
    }
}

impl Drop for PickGuard<'_> {
    fn drop(&mut self) {
        lock(&self.owner.session).phase = PickPhase::Idle;
        lock(&self.owner.display).is_picking = false;
        debug!("pick session released");
    }
}

/// Envoie un événement sans jamais bloquer la sélection
/// Sends an event without ever blocking the pick
///
/// Progress is dropped once a single slot is left, so the final event of a
/// pick still fits when nobody reads the channel meanwhile.
fn emit(events: &mpsc::Sender<PickEvent>, event: PickEvent) {
    if matches!(event, PickEvent::Progress(_)) && events.capacity() <= 1 {
        debug!("event channel nearly full, progress dropped");
        return;
    }
    match events.try_send(event) {
        Ok(()) | Err(TrySendError::Closed(_)) => {}
        Err(TrySendError::Full(event)) => warn!(?event, "event channel full, event dropped"),
    }
}

// =============================================================================
// ORCHESTRATEUR
// ORCHESTRATOR
// =============================================================================

/// Pilote une sélection de deux couleurs à la fois
/// Drives one two-color pick at a time
pub struct PickOrchestrator {
    config: PickerConfig,
    strategy: PickStrategy,
    clipboard: Arc<Mutex<Box<dyn ClipboardService>>>,
    session: Mutex<SessionState>,
    display: Mutex<PickDisplay>,
}

impl std::fmt::Debug for PickOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PickOrchestrator")
            .field("config", &self.config)
            .field("strategy", &self.strategy)
            .field("session", &self.session)
            .field("display", &self.display)
            .finish_non_exhaustive()
    }
}

impl PickOrchestrator {
    /// Orchestrateur pour la plateforme courante
    /// Orchestrator for the current platform
    pub fn new(config: PickerConfig) -> Self {
        let strategy = PickStrategy::detect(&config);
        Self::with_strategy(config, strategy, SystemClipboard)
    }

    pub fn with_strategy(
        config: PickerConfig,
        strategy: PickStrategy,
        clipboard: impl ClipboardService + 'static,
    ) -> Self {
        info!(?strategy, "pick strategy selected");
        Self {
            config,
            strategy,
            clipboard: Arc::new(Mutex::new(Box::new(clipboard))),
            session: Mutex::new(SessionState::default()),
            display: Mutex::new(PickDisplay::default()),
        }
    }

    /// Canal d'événements à passer à [`Self::pick_two_pixels`]
    /// Event channel to hand to [`Self::pick_two_pixels`]
    pub fn event_channel() -> (mpsc::Sender<PickEvent>, mpsc::Receiver<PickEvent>) {
        mpsc::channel(config::EVENT_CHANNEL_CAPACITY)
    }

    pub fn config(&self) -> &PickerConfig {
        &self.config
    }

    pub fn strategy(&self) -> &PickStrategy {
        &self.strategy
    }

    pub fn phase(&self) -> PickPhase {
        lock(&self.session).phase
    }

    pub fn last_outcome(&self) -> Option<PickOutcome> {
        lock(&self.session).last_outcome
    }

    /// Copie des couleurs affichées / Snapshot of the displayed colors
    pub fn display(&self) -> PickDisplay {
        lock(&self.display).clone()
    }

    /// Échange premier plan et arrière-plan (si les deux sont présents)
    /// Swaps foreground and background (when both are set)
    pub fn swap_colors(&self) -> bool {
        lock(&self.display).swap()
    }

    pub fn clear_colors(&self) {
        lock(&self.display).clear();
    }

    /// Affiche des couleurs connues, par ex. une sélection mémorisée
    /// Shows known colors, e.g. a remembered pick
    pub fn show_result(&self, result: &PixelPickResult) {
        lock(&self.display).apply_result(result);
    }

    fn try_acquire(&self) -> Option<PickGuard<'_>> {
        let mut session = lock(&self.session);
        if session.phase != PickPhase::Idle {
            return None;
        }
        session.phase = PickPhase::Starting;
        drop(session);

        lock(&self.display).is_picking = true;
        Some(PickGuard { owner: self })
    }

    /// Sélectionne deux couleurs
    /// Picks two colors
    ///
    /// Events are sent on `events` in the order they happen; the receiver must
    /// be drained while the pick runs. Returns `Ok(None)` when a pick is
    /// already in flight (nothing is started) and when the colors came from
    /// the clipboard (they are reported through [`PickEvent::Loaded`]).
    ///
    /// # Errors
    /// Any [`PickError`]; a [`PickEvent::Failed`] is sent first.
    pub async fn pick_two_pixels(
        &self,
        events: &mpsc::Sender<PickEvent>,
    ) -> Result<Option<PixelPickResult>, PickError> {
        let Some(guard) = self.try_acquire() else {
            info!("pick already in flight, request ignored");
            return Ok(None);
        };

        let outcome = match &self.strategy {
            PickStrategy::Clipboard => self.pick_from_clipboard(events).await.map(|()| None),
            PickStrategy::Helper { primary, secondary } => self
                .pick_with_helper(&guard, primary, secondary.as_ref(), events)
                .await
                .map(Some),
        };

        match &outcome {
            Ok(Some(_)) => guard.finish(PickOutcome::Resolved),
            Ok(None) => guard.finish(PickOutcome::Loaded),
            Err(err) => {
                guard.finish(PickOutcome::from_error(err));
                info!(kind = ?err.kind(), error = %err, "pick ended without a result");
                let failed = PickEvent::Failed { kind: err.kind(), message: err.to_string() };
                emit(events, failed);
            }
        }
        outcome
    }

    async fn pick_with_helper(
        &self,
        guard: &PickGuard<'_>,
        primary: &HelperCommand,
        secondary: Option<&HelperCommand>,
        events: &mpsc::Sender<PickEvent>,
    ) -> Result<PixelPickResult, PickError> {
        self.clear_colors();
        // Invite : premier plan, puis arrière-plan, Échap pour annuler
        // Prompt: foreground, then background, Esc to cancel
        emit(events, PickEvent::Started);
        guard.enter_picking();

        tokio::fs::create_dir_all(&self.config.support_dir).await?;
        let out_file = helper::result_file_path(&self.config.support_dir);
        let watchdog = Duration::from_millis(self.config.watchdog_ms());
        let run = |command| HelperRun {
            command,
            timeout_ms: self.config.timeout_ms,
            watchdog,
            grace: Duration::from_millis(self.config.watchdog_grace_ms),
            out_file: &out_file,
        };

        let first = helper::run_helper(&run(primary), events, |p| self.show_progress(p)).await;
        let result = match (first, secondary) {
            (Err(PickError::HelperMissing { helper }), Some(fallback)) => {
                info!(missing = %helper.display(), "primary helper missing, trying fallback");
                helper::run_helper(&run(fallback), events, |p| self.show_progress(p)).await
            }
            (first, _) => first,
        }?;

        self.show_result(&result);
        info!(foreground = %result.foreground.hex, background = %result.background.hex, "picked two pixels");
        emit(events, PickEvent::Resolved(result.clone()));
        Ok(result)
    }

    fn show_progress(&self, progress: &PickProgress) {
        lock(&self.display).apply_progress(progress);
    }

    async fn pick_from_clipboard(&self, events: &mpsc::Sender<PickEvent>) -> Result<(), PickError> {
        let clipboard = Arc::clone(&self.clipboard);
        let text = tokio::task::spawn_blocking(move || {
            lock(&clipboard)
                .try_to_get_content_from_clipboard()
                .map_err(|err| err.to_string())
        })
        .await
        .map_err(|err| PickError::Clipboard(err.to_string()))?
        .map_err(PickError::Clipboard)?;

        let two = parse_two_colors_from_text(&text)?;
        {
            let mut display = lock(&self.display);
            display.foreground = Some(two.foreground.hex.clone());
            display.background = Some(two.background.hex.clone());
        }
        info!(foreground = %two.foreground.hex, background = %two.background.hex, "loaded two colors from clipboard");

        let loaded = PickEvent::Loaded { foreground: two.foreground.hex, background: two.background.hex };
        emit(events, loaded);
        Ok(())
    }

    /// Écrit du texte dans le presse-papiers système
    /// Writes text to the system clipboard
    ///
    /// # Errors
    /// [`PickError::Clipboard`] when the clipboard cannot be written.
    pub async fn copy_to_clipboard(&self, text: String) -> Result<(), PickError> {
        let clipboard = Arc::clone(&self.clipboard);
        tokio::task::spawn_blocking(move || {
            lock(&clipboard)
                .try_to_put_content_into_clipboard(text)
                .map_err(|err| err.to_string())
        })
        .await
        .map_err(|err| PickError::Clipboard(err.to_string()))?
        .map_err(PickError::Clipboard)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::clipboard::test_fixtures::TestClipboard;
    use super::*;
    use crate::error::PickErrorKind;
    use pretty_assertions::assert_eq;

    fn clipboard_orchestrator(text: &str) -> PickOrchestrator {
        PickOrchestrator::with_strategy(
            PickerConfig::default(),
            PickStrategy::Clipboard,
            TestClipboard::with_content(text),
        )
    }

    fn drain(mut rx: mpsc::Receiver<PickEvent>) -> Vec<PickEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_clipboard_loads_two_colors() {
        let orchestrator = clipboard_orchestrator("#ffffff on #000000");
        let (tx, rx) = PickOrchestrator::event_channel();

        let result = orchestrator.pick_two_pixels(&tx).await.unwrap();
        assert_eq!(result, None);
        assert_eq!(
            drain(rx),
            [PickEvent::Loaded { foreground: "#ffffff".into(), background: "#000000".into() }]
        );
        let display = orchestrator.display();
        assert_eq!(display.foreground.as_deref(), Some("#ffffff"));
        assert_eq!(display.background.as_deref(), Some("#000000"));
        assert!(!display.is_picking);
        assert_eq!(orchestrator.phase(), PickPhase::Idle);
        assert_eq!(orchestrator.last_outcome(), Some(PickOutcome::Loaded));
    }

    #[tokio::test]
    async fn test_clipboard_not_enough_colors() {
        let orchestrator = clipboard_orchestrator("nothing, here");
        let (tx, rx) = PickOrchestrator::event_channel();

        let err = orchestrator.pick_two_pixels(&tx).await.unwrap_err();
        assert!(matches!(err, PickError::NotEnoughColors));
        assert!(matches!(
            drain(rx).as_slice(),
            [PickEvent::Failed { kind: PickErrorKind::NotEnoughColors, .. }]
        ));
        assert_eq!(orchestrator.phase(), PickPhase::Idle);
        assert_eq!(orchestrator.last_outcome(), Some(PickOutcome::Failed));
    }

    #[tokio::test]
    async fn test_copy_to_clipboard() {
        let orchestrator = clipboard_orchestrator("");
        orchestrator.copy_to_clipboard("#aabbcc on #000000".into()).await.unwrap();
        let (tx, _rx) = PickOrchestrator::event_channel();
        assert!(orchestrator.pick_two_pixels(&tx).await.is_ok());
        assert_eq!(orchestrator.display().foreground.as_deref(), Some("#aabbcc"));
    }

    #[cfg(unix)]
    mod helper_paths {
        use super::*;
        use crate::picker::helper::test_fixtures::fake_helper;
        use pretty_assertions::assert_eq;
        use std::path::Path;

        fn helper_orchestrator(dir: &Path, primary: HelperCommand, secondary: Option<HelperCommand>) -> PickOrchestrator {
            let config = PickerConfig {
                timeout_ms: 2_000,
                watchdog_grace_ms: 5_000,
                assets_dir: dir.to_path_buf(),
                support_dir: dir.join("support"),
            };
            PickOrchestrator::with_strategy(config, PickStrategy::Helper { primary, secondary }, TestClipboard::default())
        }

        const TWO_LINES: &str = r##"echo '{"foreground":{"x":1,"y":2,"hex":"#111111"}}'
echo '{"foreground":{"x":1,"y":2,"hex":"#111111"},"background":{"x":3,"y":4,"hex":"#222222"}}'"##;

        #[tokio::test]
        async fn test_events_in_order() {
            let dir = tempfile::tempdir().unwrap();
            let path = fake_helper(dir.path(), "picker", TWO_LINES);
            let orchestrator = helper_orchestrator(dir.path(), HelperCommand::Executable { path }, None);
            orchestrator.show_result(&PixelPickResult {
                foreground: PickedPixel { x: 0.0, y: 0.0, hex: "#999999".into() },
                background: PickedPixel { x: 0.0, y: 0.0, hex: "#888888".into() },
            });
            let (tx, rx) = PickOrchestrator::event_channel();

            let result = orchestrator.pick_two_pixels(&tx).await.unwrap().unwrap();
            let events = drain(rx);
            assert_eq!(events.len(), 3);
            assert_eq!(events[0], PickEvent::Started);
            assert!(matches!(&events[1], PickEvent::Progress(p) if p.background.is_none()));
            assert_eq!(events[2], PickEvent::Resolved(result.clone()));

            let display = orchestrator.display();
            assert_eq!(display.foreground.as_deref(), Some("#111111"));
            assert_eq!(display.background.as_deref(), Some("#222222"));
            assert!(!display.is_picking);
            assert_eq!(orchestrator.last_outcome(), Some(PickOutcome::Resolved));
        }

        #[tokio::test]
        async fn test_cancel_resets_session() {
            let dir = tempfile::tempdir().unwrap();
            let path = fake_helper(dir.path(), "picker", "exit 2");
            let orchestrator = helper_orchestrator(dir.path(), HelperCommand::Executable { path }, None);
            let (tx, rx) = PickOrchestrator::event_channel();

            let err = orchestrator.pick_two_pixels(&tx).await.unwrap_err();
            assert!(err.is_cancel());
            assert!(matches!(
                drain(rx).as_slice(),
                [PickEvent::Started, PickEvent::Failed { kind: PickErrorKind::Canceled, .. }]
            ));
            assert_eq!(orchestrator.phase(), PickPhase::Idle);
            assert_eq!(orchestrator.last_outcome(), Some(PickOutcome::Canceled));
        }

        #[tokio::test]
        async fn test_missing_helper_then_next_pick_accepted() {
            let dir = tempfile::tempdir().unwrap();
            let missing = HelperCommand::Executable { path: dir.path().join("pixel-picker-mac") };
            let orchestrator = helper_orchestrator(dir.path(), missing, None);
            let (tx, _rx) = PickOrchestrator::event_channel();

            for _ in 0..2 {
                let err = orchestrator.pick_two_pixels(&tx).await.unwrap_err();
                assert!(matches!(err, PickError::HelperMissing { .. }));
                assert_eq!(orchestrator.phase(), PickPhase::Idle);
                assert!(!orchestrator.display().is_picking);
            }
        }

        #[tokio::test]
        async fn test_secondary_helper_is_tried() {
            let dir = tempfile::tempdir().unwrap();
            let primary = HelperCommand::Executable { path: dir.path().join("win.exe") };
            let secondary = HelperCommand::PowerShellScript { script: dir.path().join("win.ps1") };
            let orchestrator = helper_orchestrator(dir.path(), primary, Some(secondary));
            let (tx, _rx) = PickOrchestrator::event_channel();

            match orchestrator.pick_two_pixels(&tx).await {
                Err(PickError::HelperMissing { helper }) => assert!(helper.ends_with("win.ps1")),
                other => panic!("unexpected {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_failure_mid_stream_then_next_pick_launches() {
            let dir = tempfile::tempdir().unwrap();
            let counter = dir.path().join("launches");
            let body = format!(
                "echo launch >> '{}'\n{}\necho boom >&2\nexit 1",
                counter.display(),
                r##"echo '{"foreground":{"x":1,"y":2,"hex":"#111111"}}'"##
            );
            let path = fake_helper(dir.path(), "picker", &body);
            let orchestrator = helper_orchestrator(dir.path(), HelperCommand::Executable { path }, None);

            for launch in 1..=2 {
                let (tx, rx) = PickOrchestrator::event_channel();
                match orchestrator.pick_two_pixels(&tx).await {
                    Err(PickError::HelperFailed(message)) => assert_eq!(message, "boom"),
                    other => panic!("unexpected {other:?}"),
                }
                assert!(matches!(
                    drain(rx).as_slice(),
                    [PickEvent::Started, PickEvent::Progress(_), PickEvent::Failed { kind: PickErrorKind::HelperFailed, .. }]
                ));
                assert_eq!(orchestrator.phase(), PickPhase::Idle);
                assert!(!orchestrator.display().is_picking);
                assert_eq!(orchestrator.last_outcome(), Some(PickOutcome::Failed));
                assert_eq!(std::fs::read_to_string(&counter).unwrap().lines().count(), launch);
            }
        }

        #[tokio::test]
        async fn test_many_progress_lines_with_unread_channel() {
            let dir = tempfile::tempdir().unwrap();
            let progress = r##"echo '{"foreground":{"x":1,"y":2,"hex":"#111111"}}'
"##;
            let body = format!("{}{TWO_LINES}", progress.repeat(40));
            let path = fake_helper(dir.path(), "picker", &body);
            let orchestrator = helper_orchestrator(dir.path(), HelperCommand::Executable { path }, None);
            let (tx, rx) = PickOrchestrator::event_channel();

            let pick = tokio::time::timeout(Duration::from_secs(10), orchestrator.pick_two_pixels(&tx));
            let result = pick.await.unwrap().unwrap().unwrap();
            let events = drain(rx);
            assert_eq!(events.len(), config::EVENT_CHANNEL_CAPACITY);
            assert_eq!(events.first(), Some(&PickEvent::Started));
            assert_eq!(events.last(), Some(&PickEvent::Resolved(result)));
            assert_eq!(orchestrator.phase(), PickPhase::Idle);
        }

        #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
        async fn test_concurrent_request_is_rejected() {
            let dir = tempfile::tempdir().unwrap();
            let counter = dir.path().join("launches");
            let body = format!("echo launch >> '{}'\nsleep 1\n{TWO_LINES}", counter.display());
            let path = fake_helper(dir.path(), "picker", &body);
            let orchestrator = Arc::new(helper_orchestrator(dir.path(), HelperCommand::Executable { path }, None));

            let first = {
                let orchestrator = Arc::clone(&orchestrator);
                tokio::spawn(async move {
                    let (tx, _rx) = PickOrchestrator::event_channel();
                    orchestrator.pick_two_pixels(&tx).await
                })
            };

            for _ in 0..200 {
                if orchestrator.phase() == PickPhase::Picking {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            assert_eq!(orchestrator.phase(), PickPhase::Picking);

            let (tx, rx) = PickOrchestrator::event_channel();
            assert_eq!(orchestrator.pick_two_pixels(&tx).await.unwrap(), None);
            assert!(drain(rx).is_empty());

            assert!(first.await.unwrap().unwrap().is_some());
            assert_eq!(orchestrator.phase(), PickPhase::Idle);

            let (tx, _rx) = PickOrchestrator::event_channel();
            assert!(orchestrator.pick_two_pixels(&tx).await.unwrap().is_some());
            let launches = std::fs::read_to_string(&counter).unwrap();
            assert_eq!(launches.lines().count(), 2);
        }
    }
}
