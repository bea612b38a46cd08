// =============================================================================
// picker/helper.rs - Exécution du helper en flux continu
// picker/helper.rs - Streaming execution of the helper process
// =============================================================================
//
// Protocole / Protocol:
// - stdout : une ligne JSON par progression ; la ligne contenant les deux
//   couleurs termine la sélection sans attendre la fin du processus
//   one JSON line per progress; the line holding both colors ends the pick
//   without waiting for the process to exit
// - fichier --out : résultat final si le processus sort sans ligne terminale
//   final result when the process exits without a terminal line
// - codes de sortie / exit codes: 2 = annulé / canceled, 4 = délai / timeout

use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, info, warn};

use super::common::{PickEvent, PickProgress, PixelPickResult};
use super::strategy::HelperCommand;
use crate::config;
use crate::error::PickError;

/// Paramètres d'une exécution du helper
/// Parameters of one helper run
#[derive(Debug)]
pub(crate) struct HelperRun<'a> {
    pub command: &'a HelperCommand,
    pub timeout_ms: u64,
    pub watchdog: Duration,
    /// Délai accordé au helper après sa ligne terminale
    /// Time left to the helper after its terminal line
    pub grace: Duration,
    pub out_file: &'a Path,
}

/// Nom unique du fichier de résultat / Unique result file name
pub(crate) fn result_file_path(support_dir: &Path) -> PathBuf {
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    support_dir.join(format!(
        "{}{}-{}.json",
        config::RESULT_FILE_PREFIX,
        std::process::id(),
        millis
    ))
}

/// Lance le helper et suit sa sortie jusqu'à un résultat
/// Runs the helper and follows its output until a result
///
/// Every non-terminal line is passed to `observe` and sent as
/// [`PickEvent::Progress`]. The terminal line is passed to `observe` only; the
/// caller reports it as [`PickEvent::Resolved`].
pub(crate) async fn run_helper(
    run: &HelperRun<'_>,
    events: &mpsc::Sender<PickEvent>,
    mut observe: impl FnMut(&PickProgress),
) -> Result<PixelPickResult, PickError> {
    if let HelperCommand::PowerShellScript { script } = run.command {
        if !tokio::fs::try_exists(script).await.unwrap_or(false) {
            return Err(PickError::HelperMissing { helper: script.clone() });
        }
    }

    let mut command = run.command.build(run.timeout_ms, run.out_file);
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    // Pas de fenêtre console / No console window
    #[cfg(windows)]
    command.creation_flags(0x0800_0000);

    let mut child = command.spawn().map_err(|err| spawn_error(err, run.command))?;
    info!(helper = %run.command.required_path().display(), timeout_ms = run.timeout_ms, "pixel picker started");

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| PickError::HelperFailed("Pixel picker stdout unavailable.".to_string()))?;
    let mut stderr_task = child.stderr.take().map(collect_output);

    // =========================================================================
    // Lecture incrémentale / Incremental read
    // =========================================================================

    let deadline = Instant::now() + run.watchdog;
    let mut lines = BufReader::new(stdout).split(b'\n');
    let mut watchdog_fired = false;

    loop {
        let segment = match timeout_at(deadline, lines.next_segment()).await {
            Ok(Ok(segment)) => segment,
            Ok(Err(err)) => return Err(abandon_read(err, run.out_file).await),
            Err(_elapsed) => {
                watchdog_fired = true;
                break;
            }
        };
        let Some(bytes) = segment else { break };

        let line = String::from_utf8_lossy(&bytes);
        let Some(progress) = PickProgress::from_line(&line) else {
            debug!(line = %line.trim(), "skipping malformed helper line");
            continue;
        };

        observe(&progress);
        if let Some(result) = progress.complete() {
            debug!("terminal line received before helper exit");
            reap_in_background(child, run.out_file.to_path_buf(), stderr_task.take(), run.grace);
            return Ok(result);
        }
        super::emit(events, PickEvent::Progress(progress));
    }

    // =========================================================================
    // Fin du processus / Process exit
    // =========================================================================

    let status: Option<ExitStatus> = if watchdog_fired {
        None
    } else {
        match timeout_at(deadline, child.wait()).await {
            Ok(status) => Some(status?),
            Err(_elapsed) => None,
        }
    };
    if status.is_none() {
        warn!(watchdog_ms = run.watchdog.as_millis() as u64, "watchdog expired, killing pixel picker");
        if let Err(err) = child.kill().await {
            warn!(error = %err, "failed to kill pixel picker");
        }
    }

    let stderr = match stderr_task {
        Some(task) => drain_output(task).await,
        None => String::new(),
    };

    if let Some(result) = read_result_file(run.out_file).await {
        return Ok(result);
    }

    let Some(status) = status else {
        return Err(PickError::TimedOut);
    };

    let code = status.code().unwrap_or(-1);
    debug!(code, "pixel picker exited without a result");
    Err(map_exit_code(code, &stderr))
}

/// Traduit un code de sortie sans résultat en erreur
/// Maps an exit code without a result to an error
pub(crate) fn map_exit_code(code: i32, stderr: &str) -> PickError {
    match code {
        config::EXIT_CODE_CANCELED => PickError::Canceled,
        config::EXIT_CODE_TIMED_OUT => PickError::TimedOut,
        _ => {
            let trimmed = stderr.trim();
            if trimmed.is_empty() {
                PickError::HelperFailed(format!("Pixel picker failed (exit code {code})."))
            } else {
                PickError::HelperFailed(trimmed.to_string())
            }
        }
    }
}

// Le processus est tué à la libération de `child` (kill_on_drop)
// The process is killed when `child` is dropped (kill_on_drop)
async fn abandon_read(err: io::Error, out_file: &Path) -> PickError {
    warn!(error = %err, "could not read pixel picker output");
    remove_result_file(out_file).await;
    PickError::Io(err)
}

fn spawn_error(err: io::Error, command: &HelperCommand) -> PickError {
    if err.kind() == io::ErrorKind::NotFound {
        PickError::HelperMissing { helper: command.required_path().to_path_buf() }
    } else {
        PickError::Io(err)
    }
}

fn collect_output<R>(reader: R) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        let mut reader = BufReader::new(reader);
        if let Err(err) = reader.read_to_end(&mut buf).await {
            debug!(error = %err, "stderr read interrupted");
        }
        buf
    })
}

async fn drain_output(mut task: JoinHandle<Vec<u8>>) -> String {
    match timeout(Duration::from_millis(config::STDERR_DRAIN_MS), &mut task).await {
        Ok(Ok(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
        Ok(Err(_join)) => String::new(),
        Err(_elapsed) => {
            task.abort();
            String::new()
        }
    }
}

/// Lit puis supprime le fichier de résultat
/// Reads then removes the result file
async fn read_result_file(path: &Path) -> Option<PixelPickResult> {
    let text = tokio::fs::read_to_string(path).await.ok()?;
    remove_result_file(path).await;

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str(trimmed) {
        Ok(result) => Some(result),
        Err(err) => {
            warn!(error = %err, "pixel picker wrote an invalid result file");
            None
        }
    }
}

async fn remove_result_file(path: &Path) {
    if let Err(err) = tokio::fs::remove_file(path).await {
        if err.kind() != io::ErrorKind::NotFound {
            debug!(path = %path.display(), error = %err, "could not remove result file");
        }
    }
}

// Le helper peut encore tourner après la ligne terminale
// The helper may still be running after the terminal line
fn reap_in_background(
    mut child: Child,
    out_file: PathBuf,
    stderr_task: Option<JoinHandle<Vec<u8>>>,
    grace: Duration,
) {
    tokio::spawn(async move {
        if timeout(grace, child.wait()).await.is_err() {
            debug!("pixel picker still running after its result, killing it");
            let _ = child.kill().await;
        }
        if let Some(task) = stderr_task {
            task.abort();
        }
        remove_result_file(&out_file).await;
    });
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(all(test, unix))]
pub(crate) mod test_fixtures {
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    /// Écrit un faux helper shell exécutable
    /// Writes an executable fake shell helper
    ///
    /// The body runs with `$OUT` set to the `--out` argument.
    pub fn fake_helper(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        let script = format!(
            "#!/bin/sh\nOUT=\"\"\nwhile [ $# -gt 0 ]; do\n  case \"$1\" in\n    --out) OUT=\"$2\"; shift ;;\n  esac\n  shift\ndone\n{body}\n"
        );
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }
}
