// =============================================================================
// plugin.rs - Plugin Tauri : commandes exposées au frontend
// plugin.rs - Tauri plugin: commands exposed to the frontend
// =============================================================================

use std::sync::Arc;

use serde::Serialize;
use tauri::plugin::{Builder, TauriPlugin};
use tauri::{AppHandle, Emitter, Manager, Runtime, State};
use tracing::warn;

use crate::color::{parse_picked_color, PickedColor};
use crate::config::PickerConfig;
use crate::contrast::{self, ApcaLevel, ContrastResults, WcagSummary};
use crate::error::{ParseError, PickError};
use crate::format;
use crate::picker::{PickDisplay, PickOrchestrator, PixelPickResult};
use crate::store::RememberedPickStore;

/// Nom de l'événement émis pour chaque [`crate::PickEvent`]
/// Name of the event emitted for every [`crate::PickEvent`]
pub const PICK_EVENT: &str = "pick-event";

/// État du plugin, partagé entre les commandes
/// Plugin state, shared between commands
pub struct PluginState {
    orchestrator: Arc<PickOrchestrator>,
    store: RememberedPickStore,
}

/// Rapport complet pour une paire de couleurs
/// Full report for a color pair
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ContrastReport {
    pub foreground: PickedColor,
    pub background: PickedColor,
    pub results: ContrastResults,
    pub wcag: WcagSummary,
    pub apca_level: ApcaLevel,
    pub summary: String,
    pub copy_text: String,
}

// =============================================================================
// COMMANDES TAURI
// TAURI COMMANDS
// =============================================================================

/// Lance une sélection et relaie chaque événement au frontend
/// Runs a pick and forwards every event to the frontend
#[tauri::command]
async fn pick_two_pixels<R: Runtime>(
    app: AppHandle<R>,
    state: State<'_, PluginState>,
) -> Result<Option<PixelPickResult>, PickError> {
    let (tx, mut rx) = PickOrchestrator::event_channel();
    let forward = tauri::async_runtime::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let Err(err) = app.emit(PICK_EVENT, &event) {
                warn!(error = %err, "could not emit pick event");
            }
        }
    });

    let result = state.orchestrator.pick_two_pixels(&tx).await;
    drop(tx);
    let _ = forward.await;

    if let Ok(Some(pick)) = &result {
        if let Err(err) = state.store.save(pick).await {
            warn!(error = %err, "could not remember pick");
        }
    }
    result
}

#[tauri::command]
fn parse_color(text: String) -> Result<PickedColor, ParseError> {
    parse_picked_color(&text)
}

#[tauri::command]
fn compute_contrast(foreground: String, background: String) -> Result<ContrastReport, ParseError> {
    let foreground = parse_picked_color(&foreground)?;
    let background = parse_picked_color(&background)?;
    let results = contrast::compute_contrast(&foreground, &background);
    Ok(ContrastReport {
        summary: format::build_results_text(Some(&foreground), Some(&background), Some(&results)),
        copy_text: format::build_copy_text(Some(&foreground), Some(&background), Some(&results)),
        wcag: WcagSummary::from_ratio(results.wcag_ratio),
        apca_level: ApcaLevel::from_lc(results.apca),
        foreground,
        background,
        results,
    })
}

/// Copie le résumé des couleurs affichées / Copies the summary of the displayed colors
#[tauri::command]
async fn copy_text(state: State<'_, PluginState>) -> Result<String, PickError> {
    let (foreground, background, results) = crate::evaluate_display(&state.orchestrator.display());
    let text = format::build_copy_text(foreground.as_ref(), background.as_ref(), results.as_ref());
    state.orchestrator.copy_to_clipboard(text.clone()).await?;
    Ok(text)
}

#[tauri::command]
fn get_display(state: State<'_, PluginState>) -> PickDisplay {
    state.orchestrator.display()
}

#[tauri::command]
fn swap_colors(state: State<'_, PluginState>) -> PickDisplay {
    state.orchestrator.swap_colors();
    state.orchestrator.display()
}

/// Efface les couleurs et la sélection mémorisée
/// Clears the colors and the remembered pick
#[tauri::command]
async fn clear_colors(state: State<'_, PluginState>) -> Result<PickDisplay, PickError> {
    state.orchestrator.clear_colors();
    state.store.clear().await?;
    Ok(state.orchestrator.display())
}

/// Affiche la sélection mémorisée, s'il y en a une
/// Shows the remembered pick, if any
#[tauri::command]
async fn restore_remembered(state: State<'_, PluginState>) -> Result<Option<PixelPickResult>, PickError> {
    let remembered = state.store.load().await;
    if let Some(pick) = &remembered {
        state.orchestrator.show_result(pick);
    }
    Ok(remembered)
}

// =============================================================================
// INITIALISATION
// INITIALIZATION
// =============================================================================

pub fn init<R: Runtime>(config: PickerConfig) -> TauriPlugin<R> {
    Builder::new("pixel-contrast")
        .invoke_handler(tauri::generate_handler![
            pick_two_pixels,
            parse_color,
            compute_contrast,
            copy_text,
            get_display,
            swap_colors,
            clear_colors,
            restore_remembered,
        ])
        .setup(move |app, _api| {
            let store = RememberedPickStore::from_config(&config);
            app.manage(PluginState {
                orchestrator: Arc::new(PickOrchestrator::new(config)),
                store,
            });
            Ok(())
        })
        .build()
}
