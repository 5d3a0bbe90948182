//! Command handlers for the host's export, copy, clear and ignore-mode actions.
//!
//! Each handler locks the shared engine for the duration of its engine work
//! and reports the outcome to the user through `TreeEvent::Info`.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::clipboard::ClipboardSink;
use super::engine::SharedEngine;
use super::events::TreeEvent;
use super::proxy::EventProxy;
use crate::core::generate_xml_content;

const NOTHING_SELECTED: &str = "No items selected.";

/// What an export or copy command ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    NothingSelected,
    Exported { count: usize, destination: PathBuf },
    Copied { count: usize },
}

/// Builds the XML for the current exportable selection, or `None` (after
/// telling the user) when nothing is selected.
async fn render_selection<P: EventProxy>(
    proxy: &P,
    engine: &SharedEngine<P>,
) -> Option<(usize, String)> {
    let engine = engine.lock().await;
    let paths = engine.get_checked_paths().await;
    if paths.is_empty() {
        proxy.send_event(TreeEvent::Info(NOTHING_SELECTED.to_string()));
        return None;
    }
    let xml = generate_xml_content(engine.file_system(), &paths).await;
    Some((paths.len(), xml))
}

/// Writes the selected files as one XML document to `destination`.
pub async fn export_to_file<P: EventProxy>(
    proxy: &P,
    engine: &SharedEngine<P>,
    destination: &Path,
) -> Result<ExportOutcome> {
    let Some((count, xml)) = render_selection(proxy, engine).await else {
        return Ok(ExportOutcome::NothingSelected);
    };

    tokio::fs::write(destination, xml)
        .await
        .with_context(|| format!("Failed to write export to {}", destination.display()))?;

    let message = format!("Exported {} items to {}", count, destination.display());
    tracing::info!("{}", message);
    proxy.send_event(TreeEvent::Info(message));
    Ok(ExportOutcome::Exported {
        count,
        destination: destination.to_path_buf(),
    })
}

/// Places the selected files, as one XML document, on the clipboard.
pub async fn copy_to_clipboard<P: EventProxy, C: ClipboardSink + ?Sized>(
    clipboard: &C,
    proxy: &P,
    engine: &SharedEngine<P>,
) -> Result<ExportOutcome> {
    let Some((count, xml)) = render_selection(proxy, engine).await else {
        return Ok(ExportOutcome::NothingSelected);
    };

    clipboard
        .set_text(xml)
        .context("Failed to copy export to clipboard")?;

    let message = format!("Copied {} items to clipboard as XML", count);
    tracing::info!("{}", message);
    proxy.send_event(TreeEvent::Info(message));
    Ok(ExportOutcome::Copied { count })
}

/// Unchecks everything.
pub async fn clear_selections<P: EventProxy>(proxy: &P, engine: &SharedEngine<P>) {
    engine.lock().await.clear_selections().await;
    proxy.send_event(TreeEvent::Info("Cleared all selections".to_string()));
}

/// Switches ignore-pattern mode on or off and tells the user which.
pub async fn set_gitignore<P: EventProxy>(proxy: &P, engine: &SharedEngine<P>, enabled: bool) {
    engine.lock().await.set_use_gitignore(enabled).await;
    let message = if enabled {
        "Enabled .gitignore support (hiding ignored files)"
    } else {
        "Disabled .gitignore support (showing ignored files)"
    };
    proxy.send_event(TreeEvent::Info(message.to_string()));
}

/// Flips ignore-pattern mode. Returns the new mode.
pub async fn toggle_gitignore<P: EventProxy>(proxy: &P, engine: &SharedEngine<P>) -> bool {
    let enabled = !engine.lock().await.use_gitignore();
    set_gitignore(proxy, engine, enabled).await;
    enabled
}
