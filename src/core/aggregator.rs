//! Bottom-up folder state aggregation.

use std::path::{Path, PathBuf};

use super::cache::EntryCache;
use super::selection::SelectionSet;
use super::walker::TreeWalker;

/// The outcome of aggregating one folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderState {
    /// No visible descendant file is checked.
    None,
    /// Every visible descendant file is checked. Also the outcome for a
    /// folder with no visible files at all (0 of 0).
    Full,
    /// A strict, non-empty subset is checked.
    Partial,
}

/// Applies the three-way rule given counts of visible descendant files.
pub fn classify(checked: usize, total: usize) -> FolderState {
    if checked == 0 && total > 0 {
        FolderState::None
    } else if checked == total {
        FolderState::Full
    } else {
        FolderState::Partial
    }
}

/// Recomputes a folder's membership and display state from its visible
/// descendant files.
///
/// Folders missing from the cache, and files, are left alone. Workspace
/// roots never receive the partial annotation.
pub async fn update_folder_state(
    walker: &TreeWalker<'_>,
    roots: &[PathBuf],
    cache: &mut EntryCache,
    selection: &mut SelectionSet,
    folder: &Path,
) -> Option<FolderState> {
    match cache.get(folder) {
        Some(node) if node.is_directory => {}
        _ => return None,
    }

    let files = walker.collect_files(folder).await;
    let checked = files.iter().filter(|f| selection.contains(f)).count();
    let state = classify(checked, files.len());
    let is_root = roots.iter().any(|root| root == folder);

    let node = cache.get_mut(folder)?;
    match state {
        FolderState::None => {
            selection.remove(folder);
            node.set_checked(false);
            node.clear_partial_state();
        }
        FolderState::Full => {
            selection.insert(folder.to_path_buf());
            node.set_checked(true);
            node.clear_partial_state();
        }
        FolderState::Partial => {
            selection.remove(folder);
            node.set_checked(false);
            if is_root {
                node.clear_partial_state();
            } else {
                node.set_partial_state();
            }
        }
    }

    tracing::debug!(
        "Folder {} aggregated to {:?} ({}/{} files checked)",
        folder.display(),
        state,
        checked,
        files.len()
    );
    Some(state)
}
