//! Shallow listings and deep walks over the filesystem seam.
//!
//! Every walk is an explicit worklist, so tree depth never grows the call
//! stack. Failures are recovered per directory: the failing directory is
//! logged and skipped, its siblings are still visited.

use std::path::{Path, PathBuf};

use super::filter::PathFilter;
use super::fs::FileSystem;
use super::ListedEntry;
use crate::utils::sorting::sort_entries;

/// Which parts of the [`PathFilter`] a deep walk honors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// The full filter: metadata exclusions and active ignore patterns.
    Visible,
    /// Metadata exclusions only. Used by bulk toggles so hidden files are
    /// selected and deselected together with their folder.
    IgnorePatternsBypassed,
}

/// Borrowed view over the filesystem and the current filter.
pub struct TreeWalker<'a> {
    fs: &'a dyn FileSystem,
    filter: &'a PathFilter,
}

impl<'a> TreeWalker<'a> {
    pub fn new(fs: &'a dyn FileSystem, filter: &'a PathFilter) -> Self {
        Self { fs, filter }
    }

    /// Immediate children of `dir` that pass the filter, directories first
    /// and then in natural label order. A directory that cannot be read
    /// yields an empty list.
    pub async fn list_children(&self, dir: &Path) -> Vec<ListedEntry> {
        let mut entries = match self.read_entries(dir, Visibility::Visible).await {
            Some(entries) => entries,
            None => return Vec::new(),
        };
        sort_entries(&mut entries);
        entries
    }

    /// Every file under `dir` that passes the filter at every level.
    pub async fn collect_files(&self, dir: &Path) -> Vec<PathBuf> {
        self.walk(dir, Visibility::Visible)
            .await
            .into_iter()
            .filter(|entry| !entry.is_directory)
            .map(|entry| entry.path)
            .collect()
    }

    /// Every file and directory under `dir` (excluding `dir` itself).
    pub async fn walk(&self, dir: &Path, visibility: Visibility) -> Vec<ListedEntry> {
        let mut result = Vec::new();
        let mut pending = vec![dir.to_path_buf()];

        while let Some(current) = pending.pop() {
            let Some(entries) = self.read_entries(&current, visibility).await else {
                continue;
            };
            for entry in entries {
                if entry.is_directory {
                    pending.push(entry.path.clone());
                }
                result.push(entry);
            }
        }
        result
    }

    async fn read_entries(&self, dir: &Path, visibility: Visibility) -> Option<Vec<ListedEntry>> {
        let raw = match self.fs.list_directory(dir).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Error reading directory {}: {}", dir.display(), e);
                return None;
            }
        };

        let entries = raw
            .into_iter()
            .map(|raw| ListedEntry {
                path: dir.join(&raw.name),
                name: raw.name,
                is_directory: raw.is_directory,
            })
            .filter(|entry| match visibility {
                Visibility::Visible => self.filter.should_include(&entry.path, entry.is_directory),
                Visibility::IgnorePatternsBypassed => {
                    !self.filter.is_excluded_metadata(&entry.path)
                }
            })
            .collect();
        Some(entries)
    }
}
