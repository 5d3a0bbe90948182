//! The path-keyed identity map of tree nodes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::{CollapseState, Node};

/// Owns every [`Node`]. Parent/child relationships are not stored; they are
/// derived from paths and listings when needed.
#[derive(Debug, Default)]
pub struct EntryCache {
    nodes: HashMap<PathBuf, Node>,
}

impl EntryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<&Node> {
        self.nodes.get(path)
    }

    pub fn get_mut(&mut self, path: &Path) -> Option<&mut Node> {
        self.nodes.get_mut(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.nodes.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Returns the existing node untouched, or inserts a fresh one.
    pub fn get_or_insert(&mut self, path: &Path, label: &str, is_directory: bool) -> &mut Node {
        self.nodes
            .entry(path.to_path_buf())
            .or_insert_with(|| Node::new(path.to_path_buf(), label, is_directory))
    }

    /// Inserts a node or refreshes the listing-derived fields of an existing
    /// one. Checkbox state and partial annotation are preserved; the collapse
    /// state only changes when the entry switched between file and directory.
    pub fn upsert(&mut self, path: &Path, label: &str, is_directory: bool) -> &mut Node {
        let node = self.get_or_insert(path, label, is_directory);
        if node.label != label {
            node.label = label.to_string();
        }
        if node.is_directory != is_directory {
            node.is_directory = is_directory;
            node.collapse_state = if is_directory {
                CollapseState::Collapsed
            } else {
                CollapseState::None
            };
        }
        node
    }

    /// Drops every node. Used when the visibility policy changes.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Resets every node to unchecked with no partial annotation.
    pub fn reset_states(&mut self) {
        for node in self.nodes.values_mut() {
            node.set_checked(false);
            node.clear_partial_state();
        }
    }

    /// Cached directory paths, longest path first. Path length stands in for
    /// depth, so children are always visited before their parents.
    pub fn directories_deepest_first(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self
            .nodes
            .values()
            .filter(|node| node.is_directory)
            .map(|node| node.path.clone())
            .collect();
        dirs.sort_by(|a, b| {
            b.as_os_str()
                .len()
                .cmp(&a.as_os_str().len())
                .then_with(|| a.cmp(b))
        });
        dirs
    }
}
