pub mod aggregator;
pub mod cache;
pub mod error;
pub mod exporter;
pub mod filter;
pub mod fs;
pub mod ignore;
pub mod selection;
pub mod walker;

use serde::Serialize;
use std::path::{Path, PathBuf};

/// The checkbox a host renders next to a node.
///
/// A folder with a strict subset of its files checked is `Unchecked` and
/// carries a [`PartialAnnotation`] instead of a third checkbox value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CheckboxState {
    Unchecked,
    Checked,
}

/// Expand/collapse display state. Files are always `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CollapseState {
    None,
    Collapsed,
    Expanded,
}

/// Decoration shown on folders whose descendant files are partly checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartialAnnotation {
    pub description: String,
    pub tooltip: String,
    pub icon: String,
}

impl Default for PartialAnnotation {
    fn default() -> Self {
        Self {
            description: "(partial)".to_string(),
            tooltip: "Some items in this folder are selected".to_string(),
            icon: "warning".to_string(),
        }
    }
}

/// The cached display descriptor for one filesystem path.
///
/// Identity is the absolute `path`. Nodes live only inside the
/// [`cache::EntryCache`]; everything else refers to them by path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub path: PathBuf,
    pub label: String,
    pub is_directory: bool,
    pub checkbox_state: CheckboxState,
    pub collapse_state: CollapseState,
    pub partial: Option<PartialAnnotation>,
}

impl Node {
    pub fn new(path: PathBuf, label: impl Into<String>, is_directory: bool) -> Self {
        Self {
            path,
            label: label.into(),
            is_directory,
            checkbox_state: CheckboxState::Unchecked,
            collapse_state: if is_directory {
                CollapseState::Collapsed
            } else {
                CollapseState::None
            },
            partial: None,
        }
    }

    pub fn is_checked(&self) -> bool {
        self.checkbox_state == CheckboxState::Checked
    }

    pub fn is_partial(&self) -> bool {
        self.partial.is_some()
    }

    pub fn set_checked(&mut self, checked: bool) {
        self.checkbox_state = if checked {
            CheckboxState::Checked
        } else {
            CheckboxState::Unchecked
        };
    }

    pub fn set_partial_state(&mut self) {
        self.partial = Some(PartialAnnotation::default());
    }

    pub fn clear_partial_state(&mut self) {
        self.partial = None;
    }
}

/// One entry produced by a directory listing or walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedEntry {
    pub path: PathBuf,
    pub name: String,
    pub is_directory: bool,
}

/// Returns the display label for a path: its final component, or the whole
/// path when it has none (e.g. `/`).
pub fn label_for(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

pub use aggregator::update_folder_state;
pub use cache::EntryCache;
pub use error::CoreError;
pub use exporter::generate_xml_content;
pub use filter::PathFilter;
pub use fs::{FileSystem, TokioFileSystem};
pub use self::ignore::{GitignoreMatcher, PatternMatcher, PatternSource};
pub use selection::SelectionSet;
pub use walker::TreeWalker;
