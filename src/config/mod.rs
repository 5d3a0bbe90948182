pub mod settings;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// User-level settings shared by every workspace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExporterConfig {
    /// Name of the ignore file read from the primary workspace root.
    pub ignore_file_name: String,
    /// Directory names excluded everywhere, regardless of ignore mode.
    pub excluded_dir_names: Vec<String>,
    /// Suggested file name for exports.
    pub default_export_filename: String,
    /// Ignore mode for workspaces that have never stored a preference.
    pub use_gitignore_by_default: bool,
    /// Overrides the platform data directory for per-workspace state.
    pub state_directory: Option<PathBuf>,
}

impl ExporterConfig {
    pub fn load() -> Result<Self> {
        settings::load_config(None)
    }
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            ignore_file_name: ".gitignore".to_string(),
            excluded_dir_names: vec![".git".to_string()],
            default_export_filename: "export.xml".to_string(),
            use_gitignore_by_default: false,
            state_directory: None,
        }
    }
}
