use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

use super::ExporterConfig;
use crate::utils::paths::sanitize_for_filename;

const APP_NAME: &str = "ContextFileExport";
const CONFIG_FILE: &str = "config.json";
const WORKSPACES_DIR: &str = "workspaces";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "contextfileexport", APP_NAME)
}

/// Returns the platform-specific configuration directory for the application.
pub fn get_config_directory() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
}

/// Returns the platform-specific data directory, home of workspace state.
pub fn get_data_directory() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
}

fn resolve_config_dir(dir_override: Option<&Path>) -> Result<PathBuf> {
    match dir_override {
        Some(dir) => Ok(dir.to_path_buf()),
        None => get_config_directory()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory")),
    }
}

/// Loads the configuration. A missing file is created with defaults; a file
/// that cannot be parsed is logged and replaced by defaults in memory.
pub fn load_config(dir_override: Option<&Path>) -> Result<ExporterConfig> {
    let config_path = resolve_config_dir(dir_override)?.join(CONFIG_FILE);

    if !config_path.exists() {
        tracing::info!(
            "Config file not found, creating default config at {:?}",
            config_path
        );
        let default_config = ExporterConfig::default();
        save_config(&default_config, dir_override)?;
        return Ok(default_config);
    }

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config at {:?}", config_path))?;

    match serde_json::from_str::<ExporterConfig>(&config_content) {
        Ok(config) => {
            tracing::info!("Loaded config from {:?}", config_path);
            Ok(config)
        }
        Err(e) => {
            tracing::warn!(
                "Failed to parse config file at {:?}: {}. Falling back to default config.",
                config_path,
                e
            );
            Ok(ExporterConfig::default())
        }
    }
}

/// Saves the provided configuration to the config file.
pub fn save_config(config: &ExporterConfig, dir_override: Option<&Path>) -> Result<()> {
    let config_dir = resolve_config_dir(dir_override)?;

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create {:?}", config_dir))?;
        tracing::info!("Created config directory: {:?}", config_dir);
    }

    let config_path = config_dir.join(CONFIG_FILE);
    let config_json = serde_json::to_string_pretty(config)?;

    fs::write(&config_path, config_json)?;
    tracing::info!("Saved config to {:?}", config_path);

    Ok(())
}

/// Where the state of the workspace whose primary root is `root` lives.
pub fn workspace_state_path(config: &ExporterConfig, root: &Path) -> Result<PathBuf> {
    let base = match &config.state_directory {
        Some(dir) => dir.clone(),
        None => get_data_directory()
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?,
    };
    Ok(base
        .join(WORKSPACES_DIR)
        .join(format!("{}.json", sanitize_for_filename(root))))
}
