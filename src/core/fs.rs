//! The filesystem seam used by every walk, stat and read in the engine.

use async_trait::async_trait;
use std::path::Path;

use super::error::CoreError;

/// A single raw directory entry as reported by the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    pub name: String,
    pub is_directory: bool,
}

/// The result of a `stat`. A missing path is reported as `exists == false`
/// rather than as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PathStat {
    pub exists: bool,
    pub is_directory: bool,
    pub is_file: bool,
}

/// Defines the filesystem operations the engine needs.
/// This allows tests to swap in failing or in-memory implementations.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Lists the immediate entries of `path`.
    async fn list_directory(&self, path: &Path) -> Result<Vec<DirEntryInfo>, CoreError>;

    /// Follows symlinks. Returns `exists == false` for missing paths.
    async fn stat_path(&self, path: &Path) -> Result<PathStat, CoreError>;

    async fn read_file_text(&self, path: &Path) -> Result<String, CoreError>;
}

/// The production implementation backed by `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileSystem;

#[async_trait]
impl FileSystem for TokioFileSystem {
    async fn list_directory(&self, path: &Path) -> Result<Vec<DirEntryInfo>, CoreError> {
        let mut reader = tokio::fs::read_dir(path)
            .await
            .map_err(|e| CoreError::from_io(e, path))?;

        let mut entries = Vec::new();
        loop {
            let entry = match reader.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Failed to read an entry of {}: {}", path.display(), e);
                    break;
                }
            };

            // Symlinks are reported as leaves so a walk never follows a cycle.
            let is_directory = match entry.file_type().await {
                Ok(file_type) => file_type.is_dir(),
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", entry.path().display(), e);
                    continue;
                }
            };

            entries.push(DirEntryInfo {
                name: entry.file_name().to_string_lossy().to_string(),
                is_directory,
            });
        }
        Ok(entries)
    }

    async fn stat_path(&self, path: &Path) -> Result<PathStat, CoreError> {
        match tokio::fs::metadata(path).await {
            Ok(metadata) => Ok(PathStat {
                exists: true,
                is_directory: metadata.is_dir(),
                is_file: metadata.is_file(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(PathStat::default()),
            Err(e) => Err(CoreError::from_io(e, path)),
        }
    }

    async fn read_file_text(&self, path: &Path) -> Result<String, CoreError> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CoreError::from_io(e, path))
    }
}
