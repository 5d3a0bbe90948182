//! Ignore-pattern loading and matching.
//!
//! Patterns are read from a single ignore file at the primary workspace root,
//! cleaned line by line, and handed to a [`PatternMatcher`]. The default
//! matcher delegates gitignore semantics to the `ignore` crate.

use async_trait::async_trait;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::error::CoreError;

/// A predicate over root-relative, forward-slash paths.
///
/// Directory paths are passed with a trailing `/` so that directory-only
/// patterns such as `build/` can be told apart from file patterns.
pub trait PatternMatcher: Send + Sync {
    fn matches(&self, relative_path: &str) -> bool;
}

/// Builds a matcher from the cleaned pattern lines.
pub type MatcherBuilder = Arc<dyn Fn(&[String]) -> Box<dyn PatternMatcher> + Send + Sync>;

/// Returns the default builder, producing [`GitignoreMatcher`]s.
pub fn default_matcher_builder() -> MatcherBuilder {
    Arc::new(|patterns: &[String]| -> Box<dyn PatternMatcher> {
        Box::new(GitignoreMatcher::from_patterns(patterns))
    })
}

/// Supplies the raw contents of the ignore file for a workspace root.
#[async_trait]
pub trait PatternSource: Send + Sync {
    /// Returns `None` when the file is missing or unreadable.
    async fn read_ignore_file(&self, root: &Path) -> Option<String>;
}

/// Reads `<root>/<file_name>` from disk.
#[derive(Debug, Clone)]
pub struct FilePatternSource {
    file_name: String,
}

impl FilePatternSource {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }

    pub fn path_for(&self, root: &Path) -> PathBuf {
        root.join(&self.file_name)
    }
}

impl Default for FilePatternSource {
    fn default() -> Self {
        Self::new(".gitignore")
    }
}

#[async_trait]
impl PatternSource for FilePatternSource {
    async fn read_ignore_file(&self, root: &Path) -> Option<String> {
        let path = self.path_for(root);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Some(contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No ignore file at {}", path.display());
                None
            }
            Err(e) => {
                tracing::warn!("Failed to read ignore file {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Splits ignore-file contents into pattern lines, dropping blank lines and
/// `#` comments.
pub fn parse_ignore_lines(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn add_pattern(builder: &mut GitignoreBuilder, pattern: &str) -> Result<(), CoreError> {
    builder
        .add_line(None, pattern)
        .map(|_| ())
        .map_err(|e| CoreError::PatternParse(format!("'{}': {}", pattern, e)))
}

/// A [`PatternMatcher`] with `.gitignore` semantics.
pub struct GitignoreMatcher {
    inner: Gitignore,
}

impl GitignoreMatcher {
    /// Builds a matcher, skipping (and logging) lines that are not valid
    /// patterns.
    pub fn from_patterns(patterns: &[String]) -> Self {
        let mut builder = GitignoreBuilder::new("");
        for pattern in patterns {
            if let Err(e) = add_pattern(&mut builder, pattern) {
                tracing::warn!("{}. Skipping it.", e);
            }
        }

        let inner = builder
            .build()
            .map_err(|e| CoreError::PatternParse(e.to_string()))
            .unwrap_or_else(|e| {
                tracing::error!("Failed to build ignore matcher: {}", e);
                Gitignore::empty()
            });
        Self { inner }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl PatternMatcher for GitignoreMatcher {
    fn matches(&self, relative_path: &str) -> bool {
        let is_dir = relative_path.ends_with('/');
        let trimmed = relative_path.trim_end_matches('/');
        if trimmed.is_empty() || self.inner.is_empty() {
            return false;
        }
        self.inner
            .matched_path_or_any_parents(trimmed, is_dir)
            .is_ignore()
    }
}
