//! Decides which paths are discoverable through listings and walks.

use std::path::{Component, Path, PathBuf};

use super::ignore::{default_matcher_builder, parse_ignore_lines, MatcherBuilder, PatternMatcher};
use crate::utils::paths::relative_slash_path;

/// The visibility policy for the tree.
///
/// Metadata directories (such as `.git`) are always excluded. When
/// ignore-pattern mode is enabled, paths matching the loaded patterns are
/// excluded as well. Patterns are matched against the path relative to the
/// primary workspace root. The filter never reads the ignore file itself;
/// callers load contents explicitly after every change.
pub struct PathFilter {
    primary_root: Option<PathBuf>,
    excluded_dir_names: Vec<String>,
    enabled: bool,
    matcher: Option<Box<dyn PatternMatcher>>,
    matcher_builder: MatcherBuilder,
}

impl PathFilter {
    pub fn new(primary_root: Option<PathBuf>, excluded_dir_names: Vec<String>) -> Self {
        Self {
            primary_root,
            excluded_dir_names,
            enabled: false,
            matcher: None,
            matcher_builder: default_matcher_builder(),
        }
    }

    pub fn with_matcher_builder(mut self, builder: MatcherBuilder) -> Self {
        self.matcher_builder = builder;
        self
    }

    pub fn set_excluded_dir_names(&mut self, names: Vec<String>) {
        self.excluded_dir_names = names;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Replaces the active pattern set with the patterns in `contents`.
    /// `None` (missing or unreadable file) leaves no extra patterns defined.
    pub fn load_patterns(&mut self, contents: Option<&str>) {
        let patterns = contents.map(parse_ignore_lines).unwrap_or_default();
        tracing::info!("Loaded {} ignore patterns", patterns.len());
        tracing::debug!("Ignore patterns: {:?}", patterns);
        self.matcher = if patterns.is_empty() {
            None
        } else {
            Some((self.matcher_builder)(&patterns))
        };
    }

    /// `true` if any component of `path` is a fixed metadata directory name.
    pub fn is_excluded_metadata(&self, path: &Path) -> bool {
        path.components().any(|c| match c {
            Component::Normal(name) => self
                .excluded_dir_names
                .iter()
                .any(|excluded| name == excluded.as_str()),
            _ => false,
        })
    }

    /// The ignore-pattern judgment alone. Always `false` while the mode is
    /// disabled, for paths outside the primary root, and for the root itself.
    pub fn is_ignored(&self, path: &Path, is_directory: bool) -> bool {
        if !self.enabled {
            return false;
        }
        let Some(matcher) = &self.matcher else {
            return false;
        };
        let Some(mut relative) = self.relative_path(path) else {
            return false;
        };
        if relative.is_empty() {
            return false;
        }
        if is_directory {
            relative.push('/');
        }

        let ignored = matcher.matches(&relative);
        tracing::debug!(
            "Path {} is {}",
            relative,
            if ignored { "ignored" } else { "not ignored" }
        );
        ignored
    }

    pub fn should_include(&self, path: &Path, is_directory: bool) -> bool {
        !self.is_excluded_metadata(path) && !self.is_ignored(path, is_directory)
    }

    /// Expresses `path` relative to the primary root with `/` separators.
    pub fn relative_path(&self, path: &Path) -> Option<String> {
        let root = self.primary_root.as_ref()?;
        relative_slash_path(path, root).ok()
    }
}

impl std::fmt::Debug for PathFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathFilter")
            .field("primary_root", &self.primary_root)
            .field("excluded_dir_names", &self.excluded_dir_names)
            .field("enabled", &self.enabled)
            .field("has_patterns", &self.matcher.is_some())
            .finish()
    }
}
