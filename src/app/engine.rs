//! The checkbox tree engine: lifecycle, listings and the toggle orchestrator.
//!
//! The engine owns the [`EntryCache`], the [`SelectionSet`] and the
//! [`PathFilter`]; collaborators (filesystem, ignore-file source, state store
//! and display proxy) are injected. Every mutating operation takes
//! `&mut self`, so operations never interleave. Hosts that share an engine
//! wrap it in [`SharedEngine`].

use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::events::TreeEvent;
use super::proxy::EventProxy;
use super::refresh::RefreshGate;
use super::storage::{StateStore, CHECKED_PATHS_KEY, USE_GITIGNORE_KEY};
use crate::config::ExporterConfig;
use crate::core::ignore::{FilePatternSource, MatcherBuilder};
use crate::core::walker::Visibility;
use crate::core::{
    label_for, update_folder_state, CollapseState, EntryCache, FileSystem, Node, PathFilter,
    PatternSource, SelectionSet, TokioFileSystem, TreeWalker,
};
use crate::utils::paths::{ancestors_up_to, outermost_root};

/// An engine shared between host tasks.
pub type SharedEngine<P> = Arc<tokio::sync::Mutex<ExportTreeEngine<P>>>;

pub struct ExportTreeEngine<P: EventProxy> {
    roots: Vec<PathBuf>,
    fs: Arc<dyn FileSystem>,
    pattern_source: Arc<dyn PatternSource>,
    store: Arc<dyn StateStore>,
    proxy: P,
    cache: EntryCache,
    selection: SelectionSet,
    filter: PathFilter,
    gate: RefreshGate,
    default_use_gitignore: bool,
}

impl<P: EventProxy> ExportTreeEngine<P> {
    /// Creates an engine over `roots` backed by the real filesystem and the
    /// `.gitignore` file of the first root. Nothing is read until
    /// [`initialize`](Self::initialize) runs.
    pub fn new(roots: Vec<PathBuf>, store: Arc<dyn StateStore>, proxy: P) -> Self {
        let filter = PathFilter::new(roots.first().cloned(), vec![".git".to_string()]);
        Self {
            roots,
            fs: Arc::new(TokioFileSystem),
            pattern_source: Arc::new(FilePatternSource::default()),
            store,
            proxy,
            cache: EntryCache::new(),
            selection: SelectionSet::new(),
            filter,
            gate: RefreshGate::new(),
            default_use_gitignore: false,
        }
    }

    /// Applies the user settings: ignore file name, excluded directory names
    /// and the ignore mode used when the workspace has no stored preference.
    pub fn with_config(mut self, config: &ExporterConfig) -> Self {
        self.pattern_source = Arc::new(FilePatternSource::new(config.ignore_file_name.clone()));
        self.filter.set_excluded_dir_names(config.excluded_dir_names.clone());
        self.default_use_gitignore = config.use_gitignore_by_default;
        self
    }

    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn with_pattern_source(mut self, source: Arc<dyn PatternSource>) -> Self {
        self.pattern_source = source;
        self
    }

    pub fn with_matcher_builder(mut self, builder: MatcherBuilder) -> Self {
        self.filter = self.filter.with_matcher_builder(builder);
        self
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn cache(&self) -> &EntryCache {
        &self.cache
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn filter(&self) -> &PathFilter {
        &self.filter
    }

    pub fn file_system(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    pub fn proxy(&self) -> &P {
        &self.proxy
    }

    pub fn use_gitignore(&self) -> bool {
        self.filter.is_enabled()
    }

    pub fn is_checked(&self, path: &Path) -> bool {
        self.selection.contains(path)
    }

    /// A copy of the cached node for `path`, if it was ever discovered.
    pub fn get_node(&self, path: &Path) -> Option<Node> {
        self.cache.get(path).cloned()
    }

    /// Loads the stored selection and ignore mode, preloads every root and
    /// aggregates all folders. Exactly one refresh is sent, after the tree is
    /// consistent.
    pub async fn initialize(&mut self) {
        tracing::info!(
            "Initializing export tree for {} workspace root(s)",
            self.roots.len()
        );

        let stored = match self.store.get(CHECKED_PATHS_KEY).await {
            Some(value) => serde_json::from_value::<Vec<String>>(value).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed checked path list: {}", e);
                Vec::new()
            }),
            None => Vec::new(),
        };
        self.selection = SelectionSet::from_persisted(stored);

        let use_gitignore = self
            .store
            .get(USE_GITIGNORE_KEY)
            .await
            .and_then(|value| value.as_bool())
            .unwrap_or(self.default_use_gitignore);
        self.filter.set_enabled(use_gitignore);
        if use_gitignore {
            self.reload_patterns().await;
        }

        self.begin_batch();
        self.rebuild_tree().await;
        self.refresh();
        self.end_batch();

        tracing::info!(
            "Export tree ready: {} cached nodes, {} checked paths",
            self.cache.len(),
            self.selection.len()
        );
    }

    /// Persists the selection and drops every cached node.
    pub async fn dispose(&mut self) {
        self.persist().await;
        self.cache.clear();
        tracing::info!("Export tree disposed");
    }

    /// With `None`, one node per workspace root. With a directory, its
    /// visible children, directories first. Files have no children.
    pub async fn get_children(&mut self, parent: Option<&Path>) -> Vec<Node> {
        let Some(dir) = parent else {
            return self.root_nodes();
        };
        if matches!(self.cache.get(dir), Some(node) if !node.is_directory) {
            return Vec::new();
        }

        let walker = TreeWalker::new(self.fs.as_ref(), &self.filter);
        let entries = walker.list_children(dir).await;

        let mut discovered_dirs = Vec::new();
        for entry in &entries {
            let is_new = !self.cache.contains(&entry.path);
            let node = self
                .cache
                .upsert(&entry.path, &entry.name, entry.is_directory);
            if is_new {
                node.set_checked(self.selection.contains(&entry.path));
                if entry.is_directory {
                    discovered_dirs.push(entry.path.clone());
                }
            }
        }

        // Directories that appeared after the preload have never been aggregated.
        for folder in &discovered_dirs {
            update_folder_state(
                &walker,
                &self.roots,
                &mut self.cache,
                &mut self.selection,
                folder,
            )
            .await;
        }
        if !discovered_dirs.is_empty() {
            self.persist().await;
        }

        entries
            .iter()
            .filter_map(|entry| self.cache.get(&entry.path).cloned())
            .collect()
    }

    fn root_nodes(&mut self) -> Vec<Node> {
        if self.roots.is_empty() {
            self.proxy
                .send_event(TreeEvent::Info("No workspace folder is open".to_string()));
            return Vec::new();
        }

        let mut nodes = Vec::with_capacity(self.roots.len());
        for root in &self.roots {
            let is_new = !self.cache.contains(root);
            let node = self.cache.upsert(root, &label_for(root), true);
            if is_new {
                node.collapse_state = CollapseState::Expanded;
            }
            if self.selection.contains(root) {
                node.set_checked(true);
            }
            nodes.push(node.clone());
        }
        nodes
    }

    /// Flips `path` (and, for a directory, its whole subtree on disk), then
    /// re-aggregates every ancestor up to the outermost containing root. Paths that
    /// were never discovered are ignored.
    pub async fn toggle_checkbox(&mut self, path: &Path) {
        if !self.cache.contains(path) {
            tracing::debug!("Toggle ignored for unknown path {}", path.display());
            return;
        }

        let checked = self.apply_toggle(path).await;
        tracing::debug!(
            "Toggled {} to {}",
            path.display(),
            if checked { "checked" } else { "unchecked" }
        );

        let ancestors = self.ancestors_of(path);
        self.sweep_folders(&ancestors).await;
        self.persist().await;
        self.refresh();
    }

    /// Toggles several leaves as one operation: one ancestor sweep over the
    /// union of their ancestors, one persist and one refresh. Directories and
    /// unknown paths are skipped.
    pub async fn toggle_batch(&mut self, paths: &[PathBuf]) {
        let leaves: Vec<&PathBuf> = paths
            .iter()
            .filter(|path| matches!(self.cache.get(path), Some(node) if !node.is_directory))
            .collect();
        if leaves.is_empty() {
            tracing::debug!("Batch toggle contained no known files");
            return;
        }

        self.begin_batch();
        let mut folders = HashSet::new();
        for leaf in &leaves {
            self.apply_toggle(leaf).await;
            folders.extend(self.ancestors_of(leaf));
        }

        let mut folders: Vec<PathBuf> = folders.into_iter().collect();
        folders.sort_by(|a, b| {
            b.as_os_str()
                .len()
                .cmp(&a.as_os_str().len())
                .then_with(|| a.cmp(b))
        });
        self.sweep_folders(&folders).await;
        self.persist().await;
        self.refresh();
        self.end_batch();

        tracing::info!("Toggled {} files in one batch", leaves.len());
    }

    /// Opens a batch scope. Refreshes requested inside are deferred.
    pub fn begin_batch(&mut self) {
        self.gate.begin();
    }

    /// Closes a batch scope, releasing at most one refresh when the
    /// outermost scope closes.
    pub fn end_batch(&mut self) {
        if self.gate.end() {
            self.proxy.send_event(TreeEvent::Refresh);
        }
    }

    /// Asks the host to re-pull node state, or defers the request while a
    /// batch is open.
    pub fn refresh(&mut self) {
        if self.gate.request() {
            self.proxy.send_event(TreeEvent::Refresh);
        }
    }

    /// Empties the selection and resets every cached node.
    pub async fn clear_selections(&mut self) {
        self.selection.clear();
        self.cache.reset_states();
        self.persist().await;
        self.refresh();
        tracing::info!("Cleared all selections");
    }

    /// Switches ignore-pattern mode. The cache is rebuilt from scratch since
    /// the set of discoverable paths changed; selections of now hidden files
    /// are kept.
    pub async fn set_use_gitignore(&mut self, enabled: bool) {
        self.filter.set_enabled(enabled);
        if enabled {
            self.reload_patterns().await;
        }
        if let Err(e) = self.store.set(USE_GITIGNORE_KEY, Value::Bool(enabled)).await {
            tracing::error!("Failed to save ignore mode: {}", e);
        }

        self.cache.clear();
        self.begin_batch();
        self.rebuild_tree().await;
        self.persist().await;
        self.refresh();
        self.end_batch();

        tracing::info!(
            "Ignore-pattern mode {}",
            if enabled { "enabled" } else { "disabled" }
        );
    }

    /// The exportable selection: sorted, existing regular files outside
    /// metadata directories that the active ignore patterns do not hide.
    pub async fn get_checked_paths(&self) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        for path in self.selection.sorted() {
            match self.fs.stat_path(&path).await {
                Ok(stat) if stat.exists && stat.is_file => {}
                Ok(_) => continue,
                Err(e) => {
                    tracing::debug!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            }
            if !self.filter.should_include(&path, false) {
                continue;
            }
            paths.push(path);
        }
        paths
    }

    async fn reload_patterns(&mut self) {
        let contents = match self.roots.first() {
            Some(root) => self.pattern_source.read_ignore_file(root).await,
            None => None,
        };
        self.filter.load_patterns(contents.as_deref());
    }

    /// Preloads every root into the cache, then aggregates every cached
    /// directory deepest first.
    async fn rebuild_tree(&mut self) {
        let walker = TreeWalker::new(self.fs.as_ref(), &self.filter);

        for root in &self.roots {
            let is_new = !self.cache.contains(root);
            let node = self.cache.upsert(root, &label_for(root), true);
            if is_new {
                node.collapse_state = CollapseState::Expanded;
            }
        }

        for root in &self.roots {
            for entry in walker.walk(root, Visibility::Visible).await {
                let checked = self.selection.contains(&entry.path);
                self.cache
                    .upsert(&entry.path, &entry.name, entry.is_directory)
                    .set_checked(checked);
            }
        }

        for folder in self.cache.directories_deepest_first() {
            update_folder_state(
                &walker,
                &self.roots,
                &mut self.cache,
                &mut self.selection,
                &folder,
            )
            .await;
        }
    }

    /// Flips one node and, for a directory, every descendant on disk
    /// regardless of ignore patterns. Returns the new checked state.
    async fn apply_toggle(&mut self, path: &Path) -> bool {
        let is_directory = self
            .cache
            .get(path)
            .map(|node| node.is_directory)
            .unwrap_or(false);
        let checked = !self.selection.contains(path);

        self.selection.set_checked(path, checked);
        if let Some(node) = self.cache.get_mut(path) {
            node.set_checked(checked);
            node.clear_partial_state();
        }

        if is_directory {
            let walker = TreeWalker::new(self.fs.as_ref(), &self.filter);
            let descendants = walker
                .walk(path, Visibility::IgnorePatternsBypassed)
                .await;
            tracing::debug!(
                "Applying toggle to {} descendants of {}",
                descendants.len(),
                path.display()
            );
            for entry in descendants {
                self.selection.set_checked(&entry.path, checked);
                if let Some(node) = self.cache.get_mut(&entry.path) {
                    node.set_checked(checked);
                    node.clear_partial_state();
                }
            }
        }
        checked
    }

    fn ancestors_of(&self, path: &Path) -> Vec<PathBuf> {
        outermost_root(&self.roots, path)
            .map(|root| ancestors_up_to(path, root))
            .unwrap_or_default()
    }

    async fn sweep_folders(&mut self, folders: &[PathBuf]) {
        let walker = TreeWalker::new(self.fs.as_ref(), &self.filter);
        for folder in folders {
            update_folder_state(
                &walker,
                &self.roots,
                &mut self.cache,
                &mut self.selection,
                folder,
            )
            .await;
        }
    }

    async fn persist(&self) {
        let value = serde_json::json!(self.selection.to_persisted());
        if let Err(e) = self.store.set(CHECKED_PATHS_KEY, value).await {
            tracing::error!("Failed to save checked paths: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::storage::MemoryStore;
    use crate::core::ignore::PatternMatcher;
    use proptest::prelude::*;
    use serde_json::json;
    use std::fs;
    use tempfile::{tempdir, TempDir};
    use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
    use tracing_test::traced_test;

    type TestEngine = ExportTreeEngine<UnboundedSender<TreeEvent>>;

    struct Fixture {
        _dir: TempDir,
        root: PathBuf,
        store: Arc<MemoryStore>,
        rx: UnboundedReceiver<TreeEvent>,
        engine: TestEngine,
    }

    impl Fixture {
        /// Creates `files` (relative paths; a trailing `/` makes a directory).
        fn new(files: &[&str]) -> Self {
            Self::with_store(files, MemoryStore::new())
        }

        fn with_store(files: &[&str], store: MemoryStore) -> Self {
            Self::configured(files, store, |engine| engine)
        }

        fn configured(
            files: &[&str],
            store: MemoryStore,
            configure: impl FnOnce(TestEngine) -> TestEngine,
        ) -> Self {
            Self::build(files, &[], store, configure)
        }

        /// Like `new`, with extra workspace roots nested inside the first.
        fn with_nested_roots(files: &[&str], nested: &[&str]) -> Self {
            Self::build(files, nested, MemoryStore::new(), |engine| engine)
        }

        fn build(
            files: &[&str],
            nested: &[&str],
            store: MemoryStore,
            configure: impl FnOnce(TestEngine) -> TestEngine,
        ) -> Self {
            let dir = tempdir().unwrap();
            let root = dir.path().to_path_buf();
            for file in files {
                let path = root.join(file);
                if file.ends_with('/') {
                    fs::create_dir_all(&path).unwrap();
                } else {
                    fs::create_dir_all(path.parent().unwrap()).unwrap();
                    fs::write(&path, format!("contents of {}", file)).unwrap();
                }
            }

            let store = Arc::new(store);
            let (tx, rx) = mpsc::unbounded_channel();
            let mut roots = vec![root.clone()];
            roots.extend(nested.iter().map(|relative| root.join(relative)));
            let engine = configure(ExportTreeEngine::new(roots, store.clone(), tx));
            Self {
                _dir: dir,
                root,
                store,
                rx,
                engine,
            }
        }

        fn path(&self, relative: &str) -> PathBuf {
            self.root.join(relative)
        }

        fn drain(&mut self) -> Vec<TreeEvent> {
            let mut events = Vec::new();
            while let Ok(event) = self.rx.try_recv() {
                events.push(event);
            }
            events
        }

        fn refresh_count(&mut self) -> usize {
            self.drain()
                .into_iter()
                .filter(|e| *e == TreeEvent::Refresh)
                .count()
        }

        fn node(&self, relative: &str) -> Node {
            self.engine.get_node(&self.path(relative)).unwrap()
        }

        async fn stored_paths(&self) -> Vec<String> {
            serde_json::from_value(self.store.get(CHECKED_PATHS_KEY).await.unwrap()).unwrap()
        }
    }

    #[tokio::test]
    async fn test_initialize_sends_exactly_one_refresh() {
        let mut f = Fixture::new(&["a.txt", "b/c.txt", "b/d/e.txt"]);
        f.engine.initialize().await;

        assert_eq!(f.drain(), vec![TreeEvent::Refresh]);
        assert!(f.engine.cache().contains(&f.path("b/d/e.txt")));
    }

    #[tokio::test]
    async fn test_initialize_restores_selection_and_aggregates() {
        let mut f = Fixture::new(&["a.txt", "b/c.txt", "b/d.txt"]);
        let stored = json!([f.path("b/c.txt").to_string_lossy()]);
        f.store.set(CHECKED_PATHS_KEY, stored).await.unwrap();

        f.engine.initialize().await;

        assert!(f.node("b/c.txt").is_checked());
        assert!(f.node("b").is_partial());
        assert!(!f.engine.get_node(&f.root).unwrap().is_partial());
    }

    #[tokio::test]
    async fn test_scenario_leaf_checks_propagate_to_root() {
        let mut f = Fixture::new(&["a.txt", "b/c.txt"]);
        f.engine.initialize().await;

        f.engine.toggle_checkbox(&f.path("a.txt")).await;
        let b = f.node("b");
        assert!(!b.is_checked());
        assert!(!b.is_partial());

        f.engine.toggle_checkbox(&f.path("b/c.txt")).await;
        assert!(f.node("b").is_checked());
        let root = f.engine.get_node(&f.root).unwrap();
        assert!(root.is_checked());
        assert!(f.engine.is_checked(&f.root));
    }

    #[tokio::test]
    async fn test_nested_root_toggles_reach_the_outer_root() {
        let mut f = Fixture::with_nested_roots(&["a.txt", "nested/b.txt"], &["nested"]);
        f.engine.initialize().await;

        f.engine.toggle_checkbox(&f.path("a.txt")).await;
        f.engine.toggle_checkbox(&f.path("nested/b.txt")).await;

        assert!(f.node("nested").is_checked());
        assert!(f.engine.get_node(&f.root).unwrap().is_checked());
        assert!(f.engine.is_checked(&f.root));

        f.engine.toggle_checkbox(&f.path("nested/b.txt")).await;
        let root = f.engine.get_node(&f.root).unwrap();
        assert!(!root.is_checked());
        assert!(!root.is_partial());
        assert!(!f.node("nested").is_partial());
    }

    #[tokio::test]
    async fn test_nested_root_batch_reaches_the_outer_root() {
        let mut f = Fixture::with_nested_roots(
            &["a.txt", "nested/b.txt", "nested/deep/c.txt"],
            &["nested"],
        );
        f.engine.initialize().await;
        f.drain();

        f.engine
            .toggle_batch(&[
                f.path("a.txt"),
                f.path("nested/b.txt"),
                f.path("nested/deep/c.txt"),
            ])
            .await;

        assert!(f.node("nested/deep").is_checked());
        assert!(f.node("nested").is_checked());
        assert!(f.engine.get_node(&f.root).unwrap().is_checked());
        assert_eq!(f.refresh_count(), 1);
    }

    #[tokio::test]
    async fn test_every_root_starts_expanded() {
        let mut f = Fixture::with_nested_roots(&["a.txt", "nested/b.txt"], &["nested"]);
        f.engine.initialize().await;

        let roots = f.engine.get_children(None).await;
        assert_eq!(roots.len(), 2);
        assert!(roots
            .iter()
            .all(|node| node.collapse_state == CollapseState::Expanded));
    }

    #[tokio::test]
    async fn test_root_never_shows_partial_but_folders_do() {
        let mut f = Fixture::new(&["a.txt", "b/c.txt", "b/d.txt"]);
        f.engine.initialize().await;

        f.engine.toggle_checkbox(&f.path("b/c.txt")).await;

        let root = f.engine.get_node(&f.root).unwrap();
        assert!(!root.is_checked());
        assert!(!root.is_partial());
        assert!(f.node("b").is_partial());
        assert_eq!(
            f.node("b").partial.unwrap().description,
            "(partial)".to_string()
        );
    }

    #[tokio::test]
    async fn test_empty_folder_toggles_checked_and_back() {
        let mut f = Fixture::new(&["empty/", "a.txt"]);
        f.engine.initialize().await;
        // 0 of 0 files checked aggregates to checked.
        assert!(f.node("empty").is_checked());

        f.engine.toggle_checkbox(&f.path("empty")).await;
        assert!(!f.node("empty").is_checked());
        assert!(!f.node("empty").is_partial());

        f.engine.toggle_checkbox(&f.path("empty")).await;
        assert!(f.node("empty").is_checked());
        assert!(!f.node("empty").is_partial());
    }

    #[tokio::test]
    async fn test_directory_toggle_covers_hidden_files() {
        let mut f = Fixture::new(&[".gitignore", "src/main.rs", "src/debug.log"]);
        fs::write(f.path(".gitignore"), "*.log\n").unwrap();
        f.engine.initialize().await;
        f.engine.set_use_gitignore(true).await;
        assert!(!f.engine.cache().contains(&f.path("src/debug.log")));

        f.engine.toggle_checkbox(&f.path("src")).await;
        assert!(f.engine.is_checked(&f.path("src/debug.log")));
        assert!(f.engine.is_checked(&f.path("src/main.rs")));

        f.engine.set_use_gitignore(false).await;
        assert!(f.node("src/debug.log").is_checked());
        assert!(f.node("src").is_checked());

        f.engine.toggle_checkbox(&f.path("src")).await;
        assert!(!f.engine.is_checked(&f.path("src/debug.log")));
        assert!(!f.engine.is_checked(&f.path("src/main.rs")));
    }

    #[tokio::test]
    async fn test_toggle_never_selects_metadata_directories() {
        let mut f = Fixture::new(&["a.txt", ".git/HEAD"]);
        f.engine.initialize().await;

        f.engine.toggle_checkbox(&f.root.clone()).await;

        assert!(f.engine.is_checked(&f.path("a.txt")));
        assert!(!f.engine.is_checked(&f.path(".git/HEAD")));
        assert!(!f.engine.cache().contains(&f.path(".git")));
    }

    #[tokio::test]
    async fn test_checked_paths_exclude_missing_directories_and_ignored() {
        let mut f = Fixture::new(&[".gitignore", "a.txt", "gone.txt", "debug.log", "dir/x.txt"]);
        fs::write(f.path(".gitignore"), "*.log\n").unwrap();
        f.engine.initialize().await;

        f.engine.toggle_checkbox(&f.path("a.txt")).await;
        f.engine.toggle_checkbox(&f.path("gone.txt")).await;
        f.engine.toggle_checkbox(&f.path("debug.log")).await;
        f.engine.toggle_checkbox(&f.path("dir")).await;
        fs::remove_file(f.path("gone.txt")).unwrap();

        let paths = f.engine.get_checked_paths().await;
        assert_eq!(
            paths,
            vec![f.path("a.txt"), f.path("debug.log"), f.path("dir/x.txt")]
        );

        f.engine.set_use_gitignore(true).await;
        let paths = f.engine.get_checked_paths().await;
        assert!(!paths.contains(&f.path("debug.log")));
        assert!(f.engine.is_checked(&f.path("gone.txt")));
        assert!(f.engine.is_checked(&f.path("dir")));
    }

    #[tokio::test]
    async fn test_ignored_selection_survives_in_storage() {
        let mut f = Fixture::new(&[".gitignore", "a.txt", "debug.log"]);
        fs::write(f.path(".gitignore"), "# logs\n\n*.log\n").unwrap();
        f.engine.initialize().await;
        f.engine.toggle_checkbox(&f.path("debug.log")).await;

        f.engine.set_use_gitignore(true).await;
        assert!(f.engine.get_checked_paths().await.is_empty());
        let debug_log = f.path("debug.log").to_string_lossy().to_string();
        assert!(f.stored_paths().await.contains(&debug_log));
        assert_eq!(f.store.get(USE_GITIGNORE_KEY).await, Some(json!(true)));

        f.engine.set_use_gitignore(false).await;
        assert_eq!(f.engine.get_checked_paths().await, vec![f.path("debug.log")]);
    }

    #[tokio::test]
    async fn test_ignore_mode_switch_sends_one_refresh() {
        let mut f = Fixture::new(&["a.txt", "b/c.txt"]);
        f.engine.initialize().await;
        f.drain();

        f.engine.set_use_gitignore(true).await;
        assert_eq!(f.refresh_count(), 1);
        assert!(f.engine.use_gitignore());
    }

    #[tokio::test]
    async fn test_clear_selections_resets_everything() {
        let mut f = Fixture::new(&["a.txt", "b/c.txt", "b/d.txt"]);
        f.engine.initialize().await;
        f.engine.toggle_checkbox(&f.path("a.txt")).await;
        f.engine.toggle_checkbox(&f.path("b/c.txt")).await;

        f.engine.clear_selections().await;

        assert!(f.engine.get_checked_paths().await.is_empty());
        assert!(f.engine.selection().is_empty());
        assert!(f
            .engine
            .cache()
            .iter()
            .all(|node| !node.is_checked() && !node.is_partial()));
        assert!(f.stored_paths().await.is_empty());
    }

    #[tokio::test]
    #[traced_test]
    async fn test_toggle_of_unknown_path_is_a_noop() {
        let mut f = Fixture::new(&["a.txt"]);
        f.engine.initialize().await;
        f.drain();

        f.engine.toggle_checkbox(&f.path("never-listed.txt")).await;

        assert!(f.engine.selection().is_empty());
        assert!(f.drain().is_empty());
        assert!(logs_contain("Toggle ignored for unknown path"));
    }

    #[tokio::test]
    async fn test_batch_toggle_sends_one_refresh_and_aggregates() {
        let mut f = Fixture::new(&["a.txt", "b/c.txt", "b/d.txt", "e/f.txt"]);
        f.engine.initialize().await;
        f.drain();

        let batch = vec![
            f.path("b/c.txt"),
            f.path("b/d.txt"),
            f.path("e/f.txt"),
            f.path("b"),
        ];
        f.engine.toggle_batch(&batch).await;

        assert_eq!(f.refresh_count(), 1);
        assert!(f.node("b").is_checked());
        assert!(f.node("e").is_checked());
        assert!(!f.engine.is_checked(&f.path("a.txt")));
        let root = f.engine.get_node(&f.root).unwrap();
        assert!(!root.is_checked());
        assert_eq!(f.stored_paths().await.len(), 5);
    }

    #[tokio::test]
    async fn test_batch_of_directories_only_does_nothing() {
        let mut f = Fixture::new(&["b/c.txt"]);
        f.engine.initialize().await;
        f.drain();

        f.engine.toggle_batch(&[f.path("b")]).await;
        f.engine.toggle_batch(&[]).await;

        assert!(f.drain().is_empty());
        assert!(!f.engine.is_checked(&f.path("b/c.txt")));
    }

    #[tokio::test]
    async fn test_nested_batch_scopes_release_one_refresh() {
        let mut f = Fixture::new(&["a.txt", "b.txt"]);
        f.engine.initialize().await;
        f.drain();

        f.engine.begin_batch();
        f.engine.toggle_checkbox(&f.path("a.txt")).await;
        f.engine.begin_batch();
        f.engine.toggle_checkbox(&f.path("b.txt")).await;
        f.engine.end_batch();
        assert!(f.drain().is_empty());
        f.engine.end_batch();

        assert_eq!(f.refresh_count(), 1);
    }

    #[tokio::test]
    async fn test_get_children_lists_roots_then_sorted_children() {
        let mut f = Fixture::new(&["b.txt", "a10.txt", "a2.txt", "zdir/x.txt", ".git/HEAD"]);
        f.engine.initialize().await;

        let roots = f.engine.get_children(None).await;
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].collapse_state, CollapseState::Expanded);

        let labels: Vec<String> = f
            .engine
            .get_children(Some(&f.root.clone()))
            .await
            .into_iter()
            .map(|node| node.label)
            .collect();
        assert_eq!(labels, vec!["zdir", "a2.txt", "a10.txt", "b.txt"]);
        assert!(f
            .engine
            .get_children(Some(&f.path("b.txt")))
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn test_listing_aggregates_directories_created_later() {
        let mut f = Fixture::new(&["a.txt", "b/c.txt"]);
        f.engine.initialize().await;
        fs::create_dir_all(f.path("b/empty")).unwrap();
        fs::create_dir_all(f.path("b/fresh")).unwrap();
        fs::write(f.path("b/fresh/x.txt"), "x").unwrap();

        let children = f.engine.get_children(Some(&f.path("b"))).await;

        let labels: Vec<&str> = children.iter().map(|node| node.label.as_str()).collect();
        assert_eq!(labels, vec!["empty", "fresh", "c.txt"]);
        // 0 of 0 files checked aggregates to checked.
        assert!(children[0].is_checked());
        assert!(!children[1].is_checked());
        assert!(!children[1].is_partial());

        let empty = f.path("b/empty").to_string_lossy().to_string();
        assert!(f.stored_paths().await.contains(&empty));
    }

    #[tokio::test]
    async fn test_checked_paths_skip_stored_metadata_paths() {
        let mut f = Fixture::new(&["a.txt", ".git/HEAD"]);
        let stored = json!([
            f.path("a.txt").to_string_lossy(),
            f.path(".git/HEAD").to_string_lossy()
        ]);
        f.store.set(CHECKED_PATHS_KEY, stored).await.unwrap();
        f.engine.initialize().await;

        assert!(f.engine.is_checked(&f.path(".git/HEAD")));
        assert_eq!(f.engine.get_checked_paths().await, vec![f.path("a.txt")]);
    }

    #[tokio::test]
    async fn test_relisting_preserves_checkbox_state() {
        let mut f = Fixture::new(&["a.txt", "b/c.txt", "b/d.txt"]);
        f.engine.initialize().await;
        f.engine.toggle_checkbox(&f.path("b/c.txt")).await;

        let b = f.path("b");
        let first = f.engine.get_children(Some(&b)).await;
        let second = f.engine.get_children(Some(&b)).await;

        assert_eq!(first, second);
        assert!(second[0].is_checked());
        assert!(f.node("b").is_partial());
    }

    #[tokio::test]
    async fn test_get_children_without_roots_informs_user() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut engine = ExportTreeEngine::new(Vec::new(), Arc::new(MemoryStore::new()), tx);

        assert!(engine.get_children(None).await.is_empty());
        assert_eq!(
            rx.try_recv().unwrap(),
            TreeEvent::Info("No workspace folder is open".to_string())
        );
    }

    #[tokio::test]
    async fn test_custom_matcher_builder_is_used() {
        struct EverythingTxt;
        impl PatternMatcher for EverythingTxt {
            fn matches(&self, relative_path: &str) -> bool {
                relative_path.ends_with(".txt")
            }
        }

        let mut f = Fixture::configured(&[".gitignore", "a.txt", "b.rs"], MemoryStore::new(), |engine| {
            engine.with_matcher_builder(Arc::new(|_patterns: &[String]| {
                Box::new(EverythingTxt) as Box<dyn PatternMatcher>
            }))
        });
        fs::write(f.path(".gitignore"), "anything\n").unwrap();

        f.engine.initialize().await;
        f.engine.set_use_gitignore(true).await;

        assert!(!f.engine.cache().contains(&f.path("a.txt")));
        assert!(f.engine.cache().contains(&f.path("b.rs")));
    }

    #[tokio::test]
    async fn test_config_controls_default_mode_and_exclusions() {
        let config = ExporterConfig {
            excluded_dir_names: vec![".git".to_string(), "node_modules".to_string()],
            use_gitignore_by_default: true,
            ..Default::default()
        };
        let mut f = Fixture::configured(
            &[".gitignore", "a.log", "node_modules/x.js", "main.rs"],
            MemoryStore::new(),
            |engine| engine.with_config(&config),
        );
        fs::write(f.path(".gitignore"), "*.log\n").unwrap();

        f.engine.initialize().await;

        assert!(f.engine.use_gitignore());
        assert!(!f.engine.cache().contains(&f.path("a.log")));
        assert!(!f.engine.cache().contains(&f.path("node_modules")));
        assert!(f.engine.cache().contains(&f.path("main.rs")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_subtree_is_skipped() {
        use crate::utils::test_helpers::running_as_root;
        use std::os::unix::fs::PermissionsExt;

        if running_as_root() {
            return;
        }

        let mut f = Fixture::new(&["open/a.txt", "locked/b.txt"]);
        let locked = f.path("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        f.engine.initialize().await;
        f.engine.toggle_checkbox(&f.root.clone()).await;

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        assert!(f.engine.is_checked(&f.path("open/a.txt")));
        assert!(f.engine.cache().contains(&locked));
        assert!(!f.engine.cache().contains(&f.path("locked/b.txt")));
    }

    #[tokio::test]
    async fn test_dispose_persists_and_empties_cache() {
        let mut f = Fixture::new(&["a.txt"]);
        f.engine.initialize().await;
        f.engine.toggle_checkbox(&f.path("a.txt")).await;

        f.engine.dispose().await;

        assert!(f.engine.cache().is_empty());
        let a = f.path("a.txt").to_string_lossy().to_string();
        assert!(f.stored_paths().await.contains(&a));
    }

    const LEAVES: [&str; 6] = [
        "a.txt",
        "b/c.txt",
        "b/d.txt",
        "b/e/f.txt",
        "b/e/g.txt",
        "h/i.txt",
    ];

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_leaf_toggle_twice_restores_tree(
            initially_checked in proptest::collection::vec(any::<bool>(), LEAVES.len()),
            target in 0..LEAVES.len(),
        ) {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            runtime.block_on(async {
                let mut f = Fixture::new(&LEAVES);
                let stored: Vec<String> = LEAVES
                    .iter()
                    .zip(&initially_checked)
                    .filter(|(_, checked)| **checked)
                    .map(|(leaf, _)| f.path(leaf).to_string_lossy().to_string())
                    .collect();
                f.store.set(CHECKED_PATHS_KEY, json!(stored)).await.unwrap();
                f.engine.initialize().await;

                let selection_before = f.engine.selection().clone();
                let mut nodes_before: Vec<Node> = f.engine.cache().iter().cloned().collect();
                nodes_before.sort_by(|a, b| a.path.cmp(&b.path));

                let leaf = f.path(LEAVES[target]);
                f.engine.toggle_checkbox(&leaf).await;
                f.engine.toggle_checkbox(&leaf).await;

                let mut nodes_after: Vec<Node> = f.engine.cache().iter().cloned().collect();
                nodes_after.sort_by(|a, b| a.path.cmp(&b.path));

                assert_eq!(f.engine.selection(), &selection_before);
                assert_eq!(nodes_after, nodes_before);
            });
        }
    }
}
