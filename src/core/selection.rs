//! The authoritative set of checked paths.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Absolute paths the user has checked, plus the folders the aggregation
/// rule has marked fully checked.
///
/// This is the unit of persistence: it round-trips through a list of
/// strings whose order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    paths: HashSet<PathBuf>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_persisted(stored: Vec<String>) -> Self {
        Self {
            paths: stored.into_iter().map(PathBuf::from).collect(),
        }
    }

    /// Returns the set as a sorted list, ready for the state store.
    pub fn to_persisted(&self) -> Vec<String> {
        let mut list: Vec<String> = self
            .paths
            .iter()
            .map(|p| p.to_string_lossy().to_string())
            .collect();
        list.sort();
        list
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    pub fn insert(&mut self, path: PathBuf) -> bool {
        self.paths.insert(path)
    }

    pub fn remove(&mut self, path: &Path) -> bool {
        self.paths.remove(path)
    }

    pub fn set_checked(&mut self, path: &Path, checked: bool) {
        if checked {
            self.paths.insert(path.to_path_buf());
        } else {
            self.paths.remove(path);
        }
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// All members, sorted.
    pub fn sorted(&self) -> Vec<PathBuf> {
        let mut list: Vec<PathBuf> = self.paths.iter().cloned().collect();
        list.sort();
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persisted_round_trip_deduplicates() {
        let set = SelectionSet::from_persisted(vec![
            "/w/b.txt".to_string(),
            "/w/a.txt".to_string(),
            "/w/b.txt".to_string(),
        ]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.to_persisted(), vec!["/w/a.txt", "/w/b.txt"]);
    }

    #[test]
    fn test_set_checked_adds_and_removes() {
        let mut set = SelectionSet::new();
        let path = Path::new("/w/a.txt");
        set.set_checked(path, true);
        assert!(set.contains(path));
        set.set_checked(path, false);
        assert!(set.is_empty());
    }
}
