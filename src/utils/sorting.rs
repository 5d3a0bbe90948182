//! Ordering helpers for tree listings.

use std::cmp::Ordering;

use crate::core::ListedEntry;

/// Compares two labels in natural order ("file2" before "file10").
///
/// Comparison is case-insensitive first; labels that differ only in case
/// fall back to a case-sensitive natural comparison so the order is total.
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    alphanumeric_sort::compare_str(a.to_lowercase(), b.to_lowercase())
        .then_with(|| alphanumeric_sort::compare_str(a, b))
}

/// Sorts entries directories-first, then by label.
pub fn sort_entries(entries: &mut [ListedEntry]) {
    entries.sort_by(|a, b| match (a.is_directory, b.is_directory) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => compare_labels(&a.name, &b.name),
    });
}
