//! Small path helpers shared by the engine and the host.

use std::path::{Path, PathBuf};

use crate::core::CoreError;

/// Returns the outermost workspace root that contains `path`. Nested roots
/// lie inside it, so sweeping up to this root covers them too.
pub fn outermost_root<'a>(roots: &'a [PathBuf], path: &Path) -> Option<&'a PathBuf> {
    roots
        .iter()
        .filter(|root| path.starts_with(root))
        .min_by_key(|root| root.as_os_str().len())
}

/// Expresses `path` relative to `root`, joined with `/`.
pub fn relative_slash_path(path: &Path, root: &Path) -> Result<String, CoreError> {
    let relative = path.strip_prefix(root)?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    Ok(parts.join("/"))
}

/// Ancestors of `path` from its parent up to and including `root`.
/// Empty when `path` is `root` or lies outside it.
pub fn ancestors_up_to(path: &Path, root: &Path) -> Vec<PathBuf> {
    if path == root || !path.starts_with(root) {
        return Vec::new();
    }
    path.ancestors()
        .skip(1)
        .take_while(|ancestor| ancestor.starts_with(root))
        .map(Path::to_path_buf)
        .collect()
}

/// Turns an absolute path into a string usable as a single file name.
pub fn sanitize_for_filename(path: &Path) -> String {
    let sanitized: String = path
        .to_string_lossy()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect();
    let trimmed = sanitized.trim_matches('_');
    if trimmed.is_empty() {
        "root".to_string()
    } else {
        trimmed.to_string()
    }
}
