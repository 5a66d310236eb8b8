/*!
 * Standard Virtual Paths
 * Path constants and small lexical helpers shared by the VFS
 */

use std::path::{Component, Path, PathBuf};

/// Virtual root every confined namespace starts from
pub const ROOT: &str = "/";

/// Temp directory reported when the backend's own lies outside confinement
pub const DEFAULT_TEMP_DIR: &str = "/tmp";

pub const SEPARATOR: char = '/';

pub const LIST_SEPARATOR: char = ':';

/// Lexically clean a path (collapse `.`, `..` and repeated separators)
///
/// `..` at the root is dropped, so an absolute input stays absolute.
/// An empty result becomes `.`.
pub fn clean(path: &Path) -> PathBuf {
    path_clean::clean(path)
}

/// Clean `path` as if it were rooted at `/`
pub fn clean_rooted(path: &Path) -> PathBuf {
    clean(&Path::new(ROOT).join(strip_root(path)))
}

/// Drop any root (and, on Windows, prefix) components
pub fn strip_root(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
        .collect()
}

/// Final component as reported by stat, `/` for the root and `.` for empty
///
/// Taken from the cleaned path, so `a/..` reports `.` and `/a/..` reports `/`.
pub fn base_name(path: &Path) -> String {
    if path.as_os_str().is_empty() {
        return ".".to_string();
    }
    match clean(path).file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None if path.has_root() => ROOT.to_string(),
        None => ".".to_string(),
    }
}
