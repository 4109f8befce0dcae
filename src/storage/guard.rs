//! Path guard
//!
//! Textual directory-escape policy for CWD. The check never resolves
//! symlinks or canonicalizes `.`/`..` segments, so it is not a robust
//! jail: an absolute path that string-prefixes the session root is
//! accepted even when it contains `../`. That tolerance is preserved
//! for behavioral compatibility (see DESIGN.md).

use std::path::Path;

/// Returns true when `path` violates the escape policy anchored at
/// `session_root`:
/// - exactly `.` or `..`
/// - starting with `./` or `../`
/// - containing `../` anywhere, unless the path is absolute and the
///   session root is a string prefix of it
pub fn is_illegal_path(path: &str, session_root: &Path) -> bool {
    if path == "." || path == ".." {
        return true;
    }
    if path.starts_with("./") || path.starts_with("../") {
        return true;
    }
    if !path.contains("../") {
        return false;
    }

    // Absolute continuation of the session root: tolerated.
    if path.starts_with('/') {
        let root = session_root.to_string_lossy();
        if path.starts_with(root.as_ref()) {
            return false;
        }
    }

    true
}
