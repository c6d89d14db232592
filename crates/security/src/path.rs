//! Path confinement: keeps file tools inside the project root.
//!
//! Paths handed to tools are relative to the project root. Resolution is
//! lexical (`.` and `..` are folded without touching the filesystem), then
//! any existing prefix is canonicalized so a symlink cannot lead outside.

use std::path::{Component, Path, PathBuf};

/// Error returned when path validation fails.
#[derive(Debug, thiserror::Error)]
pub enum PathValidationError {
    #[error("Path '{path}' is outside the project root")]
    OutsideRoot { path: String },

    #[error("Path is empty")]
    Empty,

    #[error("Failed to canonicalize path '{path}': {reason}")]
    CanonicalizeFailed { path: String, reason: String },
}

/// Resolve `path` against `root`, refusing anything that ends up outside it.
///
/// Absolute paths are accepted only when they already point under `root`.
/// The returned path need not exist.
pub fn resolve_within(root: &Path, path: &str) -> Result<PathBuf, PathValidationError> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(PathValidationError::Empty);
    }

    let root = std::path::absolute(root)
        .map(|p| normalize(&p))
        .unwrap_or_else(|_| normalize(root));
    let candidate = Path::new(trimmed);
    let joined = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        root.join(candidate)
    };

    let resolved = normalize(&joined);
    if !resolved.starts_with(&root) {
        return Err(PathValidationError::OutsideRoot { path: path.into() });
    }

    // Symlinks: compare canonical forms of the deepest existing ancestor.
    if let Some(existing) = resolved.ancestors().find(|p| p.exists())
        && let Ok(canonical_root) = root.canonicalize()
    {
        let canonical = existing
            .canonicalize()
            .map_err(|e| PathValidationError::CanonicalizeFailed {
                path: path.into(),
                reason: e.to_string(),
            })?;
        if !canonical.starts_with(&canonical_root) {
            return Err(PathValidationError::OutsideRoot { path: path.into() });
        }
    }

    Ok(resolved)
}

/// `path` relative to `root` with forward slashes, for display.
pub fn display_relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Fold `.` and `..` components lexically. `..` at the filesystem root is
/// dropped, matching how the OS resolves it.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() && !out.has_root() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_path_resolves_under_root() {
        let root = Path::new("/work/project");
        let resolved = resolve_within(root, "src/main.rs").unwrap();
        assert_eq!(resolved, PathBuf::from("/work/project/src/main.rs"));
    }

    #[test]
    fn dot_segments_are_folded() {
        let root = Path::new("/work/project");
        let resolved = resolve_within(root, "./src/../lib/./mod.rs").unwrap();
        assert_eq!(resolved, PathBuf::from("/work/project/lib/mod.rs"));
    }

    #[test]
    fn traversal_outside_root_rejected() {
        let root = Path::new("/work/project");
        let err = resolve_within(root, "../../../etc/passwd").unwrap_err();
        assert!(matches!(err, PathValidationError::OutsideRoot { .. }));

        let err = resolve_within(root, "src/../../sibling/file").unwrap_err();
        assert!(matches!(err, PathValidationError::OutsideRoot { .. }));
    }

    #[test]
    fn absolute_paths_must_stay_inside() {
        let root = Path::new("/work/project");
        assert!(resolve_within(root, "/work/project/README.md").is_ok());
        assert!(resolve_within(root, "/etc/passwd").is_err());
        assert!(resolve_within(root, "/work/project-other/x").is_err());
    }

    #[test]
    fn empty_path_rejected() {
        let err = resolve_within(Path::new("/work"), "  ").unwrap_err();
        assert!(matches!(err, PathValidationError::Empty));
    }

    #[test]
    fn root_itself_is_allowed() {
        let root = Path::new("/work/project");
        assert_eq!(resolve_within(root, ".").unwrap(), PathBuf::from("/work/project"));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_escape_rejected() {
        let outside = tempfile::tempdir().unwrap();
        let project = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path(), project.path().join("escape")).unwrap();

        let err = resolve_within(project.path(), "escape/secret.txt").unwrap_err();
        assert!(matches!(err, PathValidationError::OutsideRoot { .. }));
    }

    #[test]
    fn display_is_relative_to_root() {
        let root = Path::new("/work/project");
        let shown = display_relative(root, Path::new("/work/project/src/lib.rs"));
        assert_eq!(shown, "src/lib.rs");
    }
}
