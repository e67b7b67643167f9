//! Project root discovery.

use std::path::{Path, PathBuf};

/// Directory whose presence marks the project root.
pub const ROOT_MARKER: &str = "node_modules";

/// Location of the upstream component library, relative to the project root.
pub const DEFAULT_LIBRARY: &str = "node_modules/@guardian/source/dist";

/// Errors that can occur while locating the project root.
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error("\"node_modules\" directory not found above {}", .start.display())]
    NotFound { start: PathBuf },
}

/// Walk upward from `start` (inclusive) until a directory holding
/// `node_modules` is found.
///
/// The filesystem root itself is never probed.
pub fn find_project_root(start: &Path) -> Result<PathBuf, ResolutionError> {
    let start = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());
    let mut dir = start.as_path();

    while let Some(parent) = dir.parent() {
        if dir.join(ROOT_MARKER).is_dir() {
            return Ok(dir.to_path_buf());
        }
        dir = parent;
    }

    Err(ResolutionError::NotFound { start })
}

/// Full path of a file inside the component library.
pub fn library_path(root: &Path, library: &Path, relative: &str) -> PathBuf {
    root.join(library).join(relative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn finds_marker_in_start_directory() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("node_modules")).unwrap();

        let root = find_project_root(temp.path()).unwrap();

        assert_eq!(root, temp.path().canonicalize().unwrap());
    }

    #[test]
    fn walks_up_to_nearest_marker() {
        let temp = tempdir().unwrap();
        let nested = temp.path().join("src").join("button");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir_all(temp.path().join("node_modules")).unwrap();

        let root = find_project_root(&nested).unwrap();

        assert_eq!(root, temp.path().canonicalize().unwrap());
    }

    #[test]
    fn ignores_marker_files() {
        let temp = tempdir().unwrap();
        let project = temp.path().join("project");
        fs::create_dir_all(project.join("inner")).unwrap();
        fs::create_dir_all(temp.path().join("node_modules")).unwrap();
        // A plain file named node_modules is not a package directory
        fs::write(project.join("node_modules"), "").unwrap();

        let root = find_project_root(&project.join("inner")).unwrap();

        assert_eq!(root, temp.path().canonicalize().unwrap());
    }

    #[test]
    fn fails_without_marker() {
        let temp = tempdir().unwrap();
        let nested = temp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        // Only meaningful when no ancestor of the temp dir has node_modules
        if temp
            .path()
            .ancestors()
            .any(|dir| dir.join(ROOT_MARKER).is_dir())
        {
            return;
        }

        let result = find_project_root(&nested);

        assert!(matches!(result, Err(ResolutionError::NotFound { .. })));
    }

    #[test]
    fn joins_library_paths() {
        let path = library_path(
            Path::new("/project"),
            Path::new(DEFAULT_LIBRARY),
            "react-components/button/styles.js",
        );

        assert_eq!(
            path,
            PathBuf::from(
                "/project/node_modules/@guardian/source/dist/react-components/button/styles.js"
            )
        );
    }
}
