//! Mapping component directories to stylesheet paths.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Source and distribution tree names, relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathLayout {
    pub source_dir: String,
    pub dist_dir: String,
}

impl Default for PathLayout {
    fn default() -> Self {
        Self {
            source_dir: "src".to_string(),
            dist_dir: "dist".to_string(),
        }
    }
}

impl PathLayout {
    /// Directory holding a component's recipe.
    pub fn module_dir(&self, root: &Path, component: &str) -> PathBuf {
        root.join(&self.source_dir).join(component)
    }
}

/// Relative stylesheet path for a component directory.
///
/// `src/button` maps to `dist/button/button.css`. A directory outside the
/// source tree keeps its path and only gains the `<name>.css` leaf.
pub fn dist_path(root: &Path, module_dir: &Path, layout: &PathLayout) -> PathBuf {
    let relative = module_dir.strip_prefix(root).unwrap_or(module_dir);

    let mut components = relative.components();
    let mapped = match components.next() {
        Some(Component::Normal(first)) if first == OsStr::new(&layout.source_dir) => {
            Path::new(&layout.dist_dir).join(components.as_path())
        }
        _ => relative.to_path_buf(),
    };

    let leaf = module_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "index".to_string());

    mapped.join(format!("{leaf}.css"))
}
