//! Catalog of generated classes, read back from the written stylesheets.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use walkdir::WalkDir;

/// Icons shown per catalog page.
pub const ICONS_PER_PAGE: usize = 6;

/// Icon size classes, which are not icons themselves.
pub const SIZE_VARIANTS: &[&str] = &["medium", "small", "xsmall"];

const ICONS_COMPONENT: &str = "icons";

static CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.(src-[A-Za-z0-9_-]+)").expect("Invalid class regex")
});

static ICON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.src-icon--([a-z0-9-]+)\s*[,{]").expect("Invalid icon regex")
});

/// Classes of one generated component stylesheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentEntry {
    /// Component name
    pub name: String,

    /// URL of the stylesheet
    pub stylesheet: String,

    /// `src-<name>`
    pub base: String,

    /// Modifier suffixes of `src-<name>--<variant>`
    pub variants: Vec<String>,

    /// Element suffixes of `src-<name>__<part>`
    pub parts: Vec<String>,
}

/// Everything the sandbox page previews.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Catalog {
    pub components: Vec<ComponentEntry>,

    /// Icon stylesheet URL, when icons were generated
    pub icon_stylesheet: Option<String>,

    /// Icon names, sorted
    pub icons: Vec<String>,
}

/// One page of icons.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IconPage {
    pub icons: Vec<String>,

    /// Zero-based page index
    pub index: usize,
    pub total_pages: usize,

    /// One-based position of the first icon on the page
    pub first: usize,

    /// One-based position of the last icon on the page
    pub last: usize,
    pub total: usize,
}

impl Catalog {
    /// Read every `*.css` file under the distribution directory.
    ///
    /// Stylesheet URLs are served under `/<url_prefix>/`.
    pub fn scan(dist_dir: &Path, url_prefix: &str) -> std::io::Result<Self> {
        let mut catalog = Self::default();
        if !dist_dir.is_dir() {
            return Ok(catalog);
        }

        for entry in WalkDir::new(dist_dir).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::other)?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "css") {
                continue;
            }

            let Some(name) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };
            let relative = path.strip_prefix(dist_dir).unwrap_or(path);
            let url = format!(
                "/{}/{}",
                url_prefix.trim_matches('/'),
                relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/")
            );
            let css = fs::read_to_string(path)?;

            if name == ICONS_COMPONENT {
                catalog.icons = icon_names(&css);
                catalog.icon_stylesheet = Some(url);
            } else {
                catalog.components.push(component_entry(&name, url, &css));
            }
        }

        Ok(catalog)
    }

    /// Number of icon pages; at least one.
    pub fn total_pages(&self) -> usize {
        self.icons.len().div_ceil(ICONS_PER_PAGE).max(1)
    }

    /// Icons of page `index`, clamped to the last page.
    pub fn icon_page(&self, index: usize) -> IconPage {
        let total_pages = self.total_pages();
        let index = index.min(total_pages - 1);
        let start = (index * ICONS_PER_PAGE).min(self.icons.len());
        let end = (start + ICONS_PER_PAGE).min(self.icons.len());

        IconPage {
            icons: self.icons[start..end].to_vec(),
            index,
            total_pages,
            first: if start < end { start + 1 } else { 0 },
            last: end,
            total: self.icons.len(),
        }
    }
}

/// Icon names declared in an icon stylesheet, size classes excluded.
pub fn icon_names(css: &str) -> Vec<String> {
    let mut icons: Vec<String> = ICON_RE
        .captures_iter(css)
        .map(|caps| caps[1].to_string())
        .filter(|name| !SIZE_VARIANTS.contains(&name.as_str()))
        .collect();
    icons.sort();
    icons.dedup();
    icons
}

/// Distinct `src-` classes in order of first appearance.
pub fn class_names(css: &str) -> Vec<String> {
    let mut classes: Vec<String> = Vec::new();
    for caps in CLASS_RE.captures_iter(css) {
        let class = &caps[1];
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
    }
    classes
}

fn component_entry(name: &str, stylesheet: String, css: &str) -> ComponentEntry {
    let base = format!("src-{name}");
    let modifier = format!("{base}--");
    let element = format!("{base}__");

    let mut variants = Vec::new();
    let mut parts = Vec::new();
    for class in class_names(css) {
        if let Some(variant) = class.strip_prefix(&modifier) {
            variants.push(variant.to_string());
        } else if let Some(part) = class.strip_prefix(&element) {
            parts.push(part.to_string());
        }
    }

    ComponentEntry {
        name: name.to_string(),
        stylesheet,
        base,
        variants,
        parts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    const ICONS_CSS: &str = ".src-icon--xsmall {\n  width: 20px;\n}\n\n.src-icon--medium {\n  width: 30px;\n}\n\n.src-icon--small {\n  width: 26px;\n}\n\n.src-icon--tick,\n.src-icon--cross {\n  display: inline-block;\n}\n\n.src-icon--alert-triangle {\n  display: inline-block;\n}\n";

    #[test]
    fn icon_names_skip_size_classes() {
        assert_eq!(icon_names(ICONS_CSS), ["alert-triangle", "cross", "tick"]);
    }

    #[test]
    fn collects_variants_and_parts() {
        let css = ".src-label {\n}\n.src-label--small {\n}\n.src-label__optional,\n.src-label__supporting {\n}\n.src-label + .src-text-input {\n}\n";

        let entry = component_entry("label", "/dist/label/label.css".into(), css);

        assert_eq!(entry.base, "src-label");
        assert_eq!(entry.variants, ["small"]);
        assert_eq!(entry.parts, ["optional", "supporting"]);
    }

    #[test]
    fn paginates_icons() {
        let catalog = Catalog {
            icons: (0..14).map(|i| format!("icon-{i:02}")).collect(),
            ..Catalog::default()
        };

        assert_eq!(catalog.total_pages(), 3);

        let first = catalog.icon_page(0);
        assert_eq!(first.icons.len(), 6);
        assert_eq!((first.first, first.last, first.total), (1, 6, 14));

        let last = catalog.icon_page(2);
        assert_eq!(last.icons, ["icon-12", "icon-13"]);
        assert_eq!((last.first, last.last), (13, 14));

        assert_eq!(catalog.icon_page(99).index, 2);
    }

    #[test]
    fn empty_catalog_has_one_empty_page() {
        let page = Catalog::default().icon_page(0);

        assert_eq!(page.total_pages, 1);
        assert!(page.icons.is_empty());
        assert_eq!((page.first, page.last), (0, 0));
    }

    #[test]
    fn scans_distribution_tree() {
        let temp = tempdir().unwrap();
        let dist = temp.path().join("dist");
        fs::create_dir_all(dist.join("button")).unwrap();
        fs::create_dir_all(dist.join("icons")).unwrap();
        fs::write(
            dist.join("button/button.css"),
            ".src-button {\n}\n.src-button--secondary {\n}\n",
        )
        .unwrap();
        fs::write(dist.join("icons/icons.css"), ICONS_CSS).unwrap();
        fs::write(dist.join("button/notes.txt"), "").unwrap();

        let catalog = Catalog::scan(&dist, "dist").unwrap();

        assert_eq!(catalog.components.len(), 1);
        assert_eq!(catalog.components[0].stylesheet, "/dist/button/button.css");
        assert_eq!(catalog.components[0].variants, ["secondary"]);
        assert_eq!(catalog.icon_stylesheet.as_deref(), Some("/dist/icons/icons.css"));
        assert_eq!(catalog.icons.len(), 3);
    }

    #[test]
    fn missing_distribution_tree_is_empty() {
        let temp = tempdir().unwrap();

        assert_eq!(
            Catalog::scan(&temp.path().join("dist"), "dist").unwrap(),
            Catalog::default()
        );
    }
}
