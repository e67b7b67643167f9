//! Initialize sourcecss in a project.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use sourcecss_context::find_project_root;
use sourcecss_generate::{BUILTIN_RECIPES, RECIPE_FILE};

use crate::config::{config_path, load_config};

/// Run the init command.
pub fn run(config: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing sourcecss...");

    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let root = find_project_root(&cwd).unwrap_or_else(|e| {
        tracing::warn!("{}; initializing in {}", e, cwd.display());
        cwd.clone()
    });

    let written = init_project(&root, &config_path(&root, config), yes)?;

    if written == 0 {
        tracing::warn!("Nothing written. Use --yes to overwrite existing files.");
        return Ok(());
    }

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'sourcecss generate' to build the stylesheets.");

    Ok(())
}

/// Write the default config and built-in recipes under `root`, returning
/// how many files were written. Existing files are kept unless `overwrite`.
///
/// Recipes go to the source directory named by the config already on disk.
pub fn init_project(root: &Path, config_file: &Path, overwrite: bool) -> Result<usize> {
    let mut written = 0;

    let project = load_config(config_file)?.project;

    if write_file(config_file, DEFAULT_CONFIG, overwrite)? {
        written += 1;
    }

    let source_dir = root.join(&project.source_dir);
    for (component, recipe) in BUILTIN_RECIPES {
        let path = source_dir.join(component).join(RECIPE_FILE);
        if write_file(&path, recipe, overwrite)? {
            written += 1;
        }
    }

    Ok(written)
}

fn write_file(path: &Path, contents: &str, overwrite: bool) -> Result<bool> {
    if path.exists() && !overwrite {
        tracing::debug!("Keeping existing {}", path.display());
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Created {}", path.display());

    Ok(true)
}

const DEFAULT_CONFIG: &str = r#"# sourcecss configuration

[project]
# Compiled design-system library, relative to the project root
library = "node_modules/@guardian/source/dist"

# Component recipes live in <source_dir>/<component>/recipe.toml
source_dir = "src"

# Stylesheets are written to <dist_dir>/<component>/<component>.css
dist_dir = "dist"

[tidy]
merge_selectors = true
minify = false

[toolchain]
node = "node"
# esbuild = "node_modules/.bin/esbuild"

[server]
port = 5173
"#;
