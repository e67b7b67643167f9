//! CLI subcommands.

pub mod dev;
pub mod generate;
pub mod init;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sourcecss_context::{find_project_root, ContextLoader};
use sourcecss_generate::Generator;

use crate::config::{config_path, load_config, ConfigFile};

/// A resolved project: its root and configuration.
pub struct Project {
    pub root: PathBuf,
    pub config_file: PathBuf,
    pub config: ConfigFile,
}

impl Project {
    /// Find the project root above the working directory and load its config.
    pub fn discover(config: &Path) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        let root = find_project_root(&cwd)?;
        tracing::debug!("Project root: {}", root.display());

        let config_file = config_path(&root, config);
        Self::load(root, config_file)
    }

    /// Load the config file of a known root.
    pub fn load(root: PathBuf, config_file: PathBuf) -> Result<Self> {
        let config = load_config(&config_file)?;

        Ok(Self {
            root,
            config_file,
            config,
        })
    }

    /// Generator using node and esbuild for every style context.
    pub fn generator(&self) -> Generator {
        let loader = ContextLoader::for_project(&self.root, &self.config.toolchain(&self.root));
        Generator::new(self.config.generator(&self.root), loader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn generator_reflects_the_config_on_disk() {
        let temp = tempdir().unwrap();
        let root = temp.path().to_path_buf();
        let config_file = root.join("sourcecss.toml");

        let before = Project::load(root.clone(), config_file.clone()).unwrap();
        assert!(!before.generator().config().tidy.minify);

        fs::write(&config_file, "[tidy]\nminify = true\n").unwrap();
        let after = Project::load(root, config_file).unwrap();
        assert!(after.generator().config().tidy.minify);
    }
}
