//! Project configuration (sourcecss.toml).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use sourcecss_context::{Toolchain, DEFAULT_LIBRARY};
use sourcecss_css::TidyOptions;
use sourcecss_generate::{GeneratorConfig, PathLayout};

/// Configuration file structure.
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub tidy: TidyOptions,
    #[serde(default)]
    pub toolchain: ToolchainConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProjectConfig {
    pub library: String,
    pub source_dir: String,
    pub dist_dir: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        let layout = PathLayout::default();
        Self {
            library: DEFAULT_LIBRARY.to_string(),
            source_dir: layout.source_dir,
            dist_dir: layout.dist_dir,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToolchainConfig {
    pub node: String,
    pub esbuild: Option<String>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            node: "node".to_string(),
            esbuild: None,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5173,
            host: "127.0.0.1".to_string(),
        }
    }
}

impl ConfigFile {
    /// Generator settings for a project root.
    pub fn generator(&self, root: &Path) -> GeneratorConfig {
        GeneratorConfig {
            library: PathBuf::from(&self.project.library),
            layout: PathLayout {
                source_dir: self.project.source_dir.clone(),
                dist_dir: self.project.dist_dir.clone(),
            },
            tidy: self.tidy.clone(),
            ..GeneratorConfig::new(root)
        }
    }

    /// External programs, with relative paths taken from the project root.
    pub fn toolchain(&self, root: &Path) -> Toolchain {
        Toolchain {
            node: program_path(root, &self.toolchain.node),
            esbuild: self
                .toolchain
                .esbuild
                .as_deref()
                .map(|esbuild| program_path(root, esbuild)),
        }
    }
}

/// Bare program names are looked up on PATH; anything with a separator is
/// a path relative to the root.
fn program_path(root: &Path, program: &str) -> PathBuf {
    let path = Path::new(program);
    if path.is_absolute() || path.components().count() == 1 {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Resolve the config path against the project root.
pub fn config_path(root: &Path, config: &Path) -> PathBuf {
    if config.is_absolute() {
        config.to_path_buf()
    } else {
        root.join(config)
    }
}

/// Load configuration from `path` if it exists.
/// Returns an error if the config file exists but is malformed.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        tracing::debug!("No {} found, using defaults", path.display());
        return Ok(ConfigFile::default());
    }

    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let config: ConfigFile =
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;

    tracing::info!("Loaded config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn missing_file_uses_defaults() {
        let temp = tempdir().unwrap();

        let config = load_config(&temp.path().join("sourcecss.toml")).unwrap();

        assert_eq!(config, ConfigFile::default());
        assert_eq!(config.project.library, DEFAULT_LIBRARY);
        assert_eq!(config.server.port, 5173);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("sourcecss.toml");
        fs::write(&path, "[tidy]\nminify = true\n\n[server]\nport = 8080\n").unwrap();

        let config = load_config(&path).unwrap();

        assert!(config.tidy.minify);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.project, ProjectConfig::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("sourcecss.toml");
        fs::write(&path, "[project\nlibrary = 1").unwrap();

        let err = load_config(&path).unwrap_err();

        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn unknown_sections_are_rejected() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("sourcecss.toml");
        fs::write(&path, "[docs]\ndir = \"docs\"\n").unwrap();

        assert!(load_config(&path).is_err());
    }

    #[test]
    fn builds_generator_config() {
        let config: ConfigFile =
            toml::from_str("[project]\nlibrary = \"vendor/source\"\ndist_dir = \"build\"\n").unwrap();

        let generator = config.generator(Path::new("/project"));

        assert_eq!(generator.root, PathBuf::from("/project"));
        assert_eq!(generator.library, PathBuf::from("vendor/source"));
        assert_eq!(generator.layout.source_dir, "src");
        assert_eq!(generator.layout.dist_dir, "build");
    }

    #[test]
    fn resolves_toolchain_paths() {
        let config: ConfigFile =
            toml::from_str("[toolchain]\nesbuild = \"node_modules/.bin/esbuild\"\n").unwrap();

        let toolchain = config.toolchain(Path::new("/project"));

        assert_eq!(toolchain.node, PathBuf::from("node"));
        assert_eq!(
            toolchain.esbuild,
            Some(PathBuf::from("/project/node_modules/.bin/esbuild"))
        );
    }
}
