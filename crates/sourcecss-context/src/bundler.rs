//! Bundling a style module into one self-contained script.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};

use crate::loader::LoadError;

/// Extra named imports bundled next to the entry module, so that symbols the
/// entry does not import itself (a theme, a markup renderer) become reachable
/// from the same context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraImport {
    /// Module specifier, resolved from the entry's directory
    pub from: String,

    /// Exported names to re-export
    pub names: Vec<String>,
}

/// Turns an entry module into a script runnable in an empty sandbox.
pub trait Bundler: Send + Sync {
    /// Bundle `entry` and its transitive imports.
    fn bundle(&self, entry: &Path, imports: &[ExtraImport]) -> Result<String, LoadError>;
}

/// Bundles with the esbuild executable, targeting node as CommonJS.
///
/// Top-level bindings of every bundled module are hoisted to the script's
/// top level, which is what makes them visible as context globals.
#[derive(Debug, Clone)]
pub struct EsbuildBundler {
    executable: PathBuf,
}

impl EsbuildBundler {
    /// Use a specific esbuild executable.
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// Prefer the project's own esbuild, falling back to the one on PATH.
    pub fn locate(root: &Path) -> Self {
        let local = root.join("node_modules").join(".bin").join("esbuild");
        if local.exists() {
            Self::new(local)
        } else {
            Self::new("esbuild")
        }
    }

    /// Path of the executable in use.
    pub fn executable(&self) -> &Path {
        &self.executable
    }
}

impl Bundler for EsbuildBundler {
    fn bundle(&self, entry: &Path, imports: &[ExtraImport]) -> Result<String, LoadError> {
        let mut command = Command::new(&self.executable);
        command.args([
            "--bundle",
            "--platform=node",
            "--format=cjs",
            "--log-level=error",
        ]);

        let stdin_entry = if imports.is_empty() {
            command.arg(entry);
            None
        } else {
            let resolve_dir = entry.parent().unwrap_or(Path::new("."));
            command
                .arg(format!("--resolve-dir={}", resolve_dir.display()))
                .arg("--sourcefile=entry.js");
            Some(synthetic_entry(entry, imports))
        };

        command
            .stdin(if stdin_entry.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        tracing::debug!("Bundling {} with {}", entry.display(), self.executable.display());

        let mut child = command.spawn().map_err(|e| LoadError::Spawn {
            program: self.executable.display().to_string(),
            message: e.to_string(),
        })?;

        if let Some(code) = stdin_entry {
            if let Some(mut stdin) = child.stdin.take() {
                stdin
                    .write_all(code.as_bytes())
                    .map_err(|e| LoadError::Bundle {
                        module: entry.to_path_buf(),
                        message: e.to_string(),
                    })?;
            }
        }

        let output = child.wait_with_output().map_err(|e| LoadError::Bundle {
            module: entry.to_path_buf(),
            message: e.to_string(),
        })?;

        if !output.status.success() {
            return Err(LoadError::Bundle {
                module: entry.to_path_buf(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|e| LoadError::Bundle {
            module: entry.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Entry source re-exporting the module plus the requested extra imports.
fn synthetic_entry(entry: &Path, imports: &[ExtraImport]) -> String {
    let quote = |s: &str| serde_json::Value::String(s.to_string()).to_string();

    let mut source = format!("export * from {};\n", quote(&entry.to_string_lossy()));
    for import in imports {
        source.push_str(&format!(
            "export {{ {} }} from {};\n",
            import.names.join(", "),
            quote(&import.from)
        ));
    }
    source
}

/// Reads a module that is already a self-contained script.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughBundler;

impl Bundler for PassthroughBundler {
    fn bundle(&self, entry: &Path, imports: &[ExtraImport]) -> Result<String, LoadError> {
        if !imports.is_empty() {
            return Err(LoadError::Bundle {
                module: entry.to_path_buf(),
                message: "extra imports need a real bundler".to_string(),
            });
        }

        fs::read_to_string(entry).map_err(|e| LoadError::Bundle {
            module: entry.to_path_buf(),
            message: e.to_string(),
        })
    }
}
