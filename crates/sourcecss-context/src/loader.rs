//! Loading style modules into frozen contexts.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::bundler::{Bundler, EsbuildBundler, ExtraImport};
use crate::expr::StyleExpr;
use crate::sandbox::{NodeSandbox, Sandbox, SandboxSession};
use crate::value::StyleValue;

/// External programs used to load contexts.
#[derive(Debug, Clone)]
pub struct Toolchain {
    /// node executable
    pub node: PathBuf,

    /// esbuild executable; located under the project when absent
    pub esbuild: Option<PathBuf>,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            node: PathBuf::from("node"),
            esbuild: None,
        }
    }
}

/// Errors that can occur while loading or querying a style context.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to start {program}: {message}")]
    Spawn { program: String, message: String },

    #[error("Failed to bundle {}: {message}", .module.display())]
    Bundle { module: PathBuf, message: String },

    #[error("Failed to execute {}: {message}", .module.display())]
    Execution { module: PathBuf, message: String },

    #[error("Failed to evaluate expression in {}: {message}", .module.display())]
    Evaluation { module: PathBuf, message: String },

    #[error("\"{name}\" not found in {} context", .module.display())]
    MissingExport { name: String, module: PathBuf },

    #[error("Sandbox protocol error for {}: {message}", .module.display())]
    Protocol { module: PathBuf, message: String },
}

/// Bundles modules and starts a fresh sandbox for each of them.
///
/// Nothing is cached: every call produces an independent context.
pub struct ContextLoader {
    bundler: Box<dyn Bundler>,
    sandbox: Box<dyn Sandbox>,
}

impl ContextLoader {
    /// Create a loader from a bundler and a sandbox.
    pub fn new(bundler: impl Bundler + 'static, sandbox: impl Sandbox + 'static) -> Self {
        Self {
            bundler: Box::new(bundler),
            sandbox: Box::new(sandbox),
        }
    }

    /// esbuild + node loader for a project.
    pub fn for_project(root: &Path, toolchain: &Toolchain) -> Self {
        let bundler = match &toolchain.esbuild {
            Some(path) => EsbuildBundler::new(path),
            None => EsbuildBundler::locate(root),
        };
        Self::new(bundler, NodeSandbox::new(&toolchain.node))
    }

    /// Load a module into a new context.
    pub fn load(&self, entry: &Path) -> Result<StyleContext, LoadError> {
        self.load_with(entry, &[])
    }

    /// Load a module, bundling extra named imports into the same context.
    pub fn load_with(
        &self,
        entry: &Path,
        imports: &[ExtraImport],
    ) -> Result<StyleContext, LoadError> {
        let code = self.bundler.bundle(entry, imports)?;
        let session = self.sandbox.start(entry, &code)?;

        tracing::debug!(
            "Loaded {} ({} symbols)",
            entry.display(),
            session.names().len()
        );

        Ok(StyleContext::new(entry, session))
    }
}

/// A frozen mapping from symbol name to value for one loaded module.
///
/// Only read access is offered; the sandbox is torn down on drop.
pub struct StyleContext {
    module: PathBuf,
    names: BTreeSet<String>,
    session: Mutex<Box<dyn SandboxSession>>,
}

impl StyleContext {
    fn new(module: &Path, session: Box<dyn SandboxSession>) -> Self {
        Self {
            module: module.to_path_buf(),
            names: session.names().iter().cloned().collect(),
            session: Mutex::new(session),
        }
    }

    /// Module this context was loaded from.
    pub fn module(&self) -> &Path {
        &self.module
    }

    /// Bound symbol names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Whether a symbol is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Fail with [`LoadError::MissingExport`] unless `name` is bound.
    pub fn require(&self, name: &str) -> Result<(), LoadError> {
        if self.contains(name) {
            Ok(())
        } else {
            Err(LoadError::MissingExport {
                name: name.to_string(),
                module: self.module.clone(),
            })
        }
    }

    /// Evaluate an expression against the context.
    pub fn evaluate(&self, expr: &StyleExpr) -> Result<StyleValue, LoadError> {
        let mut session = self.session.lock().map_err(|_| LoadError::Protocol {
            module: self.module.clone(),
            message: "sandbox session poisoned".to_string(),
        })?;
        session.evaluate(expr)
    }
}

impl std::fmt::Debug for StyleContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StyleContext")
            .field("module", &self.module)
            .field("names", &self.names)
            .finish()
    }
}
