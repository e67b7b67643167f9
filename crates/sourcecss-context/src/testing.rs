//! In-memory sandbox answering from Rust values instead of running node.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::bundler::{Bundler, ExtraImport};
use crate::expr::StyleExpr;
use crate::loader::{ContextLoader, LoadError};
use crate::sandbox::{Sandbox, SandboxSession};
use crate::value::StyleValue;

type HostFn = Arc<dyn Fn(&[StaticValue]) -> Result<StaticValue, String> + Send + Sync>;

/// A binding inside a [`StaticModule`].
#[derive(Clone)]
pub enum StaticValue {
    Value(StyleValue),
    Function(String, HostFn),
}

impl StaticValue {
    /// Wrap a Rust closure as a function binding.
    pub fn function<F>(name: &str, f: F) -> Self
    where
        F: Fn(&[StaticValue]) -> Result<StaticValue, String> + Send + Sync + 'static,
    {
        Self::Function(name.to_string(), Arc::new(f))
    }

    /// The plain value, with functions reduced to their name.
    pub fn to_value(&self) -> StyleValue {
        match self {
            Self::Value(value) => value.clone(),
            Self::Function(name, _) => StyleValue::Function(name.clone()),
        }
    }
}

/// The symbols of one fake module.
#[derive(Clone, Default)]
pub struct StaticModule {
    bindings: BTreeMap<String, StaticValue>,
}

impl StaticModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a plain value.
    pub fn value(mut self, name: &str, value: StyleValue) -> Self {
        self.bindings
            .insert(name.to_string(), StaticValue::Value(value));
        self
    }

    /// Bind a function over plain values.
    pub fn function<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&[StyleValue]) -> Result<StyleValue, String> + Send + Sync + 'static,
    {
        let binding = StaticValue::function(name, move |args| {
            let plain: Vec<StyleValue> = args.iter().map(StaticValue::to_value).collect();
            f(&plain).map(StaticValue::Value)
        });
        self.bindings.insert(name.to_string(), binding);
        self
    }

    /// Bind an already built [`StaticValue`], e.g. a curried function.
    pub fn binding(mut self, name: &str, value: StaticValue) -> Self {
        self.bindings.insert(name.to_string(), value);
        self
    }
}

/// Sandbox serving fixed modules keyed by path.
///
/// Every session gets its own copy of the module's bindings.
#[derive(Clone, Default)]
pub struct StaticSandbox {
    modules: HashMap<PathBuf, StaticModule>,
}

impl StaticSandbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module under `path`.
    pub fn with_module(mut self, path: impl Into<PathBuf>, module: StaticModule) -> Self {
        self.modules.insert(path.into(), module);
        self
    }
}

impl Sandbox for StaticSandbox {
    fn start(&self, module: &Path, _code: &str) -> Result<Box<dyn SandboxSession>, LoadError> {
        let found = self
            .modules
            .get(module)
            .cloned()
            .ok_or_else(|| LoadError::Execution {
                module: module.to_path_buf(),
                message: "Cannot find module".to_string(),
            })?;

        Ok(Box::new(StaticSession {
            module: module.to_path_buf(),
            names: found.bindings.keys().cloned().collect(),
            bindings: found.bindings,
        }))
    }
}

struct StaticSession {
    module: PathBuf,
    names: Vec<String>,
    bindings: BTreeMap<String, StaticValue>,
}

impl StaticSession {
    fn eval(&self, expr: &StyleExpr) -> Result<StaticValue, LoadError> {
        let failed = |message: String| LoadError::Evaluation {
            module: self.module.clone(),
            message,
        };

        match expr {
            StyleExpr::Global { name } => {
                self.bindings
                    .get(name)
                    .cloned()
                    .ok_or_else(|| LoadError::MissingExport {
                        name: name.clone(),
                        module: self.module.clone(),
                    })
            }
            StyleExpr::Member { object, property } => {
                let target = self.eval(object)?.to_value();
                target
                    .get(property)
                    .cloned()
                    .map(StaticValue::Value)
                    .ok_or_else(|| failed(format!("cannot read \"{property}\"")))
            }
            StyleExpr::Call { callee, args } => {
                let StaticValue::Function(_, f) = self.eval(callee)? else {
                    return Err(failed("not a function".to_string()));
                };
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                f(&args).map_err(failed)
            }
            StyleExpr::Literal { value } => {
                Ok(StaticValue::Value(StyleValue::from_wire(value.clone())))
            }
            StyleExpr::Object { entries } => {
                let entries = entries
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), self.eval(v)?.to_value())))
                    .collect::<Result<Vec<_>, LoadError>>()?;
                Ok(StaticValue::Value(StyleValue::Object(entries)))
            }
            StyleExpr::Array { items } => {
                let items = items
                    .iter()
                    .map(|item| Ok(self.eval(item)?.to_value()))
                    .collect::<Result<Vec<_>, LoadError>>()?;
                Ok(StaticValue::Value(StyleValue::Array(items)))
            }
        }
    }
}

impl SandboxSession for StaticSession {
    fn names(&self) -> &[String] {
        &self.names
    }

    fn evaluate(&mut self, expr: &StyleExpr) -> Result<StyleValue, LoadError> {
        self.eval(expr).map(|value| value.to_value())
    }
}

/// Bundler that produces no code; [`StaticSandbox`] ignores it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBundler;

impl Bundler for NoopBundler {
    fn bundle(&self, _entry: &Path, _imports: &[ExtraImport]) -> Result<String, LoadError> {
        Ok(String::new())
    }
}

impl ContextLoader {
    /// Loader backed by an in-memory sandbox.
    pub fn in_memory(sandbox: StaticSandbox) -> Self {
        Self::new(NoopBundler, sandbox)
    }
}
