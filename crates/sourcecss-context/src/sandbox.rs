//! Isolated execution of bundled style modules.
//!
//! Each [`SandboxSession`] owns one execution environment holding nothing but
//! the minimal host bindings (`console`, `module`, `exports`, `process`). The
//! node implementation runs every session in its own child process, so a
//! module can neither observe nor mutate the generator or another session.

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde::{Deserialize, Serialize};

use crate::expr::StyleExpr;
use crate::loader::LoadError;
use crate::value::StyleValue;

/// Harness executed by `node` for every session.
const HARNESS: &str = include_str!("harness.js");

/// Starts isolated execution environments.
pub trait Sandbox: Send + Sync {
    /// Execute `code` (the bundle of `module`) in a fresh environment.
    fn start(&self, module: &Path, code: &str) -> Result<Box<dyn SandboxSession>, LoadError>;
}

/// One loaded, frozen execution environment.
pub trait SandboxSession: Send {
    /// Symbols bound by the module: hoisted globals, then module exports.
    fn names(&self) -> &[String];

    /// Evaluate an expression against the environment.
    fn evaluate(&mut self, expr: &StyleExpr) -> Result<StyleValue, LoadError>;
}

/// Runs each session in a separate `node` process.
#[derive(Debug, Clone)]
pub struct NodeSandbox {
    node: PathBuf,
}

impl NodeSandbox {
    /// Use a specific node executable.
    pub fn new(node: impl Into<PathBuf>) -> Self {
        Self { node: node.into() }
    }
}

impl Default for NodeSandbox {
    fn default() -> Self {
        Self::new("node")
    }
}

#[derive(Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Request<'a> {
    Load { code: &'a str },
    Evaluate { expr: &'a StyleExpr },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Response {
    Ready {
        names: Vec<String>,
    },
    Value {
        value: serde_json::Value,
    },
    Failed {
        kind: FailureKind,
        message: String,
        #[serde(default)]
        name: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum FailureKind {
    Execution,
    Evaluation,
    Missing,
    Protocol,
}

impl Sandbox for NodeSandbox {
    fn start(&self, module: &Path, code: &str) -> Result<Box<dyn SandboxSession>, LoadError> {
        let mut child = Command::new(&self.node)
            .arg("-e")
            .arg(HARNESS)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| LoadError::Spawn {
                program: self.node.display().to_string(),
                message: e.to_string(),
            })?;

        let protocol = |message: &str| LoadError::Protocol {
            module: module.to_path_buf(),
            message: message.to_string(),
        };
        let stdin = child.stdin.take().ok_or_else(|| protocol("sandbox stdin unavailable"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| protocol("sandbox stdout unavailable"))?;

        let mut session = NodeSession {
            module: module.to_path_buf(),
            child,
            stdin,
            stdout: BufReader::new(stdout),
            names: Vec::new(),
        };

        tracing::debug!("Starting sandbox for {}", module.display());

        match session.request(&Request::Load { code })? {
            Response::Ready { names } => session.names = names,
            Response::Failed { kind, message, name } => {
                return Err(session.failure(kind, message, name));
            }
            Response::Value { .. } => return Err(protocol("unexpected value reply to load")),
        }

        Ok(Box::new(session))
    }
}

struct NodeSession {
    module: PathBuf,
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    names: Vec<String>,
}

impl NodeSession {
    fn request(&mut self, request: &Request<'_>) -> Result<Response, LoadError> {
        let mut line = serde_json::to_string(request).map_err(|e| self.protocol(e))?;
        line.push('\n');

        self.stdin
            .write_all(line.as_bytes())
            .and_then(|()| self.stdin.flush())
            .map_err(|e| self.protocol(e))?;

        let mut reply = String::new();
        let read = self
            .stdout
            .read_line(&mut reply)
            .map_err(|e| self.protocol(e))?;
        if read == 0 {
            return Err(self.protocol("sandbox exited before replying"));
        }

        serde_json::from_str(&reply).map_err(|e| self.protocol(e))
    }

    fn protocol(&self, message: impl ToString) -> LoadError {
        LoadError::Protocol {
            module: self.module.clone(),
            message: message.to_string(),
        }
    }

    fn failure(&self, kind: FailureKind, message: String, name: Option<String>) -> LoadError {
        let module = self.module.clone();
        match kind {
            FailureKind::Execution => LoadError::Execution { module, message },
            FailureKind::Evaluation => LoadError::Evaluation { module, message },
            FailureKind::Missing => LoadError::MissingExport {
                name: name.unwrap_or_default(),
                module,
            },
            FailureKind::Protocol => LoadError::Protocol { module, message },
        }
    }
}

impl SandboxSession for NodeSession {
    fn names(&self) -> &[String] {
        &self.names
    }

    fn evaluate(&mut self, expr: &StyleExpr) -> Result<StyleValue, LoadError> {
        match self.request(&Request::Evaluate { expr })? {
            Response::Value { value } => Ok(StyleValue::from_wire(value)),
            Response::Failed {
                kind,
                message,
                name,
            } => Err(self.failure(kind, message, name)),
            Response::Ready { .. } => Err(self.protocol("unexpected ready reply to evaluate")),
        }
    }
}

impl Drop for NodeSession {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
