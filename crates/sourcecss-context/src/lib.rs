//! Isolated loading of component-library style modules.
//!
//! A style module is bundled into one self-contained script, executed inside a
//! fresh sandbox, and exposed as a frozen [`StyleContext`] whose symbols can be
//! evaluated with small JavaScript-like [`StyleExpr`] expressions.

pub mod bundler;
pub mod expr;
pub mod loader;
pub mod root;
pub mod sandbox;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod value;

pub use bundler::{Bundler, EsbuildBundler, ExtraImport, PassthroughBundler};
pub use expr::{ExprError, StyleExpr};
pub use loader::{ContextLoader, LoadError, StyleContext, Toolchain};
pub use root::{find_project_root, library_path, ResolutionError, DEFAULT_LIBRARY, ROOT_MARKER};
pub use sandbox::{NodeSandbox, Sandbox, SandboxSession};
pub use value::StyleValue;
