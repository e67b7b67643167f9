//! Sandbox preview server for generated stylesheets.
//!
//! Serves a catalog page previewing every generated class, the stylesheets
//! themselves, and a WebSocket that tells open pages to reload after the
//! recipe watcher has regenerated stylesheets.

pub mod catalog;
pub mod reload;
pub mod server;
pub mod templates;
pub mod watcher;

pub use catalog::{Catalog, ComponentEntry, IconPage, ICONS_PER_PAGE};
pub use templates::TemplateEngine;
pub use reload::{ReloadHub, ReloadMessage};
pub use server::{PlaygroundConfig, PlaygroundServer, RebuildGenerator, ServerError};
pub use watcher::{RecipeWatcher, WatchEvent};
