//! Generator recipes.
//!
//! A recipe is data: which library module to load and which style
//! expressions to evaluate for which class. Built-in recipes cover the
//! button, label, text-input and icon stylesheets; a `recipe.toml` inside
//! `src/<component>/` adds a component or replaces a built-in one.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use walkdir::WalkDir;

use sourcecss_context::{ExtraImport, StyleExpr};
use sourcecss_css::CLASS_PREFIX;

use crate::paths::PathLayout;

/// File name of a component recipe.
pub const RECIPE_FILE: &str = "recipe.toml";

/// Built-in recipes as `(component, recipe.toml text)`.
pub const BUILTIN_RECIPES: &[(&str, &str)] = &[
    ("button", include_str!("builtin/button.toml")),
    ("icons", include_str!("builtin/icons.toml")),
    ("label", include_str!("builtin/label.toml")),
    ("text-input", include_str!("builtin/text-input.toml")),
];

/// How to build one component's stylesheet.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recipe {
    /// Classes built from style expressions in one module
    Classes(ClassesRecipe),

    /// Icon classes built from rendered icon modules
    Icons(IconsRecipe),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClassesRecipe {
    /// Module path relative to the library directory
    pub module: String,

    /// Extra named imports bundled into the module's context
    #[serde(default)]
    pub imports: Vec<ExtraImport>,

    pub rules: Vec<RuleRecipe>,
}

/// One class tuple of a classes recipe.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RuleRecipe {
    /// Class the rule is filed under
    pub class: String,

    /// Selector for combinator rules; `.class` when absent
    #[serde(default)]
    pub selector: Option<String>,

    /// Style expressions, folded in order
    #[serde(deserialize_with = "expr_source")]
    pub styles: Vec<StyleExpr>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IconsRecipe {
    /// Directory of icon modules, relative to the library directory
    pub icons_dir: String,

    /// Module holding the size tokens
    pub sizes_module: String,

    /// Export holding the `name -> pixels` size table
    #[serde(default = "default_sizes_export")]
    pub sizes_export: String,

    /// Size icons are rendered at
    #[serde(default = "default_render_size")]
    pub render_size: String,

    /// Function turning a component element into markup
    pub renderer: Renderer,
}

/// A named export used to render icon elements.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Renderer {
    pub from: String,
    pub name: String,
}

fn default_sizes_export() -> String {
    "iconSize".to_string()
}

fn default_render_size() -> String {
    "medium".to_string()
}

fn expr_source<'de, D>(deserializer: D) -> Result<Vec<StyleExpr>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let sources = Vec::<String>::deserialize(deserializer)?;
    sources
        .iter()
        .map(|source| StyleExpr::parse(source).map_err(serde::de::Error::custom))
        .collect()
}

/// A component name, the directory its output is mapped from, and its recipe.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorUnit {
    pub component: String,
    pub module_dir: PathBuf,
    pub recipe: Recipe,
}

/// Errors that can occur while loading recipes.
#[derive(Debug, thiserror::Error)]
pub enum RecipeError {
    #[error("Failed to read recipe {}: {message}", .path.display())]
    Read { path: PathBuf, message: String },

    #[error("Invalid recipe {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Invalid class name \"{class}\" in {}", .path.display())]
    InvalidClass { path: PathBuf, class: String },

    #[error("Unknown component: {0}")]
    UnknownComponent(String),
}

/// Parse recipe text. `path` is only used in errors.
pub fn parse_recipe(text: &str, path: &Path) -> Result<Recipe, RecipeError> {
    let recipe: Recipe = toml::from_str(text).map_err(|e| RecipeError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    if let Recipe::Classes(classes) = &recipe {
        for rule in &classes.rules {
            if !is_class_name(&rule.class) {
                return Err(RecipeError::InvalidClass {
                    path: path.to_path_buf(),
                    class: rule.class.clone(),
                });
            }
        }
    }

    Ok(recipe)
}

fn is_class_name(class: &str) -> bool {
    class.starts_with(CLASS_PREFIX)
        && class
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// The built-in units, mapped from `<root>/<source_dir>/<component>`.
pub fn builtin_units(root: &Path, layout: &PathLayout) -> Result<Vec<GeneratorUnit>, RecipeError> {
    BUILTIN_RECIPES
        .iter()
        .map(|(component, text)| {
            let module_dir = layout.module_dir(root, component);
            let recipe = parse_recipe(text, &module_dir.join(RECIPE_FILE))?;
            Ok(GeneratorUnit {
                component: component.to_string(),
                module_dir,
                recipe,
            })
        })
        .collect()
}

/// Load the unit defined by `<module_dir>/recipe.toml`.
pub fn load_unit(module_dir: &Path) -> Result<GeneratorUnit, RecipeError> {
    let path = module_dir.join(RECIPE_FILE);
    let text = fs::read_to_string(&path).map_err(|e| RecipeError::Read {
        path: path.clone(),
        message: e.to_string(),
    })?;

    let component = module_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| RecipeError::Read {
            path: path.clone(),
            message: "recipe directory has no name".to_string(),
        })?;

    Ok(GeneratorUnit {
        component,
        module_dir: module_dir.to_path_buf(),
        recipe: parse_recipe(&text, &path)?,
    })
}

/// All units of a project, sorted by component name.
///
/// Recipe files under the source directory take precedence over built-ins.
pub fn discover_units(root: &Path, layout: &PathLayout) -> Result<Vec<GeneratorUnit>, RecipeError> {
    let mut units: BTreeMap<String, GeneratorUnit> = builtin_units(root, layout)?
        .into_iter()
        .map(|unit| (unit.component.clone(), unit))
        .collect();

    let source = root.join(&layout.source_dir);
    if !source.is_dir() {
        return Ok(units.into_values().collect());
    }

    for entry in WalkDir::new(&source)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| RecipeError::Read {
            path: source.clone(),
            message: e.to_string(),
        })?;

        if !entry.file_type().is_dir() {
            continue;
        }

        let dir = entry.path();
        if dir.join(RECIPE_FILE).is_file() {
            let unit = load_unit(dir)?;
            tracing::debug!("Loaded recipe for {} from {}", unit.component, dir.display());
            units.insert(unit.component.clone(), unit);
        } else if !units.contains_key(entry.file_name().to_string_lossy().as_ref()) {
            tracing::warn!("No {} in {}, skipping", RECIPE_FILE, dir.display());
        }
    }

    Ok(units.into_values().collect())
}

/// Pick units by component name, in the order given. No names selects all.
pub fn select_units(
    units: Vec<GeneratorUnit>,
    names: &[String],
) -> Result<Vec<GeneratorUnit>, RecipeError> {
    if names.is_empty() {
        return Ok(units);
    }

    names
        .iter()
        .map(|name| {
            units
                .iter()
                .find(|unit| &unit.component == name)
                .cloned()
                .ok_or_else(|| RecipeError::UnknownComponent(name.clone()))
        })
        .collect()
}
