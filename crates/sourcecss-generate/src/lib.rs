//! Stylesheet generators for sourcecss.
//!
//! Each component is described by a [`GeneratorUnit`]: a name, the directory
//! its stylesheet is mapped from, and a [`Recipe`] saying which style
//! expressions to evaluate in which library module. [`Generator`] runs units
//! and writes one tidy stylesheet per component.

pub mod generator;
pub mod icons;
pub mod paths;
pub mod recipe;

pub use generator::{GenerateError, GenerateResult, Generator, GeneratorConfig};
pub use icons::camel_to_kebab;
pub use paths::{dist_path, PathLayout};
pub use recipe::{
    builtin_units, discover_units, load_unit, parse_recipe, select_units, ClassesRecipe,
    GeneratorUnit, IconsRecipe, Recipe, RecipeError, Renderer, RuleRecipe, BUILTIN_RECIPES,
    RECIPE_FILE,
};
