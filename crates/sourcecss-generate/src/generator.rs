//! Running generator units.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use sourcecss_context::{library_path, ContextLoader, LoadError, DEFAULT_LIBRARY};
use sourcecss_css::{
    assemble, class_tuple, combinator_tuple, tidy, ClassTuple, StyleDescriptor, TidyError,
    TidyOptions,
};

use crate::icons;
use crate::paths::{dist_path, PathLayout};
use crate::recipe::{discover_units, select_units, ClassesRecipe, GeneratorUnit, Recipe, RecipeError};

/// Configuration for running generators.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Project root
    pub root: PathBuf,

    /// Library directory, relative to the root
    pub library: PathBuf,

    /// Source and distribution tree names
    pub layout: PathLayout,

    /// Formatting of written stylesheets
    pub tidy: TidyOptions,
}

impl GeneratorConfig {
    /// Default configuration for a project root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            library: PathBuf::from(DEFAULT_LIBRARY),
            layout: PathLayout::default(),
            tidy: TidyOptions::default(),
        }
    }
}

/// Result of generating one stylesheet.
#[derive(Debug)]
pub struct GenerateResult {
    /// Component name
    pub component: String,

    /// Written file, relative to the project root
    pub output: PathBuf,

    /// Number of class tuples assembled
    pub rules: usize,

    /// Generation time in milliseconds
    pub duration_ms: u64,
}

/// Errors that can occur during generation.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Tidy(#[from] TidyError),

    #[error(transparent)]
    Recipe(#[from] RecipeError),

    #[error("Failed to generate icon CSS for {file}: {source}")]
    IconRender {
        file: String,
        source: Box<GenerateError>,
    },

    #[error("Expected {expected} from `{expr}`, got {found}")]
    Shape {
        expr: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Unexpected markup from {file}: {message}")]
    Markup { file: String, message: String },

    #[error("Failed to read {}: {message}", .path.display())]
    Read { path: PathBuf, message: String },

    #[error("Failed to write {}: {message}", .path.display())]
    Write { path: PathBuf, message: String },
}

/// Runs generator units against a project.
pub struct Generator {
    config: GeneratorConfig,
    loader: ContextLoader,
}

impl Generator {
    /// Create a generator using `loader` for every style context.
    pub fn new(config: GeneratorConfig, loader: ContextLoader) -> Self {
        Self { config, loader }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate and write one component's stylesheet.
    ///
    /// The stylesheet is rendered in memory and replaces the previous file
    /// in one rename; a failed run leaves the previous file untouched.
    pub fn run(&self, unit: &GeneratorUnit) -> Result<GenerateResult, GenerateError> {
        let start = Instant::now();

        let tuples = match &unit.recipe {
            Recipe::Classes(recipe) => self.class_tuples(recipe)?,
            Recipe::Icons(recipe) => icons::icon_tuples(&self.loader, &self.library_dir(), recipe)?,
        };

        let css = tidy(&assemble(&tuples), &self.config.tidy)?;

        let output = dist_path(&self.config.root, &unit.module_dir, &self.config.layout);
        write_atomic(&self.config.root.join(&output), &css)?;

        let duration = start.elapsed();
        tracing::info!(
            "Generated {} ({} rules) in {}ms",
            output.display(),
            tuples.len(),
            duration.as_millis()
        );

        Ok(GenerateResult {
            component: unit.component.clone(),
            output,
            rules: tuples.len(),
            duration_ms: duration.as_millis() as u64,
        })
    }

    /// Run units in order, stopping at the first failure.
    pub fn run_all(&self, units: &[GeneratorUnit]) -> Result<Vec<GenerateResult>, GenerateError> {
        units.iter().map(|unit| self.run(unit)).collect()
    }

    /// Discover the project's units and run the named ones, or all of them
    /// when `components` is empty.
    pub fn generate(&self, components: &[String]) -> Result<Vec<GenerateResult>, GenerateError> {
        let units = discover_units(&self.config.root, &self.config.layout)?;
        let units = select_units(units, components)?;
        self.run_all(&units)
    }

    fn library_dir(&self) -> PathBuf {
        self.config.root.join(&self.config.library)
    }

    fn class_tuples(&self, recipe: &ClassesRecipe) -> Result<Vec<ClassTuple>, GenerateError> {
        let entry = library_path(&self.config.root, &self.config.library, &recipe.module);
        let context = self.loader.load_with(&entry, &recipe.imports)?;

        let mut tuples = Vec::with_capacity(recipe.rules.len());
        for rule in &recipe.rules {
            let descriptors = rule
                .styles
                .iter()
                .map(|expr| {
                    context
                        .evaluate(expr)
                        .map(|value| StyleDescriptor::from_value(&value))
                })
                .collect::<Result<Vec<_>, _>>()?;

            tuples.push(match &rule.selector {
                Some(selector) => combinator_tuple(&rule.class, selector, &descriptors),
                None => class_tuple(&rule.class, &descriptors),
            });
        }

        Ok(tuples)
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<(), GenerateError> {
    let failed = |e: std::io::Error| GenerateError::Write {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(failed)?;
    }

    let staging = path.with_extension("css.tmp");
    fs::write(&staging, contents).map_err(failed)?;
    fs::rename(&staging, path).map_err(failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::{parse_recipe, IconsRecipe, Renderer};
    use pretty_assertions::assert_eq;
    use sourcecss_context::testing::{StaticModule, StaticSandbox, StaticValue};
    use sourcecss_context::StyleValue;
    use tempfile::tempdir;

    const LIBRARY: &str = "node_modules/@guardian/source/dist";

    fn fragment(styles: &str) -> StyleValue {
        StyleValue::Object(vec![
            ("name".into(), StyleValue::String("x".into())),
            ("styles".into(), StyleValue::String(styles.into())),
        ])
    }

    fn stub_button_module() -> StaticModule {
        StaticModule::new()
            .value("theme", StyleValue::Object(vec![]))
            .function("primary", |_| Ok(fragment("color:red;")))
            .function("secondary", |_| Ok(fragment("color:blue;")))
    }

    fn unit(root: &Path, component: &str, recipe: &str) -> GeneratorUnit {
        let module_dir = PathLayout::default().module_dir(root, component);
        GeneratorUnit {
            component: component.to_string(),
            recipe: parse_recipe(recipe, &module_dir.join("recipe.toml")).unwrap(),
            module_dir,
        }
    }

    const BUTTON: &str = r#"
kind = "classes"
module = "button/styles.js"

[[rules]]
class = "src-button"
styles = ["primary(theme)"]

[[rules]]
class = "src-button--secondary"
styles = ["secondary(theme)"]
"#;

    #[test]
    fn generates_button_stylesheet() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        let sandbox = StaticSandbox::new()
            .with_module(root.join(LIBRARY).join("button/styles.js"), stub_button_module());
        let generator = Generator::new(GeneratorConfig::new(root), ContextLoader::in_memory(sandbox));

        let result = generator.run(&unit(root, "button", BUTTON)).unwrap();

        assert_eq!(result.output, PathBuf::from("dist/button/button.css"));
        assert_eq!(result.rules, 2);
        assert_eq!(
            fs::read_to_string(root.join("dist/button/button.css")).unwrap(),
            ".src-button {\n  color: red;\n}\n\n.src-button--secondary {\n  color: blue;\n}\n"
        );
    }

    #[test]
    fn combinator_rules_merge_with_identical_blocks() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        let module = StaticModule::new()
            .value("labelMargin", fragment("margin-top: 4px;"))
            .value("width30", fragment("width: 30ch;"));
        let sandbox =
            StaticSandbox::new().with_module(root.join(LIBRARY).join("input.js"), module);
        let generator = Generator::new(GeneratorConfig::new(root), ContextLoader::in_memory(sandbox));

        let recipe = r#"
kind = "classes"
module = "input.js"

[[rules]]
class = "src-text-input--width-30"
styles = ["width30.styles"]

[[rules]]
class = "src-text-input"
selector = ".src-label + .src-text-input"
styles = ["labelMargin.styles"]

[[rules]]
class = "src-text-input"
selector = "label:has(.src-label) + .src-text-input"
styles = ["labelMargin.styles"]
"#;
        generator.run(&unit(root, "text-input", recipe)).unwrap();

        assert_eq!(
            fs::read_to_string(root.join("dist/text-input/text-input.css")).unwrap(),
            ".src-text-input--width-30 {\n  width: 30ch;\n}\n\n.src-label + .src-text-input, label:has(.src-label) + .src-text-input {\n  margin-top: 4px;\n}\n"
        );
    }

    #[test]
    fn curried_calls_and_replacing_scalars() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        let module = StaticModule::new()
            .value("themeLabel", StyleValue::Object(vec![]))
            .binding(
                "buttonStyles",
                StaticValue::function("buttonStyles", |_| {
                    Ok(StaticValue::function("styles", |_| {
                        Ok(StaticValue::Value(StyleValue::Array(vec![
                            StyleValue::String("color: red;".into()),
                            fragment("padding: 0;"),
                        ])))
                    }))
                }),
            )
            .function("labelText", |_| Ok(fragment("font-size: 17px;")));
        let sandbox = StaticSandbox::new().with_module(root.join(LIBRARY).join("x.js"), module);
        let generator = Generator::new(GeneratorConfig::new(root), ContextLoader::in_memory(sandbox));

        let recipe = r#"
kind = "classes"
module = "x.js"

[[rules]]
class = "src-x"
styles = ['buttonStyles({ priority: "primary" })(themeLabel)']

[[rules]]
class = "src-x--label"
styles = ['labelText(themeLabel, "medium")', '"display: block;"']
"#;
        generator.run(&unit(root, "x", recipe)).unwrap();

        assert_eq!(
            fs::read_to_string(root.join("dist/x/x.css")).unwrap(),
            ".src-x {\n  color: red;\n  padding: 0;\n}\n\n.src-x--label {\n  display: block;\n}\n"
        );
    }

    #[test]
    fn missing_symbol_fails_without_touching_output() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        let out = root.join("dist/button/button.css");
        fs::create_dir_all(out.parent().unwrap()).unwrap();
        fs::write(&out, "previous").unwrap();

        let module = StaticModule::new()
            .value("theme", StyleValue::Object(vec![]))
            .function("primary", |_| Ok(fragment("color:red;")));
        let sandbox = StaticSandbox::new()
            .with_module(root.join(LIBRARY).join("button/styles.js"), module);
        let generator = Generator::new(GeneratorConfig::new(root), ContextLoader::in_memory(sandbox));

        let err = generator.run(&unit(root, "button", BUTTON)).unwrap_err();

        assert!(matches!(
            err,
            GenerateError::Load(LoadError::MissingExport { ref name, .. }) if name == "secondary"
        ));
        assert_eq!(fs::read_to_string(&out).unwrap(), "previous");
    }

    #[test]
    fn run_all_stops_at_first_failure() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        let sandbox = StaticSandbox::new()
            .with_module(root.join(LIBRARY).join("button/styles.js"), stub_button_module());
        let generator = Generator::new(GeneratorConfig::new(root), ContextLoader::in_memory(sandbox));

        let broken = r#"
kind = "classes"
module = "missing.js"

[[rules]]
class = "src-a"
styles = ["a"]
"#;
        let units = [
            unit(root, "a", broken),
            unit(root, "button", BUTTON),
        ];

        assert!(generator.run_all(&units).is_err());
        assert!(!root.join("dist/button/button.css").exists());
    }

    #[test]
    fn generate_selects_units_by_name() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        let dir = root.join("src/button");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("recipe.toml"), BUTTON).unwrap();
        let sandbox = StaticSandbox::new()
            .with_module(root.join(LIBRARY).join("button/styles.js"), stub_button_module());
        let generator = Generator::new(GeneratorConfig::new(root), ContextLoader::in_memory(sandbox));

        let results = generator.generate(&["button".to_string()]).unwrap();

        assert_eq!(results.len(), 1);
        assert!(root.join("dist/button/button.css").exists());
        assert!(matches!(
            generator.generate(&["card".to_string()]),
            Err(GenerateError::Recipe(RecipeError::UnknownComponent(_)))
        ));
    }

    fn icon_sandbox(root: &Path, broken: bool) -> StaticSandbox {
        let library = root.join(LIBRARY);
        let sizes = StaticModule::new().value(
            "iconSize",
            StyleValue::Object(vec![
                ("xsmall".into(), StyleValue::Number(20.0)),
                ("small".into(), StyleValue::Number(26.0)),
                ("medium".into(), StyleValue::Number(30.0)),
            ]),
        );

        let icon = |name: &'static str, markup: &'static str| {
            StaticModule::new()
                .function(name, |_| Ok(StyleValue::Object(vec![])))
                .function("renderToString", move |_| Ok(StyleValue::String(markup.into())))
        };

        let svg = r#"<svg width="30" height="30" viewBox="-3 -3 30 30" aria-hidden="true"><path d="M0 0"></path></svg>"#;
        let mut sandbox = StaticSandbox::new()
            .with_module(library.join("sizes.js"), sizes)
            .with_module(library.join("icons/SvgAlertTriangle.js"), icon("SvgAlertTriangle", svg));
        if broken {
            sandbox = sandbox.with_module(
                library.join("icons/SvgBroken.js"),
                icon("SvgOther", svg),
            );
        }
        sandbox
    }

    fn icons_unit(root: &Path) -> GeneratorUnit {
        GeneratorUnit {
            component: "icons".into(),
            module_dir: root.join("src/icons"),
            recipe: Recipe::Icons(IconsRecipe {
                icons_dir: "icons".into(),
                sizes_module: "sizes.js".into(),
                sizes_export: "iconSize".into(),
                render_size: "medium".into(),
                renderer: Renderer {
                    from: "react-dom/server".into(),
                    name: "renderToString".into(),
                },
            }),
        }
    }

    fn icon_files(root: &Path, names: &[&str]) {
        let dir = root.join(LIBRARY).join("icons");
        fs::create_dir_all(&dir).unwrap();
        for name in names {
            fs::write(dir.join(name), "").unwrap();
        }
    }

    #[test]
    fn generates_icon_stylesheet() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        icon_files(root, &["SvgAlertTriangle.js", "README.md"]);
        let generator = Generator::new(
            GeneratorConfig::new(root),
            ContextLoader::in_memory(icon_sandbox(root, false)),
        );

        let result = generator.run(&icons_unit(root)).unwrap();

        assert_eq!(result.rules, 4);
        let css = fs::read_to_string(root.join("dist/icons/icons.css")).unwrap();
        assert!(css.starts_with(".src-icon--xsmall {\n  width: 20px;\n  height: 20px;\n}\n"));
        assert!(css.contains(".src-icon--alert-triangle {\n  display: inline-block;\n  width: 30px;\n  height: 30px;\n"));
        assert!(css.contains(
            "mask-image: url(\"data:image/svg+xml,%3Csvg%20viewBox%3D%22-3%20-3%2030%2030%22%3E%3Cpath%20d%3D%22M0%200%22%3E%3C%2Fpath%3E%3C%2Fsvg%3E\");"
        ));
        assert!(css.contains("background-color: currentColor;"));
    }

    #[test]
    fn failing_icon_names_its_file() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        icon_files(root, &["SvgAlertTriangle.js", "SvgBroken.js"]);
        let generator = Generator::new(
            GeneratorConfig::new(root),
            ContextLoader::in_memory(icon_sandbox(root, true)),
        );

        let err = generator.run(&icons_unit(root)).unwrap_err();

        match err {
            GenerateError::IconRender { file, source } => {
                assert_eq!(file, "SvgBroken.js");
                assert!(matches!(
                    *source,
                    GenerateError::Load(LoadError::MissingExport { ref name, .. }) if name == "SvgBroken"
                ));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!root.join("dist/icons/icons.css").exists());
    }
}
