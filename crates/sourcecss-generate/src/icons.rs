//! Icon stylesheet generation.
//!
//! Every icon module is rendered to SVG markup inside its own context and
//! turned into a `mask-image` class, so icons take the text colour.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use walkdir::WalkDir;

use sourcecss_context::{ContextLoader, ExtraImport, StyleExpr, StyleValue};
use sourcecss_css::ClassTuple;

use crate::generator::GenerateError;
use crate::recipe::IconsRecipe;

static SVG_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*<svg\b((?:[^>"']|"[^"]*"|'[^']*')*?)(/?)>"#).expect("Invalid svg regex")
});

static ATTRIBUTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s=/>]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#)
        .expect("Invalid attribute regex")
});

/// Root `<svg>` attributes kept in the data URI.
const KEPT_ATTRIBUTES: &[&str] = &["viewBox", "xmlns"];

/// Build size and icon class tuples for an icons recipe.
///
/// `library` is the absolute library directory. The first icon that fails
/// aborts the run.
pub fn icon_tuples(
    loader: &ContextLoader,
    library: &Path,
    recipe: &IconsRecipe,
) -> Result<Vec<ClassTuple>, GenerateError> {
    let sizes = size_table(loader, library, recipe)?;
    let mut tuples: Vec<ClassTuple> = sizes
        .iter()
        .map(|(name, pixels)| size_tuple(name, pixels))
        .collect();

    let pixels = sizes
        .iter()
        .find(|(name, _)| *name == recipe.render_size)
        .map(|(_, pixels)| pixels.clone())
        .ok_or_else(|| GenerateError::Shape {
            expr: format!("{}.{}", recipe.sizes_export, recipe.render_size),
            expected: "number",
            found: "undefined",
        })?;

    for file in icon_files(&library.join(&recipe.icons_dir))? {
        let file_name = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let tuple = icon_tuple(loader, recipe, &file, &pixels).map_err(|e| {
            tracing::error!("Failed to generate icon CSS for {}", file_name);
            GenerateError::IconRender {
                file: file_name.clone(),
                source: Box::new(e),
            }
        })?;
        tuples.push(tuple);
    }

    Ok(tuples)
}

/// `(size name, pixels)` in the order the size module declares them.
fn size_table(
    loader: &ContextLoader,
    library: &Path,
    recipe: &IconsRecipe,
) -> Result<Vec<(String, String)>, GenerateError> {
    let context = loader.load(&library.join(&recipe.sizes_module))?;
    let expr = StyleExpr::global(&recipe.sizes_export);
    let table = context.evaluate(&expr)?;

    let StyleValue::Object(entries) = &table else {
        return Err(GenerateError::Shape {
            expr: expr.to_string(),
            expected: "object",
            found: table.type_name(),
        });
    };

    entries
        .iter()
        .map(|(name, value)| match value {
            StyleValue::Number(n) => Ok((name.clone(), n.to_string())),
            StyleValue::String(s) => Ok((name.clone(), s.clone())),
            other => Err(GenerateError::Shape {
                expr: format!("{}.{}", expr, name),
                expected: "number",
                found: other.type_name(),
            }),
        })
        .collect()
}

fn size_tuple(name: &str, pixels: &str) -> ClassTuple {
    ClassTuple::new(
        format!("src-icon--{name}"),
        format!(".src-icon--{name} {{\twidth: {pixels}px;\n\theight: {pixels}px;\n}}\n"),
    )
}

/// Icon modules in a directory, sorted by file name.
fn icon_files(dir: &Path) -> Result<Vec<PathBuf>, GenerateError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| GenerateError::Read {
            path: dir.to_path_buf(),
            message: e.to_string(),
        })?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "js") {
            files.push(path.to_path_buf());
        }
    }

    Ok(files)
}

fn icon_tuple(
    loader: &ContextLoader,
    recipe: &IconsRecipe,
    file: &Path,
    pixels: &str,
) -> Result<ClassTuple, GenerateError> {
    let icon = file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    let renderer = ExtraImport {
        from: recipe.renderer.from.clone(),
        names: vec![recipe.renderer.name.clone()],
    };
    let context = loader.load_with(file, &[renderer])?;
    context.require(&icon)?;

    let element = StyleExpr::call(
        StyleExpr::global(&icon),
        vec![StyleExpr::object([(
            "size",
            StyleExpr::string(&recipe.render_size),
        )])],
    );
    let render = StyleExpr::call(StyleExpr::global(&recipe.renderer.name), vec![element]);

    let markup = context.evaluate(&render)?;
    let markup = markup.as_str().ok_or_else(|| GenerateError::Shape {
        expr: render.to_string(),
        expected: "string",
        found: markup.type_name(),
    })?;

    let svg = strip_svg_attributes(markup).map_err(|message| GenerateError::Markup {
        file: file.display().to_string(),
        message,
    })?;

    let uri = format!("data:image/svg+xml,{}", urlencoding::encode(&svg));
    let name = camel_to_kebab(&icon).replacen("svg-", "", 1);

    Ok(ClassTuple::new(
        format!("src-icon--{name}"),
        format!(
            ".src-icon--{name} {{\tdisplay: inline-block;\n\
             \twidth: {pixels}px;\n\
             \theight: {pixels}px;\n\
             \tmask-image: url(\"{uri}\");\n\
             \tmask-repeat: no-repeat;\n\
             \tmask-size: contain;\n\
             \tbackground-color: currentcolor;\n\
             }}\n"
        ),
    ))
}

/// Drop every root `<svg>` attribute except `viewBox` and `xmlns`.
///
/// Expects serializer output such as `renderToString` produces: the markup
/// opens with the `<svg>` tag, attribute values are quoted or free of
/// whitespace, and no comment or CDATA section sits inside the tag. A `>`
/// inside a quoted value does not end the tag. Only the opening tag is
/// rewritten; the rest of the markup is copied through.
pub fn strip_svg_attributes(markup: &str) -> Result<String, String> {
    let open = SVG_OPEN_RE
        .captures(markup)
        .ok_or_else(|| "markup does not start with an <svg> element".to_string())?;

    let whole = open.get(0).map_or(0..0, |m| m.range());
    let attributes = open.get(1).map_or("", |m| m.as_str());
    let self_closing = open.get(2).is_some_and(|m| !m.as_str().is_empty());

    let mut tag = String::from("<svg");
    for attribute in ATTRIBUTE_RE.captures_iter(attributes) {
        let name = &attribute[1];
        if !KEPT_ATTRIBUTES.contains(&name) {
            continue;
        }
        let value = attribute
            .get(2)
            .or_else(|| attribute.get(3))
            .or_else(|| attribute.get(4))
            .map_or("", |m| m.as_str());
        tag.push_str(&format!(" {}=\"{}\"", name, value.replace('"', "&quot;")));
    }
    tag.push_str(if self_closing { "/>" } else { ">" });

    Ok(format!("{}{}", tag, &markup[whole.end..]))
}

/// `camelCase` to `kebab-case`.
///
/// A run of capitals stays together as one word, except for a last capital
/// that starts a lowercase word: `svgUIIcon` becomes `svg-ui-icon`.
pub fn camel_to_kebab(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    let mut i = 0;

    while i < chars.len() {
        if !chars[i].is_ascii_uppercase() {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        let mut end = i;
        while end < chars.len() && chars[end].is_ascii_uppercase() {
            end += 1;
        }
        let run = end - i;
        let len = if chars.get(end).is_some_and(|c| c.is_ascii_lowercase()) {
            (run - 1).max(1)
        } else {
            run
        };

        if i > 0 {
            out.push('-');
        }
        out.extend(chars[i..i + len].iter().map(|c| c.to_ascii_lowercase()));
        i += len;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn kebab_cases_icon_names() {
        assert_eq!(camel_to_kebab("svgAlertTriangle"), "svg-alert-triangle");
        assert_eq!(camel_to_kebab("SvgAlertTriangle"), "svg-alert-triangle");
        assert_eq!(camel_to_kebab("svgUIIcon"), "svg-ui-icon");
        assert_eq!(camel_to_kebab("SvgArrowUpStraight"), "svg-arrow-up-straight");
        assert_eq!(camel_to_kebab("loadSVG"), "load-svg");
        assert_eq!(camel_to_kebab("plain"), "plain");
    }

    #[test]
    fn icon_class_names_drop_svg_prefix() {
        assert_eq!(
            camel_to_kebab("svgAlertTriangle").replacen("svg-", "", 1),
            "alert-triangle"
        );
        assert_eq!(camel_to_kebab("svgUIIcon").replacen("svg-", "", 1), "ui-icon");
    }

    #[test]
    fn keeps_only_viewbox_and_xmlns() {
        let markup = r#"<svg width="24" height="24" viewBox="-3 -3 30 30" xmlns="http://www.w3.org/2000/svg" aria-hidden="true" focusable="false"><path d="M1 1"></path></svg>"#;

        assert_eq!(
            strip_svg_attributes(markup).unwrap(),
            r#"<svg viewBox="-3 -3 30 30" xmlns="http://www.w3.org/2000/svg"><path d="M1 1"></path></svg>"#
        );
    }

    #[test]
    fn inner_attributes_are_untouched() {
        let markup = r#"<svg viewBox='0 0 24 24' fill="none"><path fill-rule="evenodd" width="2"/></svg>"#;

        assert_eq!(
            strip_svg_attributes(markup).unwrap(),
            r#"<svg viewBox="0 0 24 24"><path fill-rule="evenodd" width="2"/></svg>"#
        );
    }

    #[test]
    fn quoted_angle_brackets_stay_inside_the_tag() {
        let markup = r#"<svg data-label="a > b" aria-label='c>d' viewBox="0 0 24 24"><path d="M1 1"/></svg>"#;

        assert_eq!(
            strip_svg_attributes(markup).unwrap(),
            r#"<svg viewBox="0 0 24 24"><path d="M1 1"/></svg>"#
        );
    }

    #[test]
    fn self_closing_root_keeps_its_slash() {
        assert_eq!(
            strip_svg_attributes(r#"<svg width="2" viewBox="0 0 2 2"/>"#).unwrap(),
            r#"<svg viewBox="0 0 2 2"/>"#
        );
    }

    #[test]
    fn rejects_non_svg_markup() {
        assert!(strip_svg_attributes("<div></div>").is_err());
        assert!(strip_svg_attributes("").is_err());
    }

    #[test]
    fn size_classes_use_pixels() {
        let tuple = size_tuple("small", "24");

        assert_eq!(tuple.class, "src-icon--small");
        assert_eq!(tuple.rule, ".src-icon--small {\twidth: 24px;\n\theight: 24px;\n}\n");
    }
}
