//! Tidying assembled CSS into the published stylesheet.
//!
//! lightningcss parses the text, lowers nested rules and prints it; the
//! lowered rule list then gets one more pass that joins rules with identical
//! declaration blocks when that keeps the cascade intact.

mod merge;

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Features, Targets};
use serde::{Deserialize, Serialize};

use crate::tuple::ClassTuple;

/// Options for the tidy pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TidyOptions {
    /// Merge rules with identical declaration blocks
    pub merge_selectors: bool,

    /// Emit minified CSS instead of the formatted layout
    pub minify: bool,
}

impl Default for TidyOptions {
    fn default() -> Self {
        Self {
            merge_selectors: true,
            minify: false,
        }
    }
}

/// Errors that can occur during the tidy pass.
#[derive(Debug, thiserror::Error)]
pub enum TidyError {
    #[error("CSS syntax error: {0}")]
    Syntax(String),

    #[error("Invalid CSS: {0}")]
    Invalid(String),

    #[error("Failed to print CSS: {0}")]
    Print(String),
}

/// Concatenate the rules of class tuples, each followed by a blank line.
pub fn assemble(tuples: &[ClassTuple]) -> String {
    let mut css = String::new();
    for tuple in tuples {
        css.push_str(&tuple.rule);
        css.push_str("\n\n");
    }
    css
}

/// Tidy raw CSS text.
///
/// Running the pass on its own output returns that output unchanged.
pub fn tidy(css: &str, options: &TidyOptions) -> Result<String, TidyError> {
    let css = css.replace("\n;\n", "\n");
    let lowered = lower(&css, options.merge_selectors)?;

    let mut stylesheet = StyleSheet::parse(&lowered, ParserOptions::default())
        .map_err(|e| TidyError::Print(e.to_string()))?;

    if options.merge_selectors {
        // Folding can leave neighbours that lightningcss joins, which can
        // expose further folds.
        for _ in 0..MAX_MERGE_ROUNDS {
            stylesheet
                .minify(MinifyOptions::default())
                .map_err(|e| TidyError::Invalid(e.to_string()))?;
            let merged = merge::merge(&mut stylesheet.rules);
            tracing::debug!("Merged {} rules with identical declaration blocks", merged);
            if merged == 0 {
                break;
            }
        }
    }

    if stylesheet.rules.0.is_empty() {
        return Ok(String::new());
    }

    let result = stylesheet
        .to_css(PrinterOptions {
            minify: options.minify,
            ..PrinterOptions::default()
        })
        .map_err(|e| TidyError::Print(e.to_string()))?;
    Ok(result.code)
}

const MAX_MERGE_ROUNDS: usize = 8;

/// Targets under which the printer rewrites nesting into flat rules.
fn lowering_targets() -> Targets {
    Targets {
        browsers: None,
        include: Features::Nesting,
        exclude: Features::empty(),
    }
}

/// Parse, optionally minify, and print with nesting lowered.
fn lower(css: &str, minify: bool) -> Result<String, TidyError> {
    let mut stylesheet = StyleSheet::parse(css, ParserOptions::default())
        .map_err(|e| TidyError::Syntax(e.to_string()))?;

    let targets = lowering_targets();
    if minify {
        stylesheet
            .minify(MinifyOptions {
                targets,
                ..MinifyOptions::default()
            })
            .map_err(|e| TidyError::Invalid(e.to_string()))?;
    }
    merge::prune(&mut stylesheet.rules);

    let result = stylesheet
        .to_css(PrinterOptions {
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| TidyError::Print(e.to_string()))?;
    Ok(result.code)
}
