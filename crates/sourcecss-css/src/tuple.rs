//! Class tuples: a class name paired with the CSS rule defining it.

use crate::descriptor::StyleDescriptor;

/// Namespace prefix shared by every generated class.
pub const CLASS_PREFIX: &str = "src-";

/// A class name and the complete rule text that defines it.
///
/// Several tuples may share a class name; they are concatenated, never merged,
/// before the tidy pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassTuple {
    pub class: String,
    pub rule: String,
}

impl ClassTuple {
    /// Pair a class name with ready-made rule text.
    pub fn new(class: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            rule: rule.into(),
        }
    }
}

/// Fold descriptors into declaration text.
///
/// Sequences append their string and fragment elements; a scalar or a
/// fragment on its own replaces whatever was accumulated so far.
pub fn accumulate(descriptors: &[StyleDescriptor]) -> String {
    let mut joined = String::new();

    for descriptor in descriptors {
        match descriptor {
            StyleDescriptor::Sequence(items) => {
                for item in items {
                    match item {
                        StyleDescriptor::Scalar(css) => joined.push_str(css),
                        StyleDescriptor::Fragment { styles } => joined.push_str(styles),
                        StyleDescriptor::Sequence(_) | StyleDescriptor::Opaque => {}
                    }
                }
            }
            StyleDescriptor::Fragment { styles } => joined = styles.clone(),
            StyleDescriptor::Scalar(css) => joined = css.clone(),
            StyleDescriptor::Opaque => joined.clear(),
        }
    }

    joined
}

/// Build `.class {<declarations>}` from descriptors.
pub fn class_tuple(class: &str, descriptors: &[StyleDescriptor]) -> ClassTuple {
    ClassTuple::new(class, format!(".{} {{{}}}", class, accumulate(descriptors)))
}

/// Build a rule for an arbitrary selector, filed under `class`.
///
/// Used for combinator rules such as `.src-label + .src-text-input`.
pub fn combinator_tuple(class: &str, selector: &str, descriptors: &[StyleDescriptor]) -> ClassTuple {
    ClassTuple::new(
        class,
        format!("{} {{\n{}}}\n", selector, accumulate(descriptors)),
    )
}
