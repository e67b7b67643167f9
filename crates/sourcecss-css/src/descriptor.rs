//! Shapes a style function result can take.

use sourcecss_context::StyleValue;

/// A style function result, classified by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleDescriptor {
    /// Raw CSS declarations
    Scalar(String),

    /// An object carrying a `styles` string
    Fragment { styles: String },

    /// A composition of independent fragments
    Sequence(Vec<StyleDescriptor>),

    /// Anything else; contributes nothing
    Opaque,
}

impl StyleDescriptor {
    /// Classify a value returned from a style context.
    pub fn from_value(value: &StyleValue) -> Self {
        match value {
            StyleValue::String(s) => Self::Scalar(s.clone()),
            StyleValue::Array(items) => Self::Sequence(items.iter().map(Self::from_value).collect()),
            StyleValue::Object(_) => match value.get("styles") {
                Some(StyleValue::String(styles)) => Self::Fragment {
                    styles: styles.clone(),
                },
                _ => Self::Opaque,
            },
            _ => Self::Opaque,
        }
    }

    /// Shorthand for a scalar.
    pub fn scalar(css: impl Into<String>) -> Self {
        Self::Scalar(css.into())
    }

    /// Shorthand for a fragment.
    pub fn fragment(styles: impl Into<String>) -> Self {
        Self::Fragment {
            styles: styles.into(),
        }
    }
}

impl From<&StyleValue> for StyleDescriptor {
    fn from(value: &StyleValue) -> Self {
        Self::from_value(value)
    }
}
