//! Style expressions evaluated inside a loaded context.
//!
//! Recipes write expressions as JavaScript source
//! (`buttonStyles({ priority: "primary" })(themeButton)`); they are parsed with
//! oxc and lowered to the small [`StyleExpr`] tree that the sandbox evaluates.
//! Only lookups, member access, calls and literals are accepted, so a recipe
//! can never smuggle arbitrary code into the sandbox.

use std::fmt;
use std::str::FromStr;

use oxc_allocator::Allocator;
use oxc_ast::ast::{Expression, ObjectPropertyKind, PropertyKey};
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An expression over the symbols of a style context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StyleExpr {
    /// A symbol bound in the context (hoisted global or module export)
    Global { name: String },

    /// `object.property`
    Member {
        object: Box<StyleExpr>,
        property: String,
    },

    /// `callee(args...)`
    Call {
        callee: Box<StyleExpr>,
        args: Vec<StyleExpr>,
    },

    /// A JSON literal (string, number, boolean, null)
    Literal { value: Value },

    /// `{ key: value, ... }`
    Object { entries: Vec<(String, StyleExpr)> },

    /// `[a, b, ...]`
    Array { items: Vec<StyleExpr> },
}

/// Errors that can occur when parsing an expression.
#[derive(Debug, thiserror::Error)]
pub enum ExprError {
    #[error("Invalid style expression `{expr}`: {message}")]
    Syntax { expr: String, message: String },

    #[error("Unsupported syntax in style expression `{expr}` at {start}..{end}: {message}")]
    Unsupported {
        expr: String,
        start: u32,
        end: u32,
        message: String,
    },
}

impl StyleExpr {
    /// Parse JavaScript expression source.
    pub fn parse(source: &str) -> Result<Self, ExprError> {
        let allocator = Allocator::default();
        let expression = Parser::new(&allocator, source, SourceType::default())
            .parse_expression()
            .map_err(|errors| ExprError::Syntax {
                expr: source.to_string(),
                message: errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; "),
            })?;

        lower(&expression).map_err(|(span, message)| ExprError::Unsupported {
            expr: source.to_string(),
            start: span.start,
            end: span.end,
            message,
        })
    }

    /// A symbol lookup.
    pub fn global(name: impl Into<String>) -> Self {
        Self::Global { name: name.into() }
    }

    /// `object.property`
    pub fn member(object: StyleExpr, property: impl Into<String>) -> Self {
        Self::Member {
            object: Box::new(object),
            property: property.into(),
        }
    }

    /// `callee(args...)`
    pub fn call(callee: StyleExpr, args: Vec<StyleExpr>) -> Self {
        Self::Call {
            callee: Box::new(callee),
            args,
        }
    }

    /// A string literal.
    pub fn string(value: impl Into<String>) -> Self {
        Self::Literal {
            value: Value::String(value.into()),
        }
    }

    /// An object literal.
    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, StyleExpr)>) -> Self {
        Self::Object {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl FromStr for StyleExpr {
    type Err = ExprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

type Lowered = Result<StyleExpr, (oxc_span::Span, String)>;

fn lower(expression: &Expression<'_>) -> Lowered {
    match expression {
        Expression::Identifier(ident) => Ok(StyleExpr::global(ident.name.as_str())),

        Expression::StaticMemberExpression(member) => Ok(StyleExpr::member(
            lower(&member.object)?,
            member.property.name.as_str(),
        )),

        Expression::ComputedMemberExpression(member) => match &member.expression {
            Expression::StringLiteral(key) => {
                Ok(StyleExpr::member(lower(&member.object)?, key.value.as_str()))
            }
            other => Err((other.span(), "computed member keys must be string literals".into())),
        },

        Expression::CallExpression(call) => {
            let callee = lower(&call.callee)?;
            let args = call
                .arguments
                .iter()
                .map(|arg| match arg.as_expression() {
                    Some(expr) => lower(expr),
                    None => Err((arg.span(), "spread arguments are not supported".into())),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(StyleExpr::call(callee, args))
        }

        Expression::StringLiteral(lit) => Ok(StyleExpr::string(lit.value.as_str())),

        Expression::NumericLiteral(lit) => serde_json::Number::from_f64(lit.value)
            .map(|n| StyleExpr::Literal {
                value: Value::Number(n),
            })
            .ok_or_else(|| (lit.span, "non-finite number".into())),

        Expression::BooleanLiteral(lit) => Ok(StyleExpr::Literal {
            value: Value::Bool(lit.value),
        }),

        Expression::NullLiteral(_) => Ok(StyleExpr::Literal { value: Value::Null }),

        Expression::ObjectExpression(object) => {
            let mut entries = Vec::with_capacity(object.properties.len());
            for property in &object.properties {
                match property {
                    ObjectPropertyKind::ObjectProperty(prop) if !prop.computed => {
                        let key = match &prop.key {
                            PropertyKey::StaticIdentifier(id) => id.name.to_string(),
                            PropertyKey::StringLiteral(lit) => lit.value.to_string(),
                            other => {
                                return Err((other.span(), "unsupported property key".into()))
                            }
                        };
                        entries.push((key, lower(&prop.value)?));
                    }
                    other => {
                        return Err((
                            other.span(),
                            "only plain `key: value` properties are supported".into(),
                        ))
                    }
                }
            }
            Ok(StyleExpr::Object { entries })
        }

        Expression::ArrayExpression(array) => {
            let items = array
                .elements
                .iter()
                .map(|element| match element.as_expression() {
                    Some(expr) => lower(expr),
                    None => Err((element.span(), "holes and spreads are not supported".into())),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(StyleExpr::Array { items })
        }

        Expression::ParenthesizedExpression(inner) => lower(&inner.expression),

        other => Err((other.span(), "expected a lookup, call or literal".into())),
    }
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Prints JavaScript source that parses back to the same expression.
impl fmt::Display for StyleExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global { name } => f.write_str(name),
            Self::Member { object, property } => {
                if is_identifier(property) {
                    write!(f, "{}.{}", object, property)
                } else {
                    write!(f, "{}[{}]", object, Value::String(property.clone()))
                }
            }
            Self::Call { callee, args } => {
                write!(f, "{}(", callee)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
            Self::Literal { value } => write!(f, "{}", value),
            Self::Object { entries } => {
                if entries.is_empty() {
                    return f.write_str("{}");
                }
                f.write_str("{ ")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    if is_identifier(key) {
                        write!(f, "{}: {}", key, value)?;
                    } else {
                        write!(f, "{}: {}", Value::String(key.clone()), value)?;
                    }
                }
                f.write_str(" }")
            }
            Self::Array { items } => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}
