//! Values returned from a sandbox.

use serde_json::Value;

/// Key the sandbox uses to mark a function that cannot cross the boundary.
pub const FUNCTION_MARKER: &str = "$fn";

/// A value produced by evaluating an expression inside a style context.
///
/// Objects keep the property order of the original JavaScript object.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<StyleValue>),
    Object(Vec<(String, StyleValue)>),
    /// A function, identified by its name
    Function(String),
}

impl StyleValue {
    /// Decode the JSON shape written by the sandbox.
    pub fn from_wire(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from_wire).collect()),
            Value::Object(map) => {
                if map.len() == 1 {
                    if let Some(Value::String(name)) = map.get(FUNCTION_MARKER) {
                        return Self::Function(name.clone());
                    }
                }
                Self::Object(
                    map.into_iter()
                        .map(|(k, v)| (k, Self::from_wire(v)))
                        .collect(),
                )
            }
        }
    }

    /// Borrow the string content, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Look up an object property.
    pub fn get(&self, key: &str) -> Option<&StyleValue> {
        match self {
            Self::Object(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Short name of the value's shape, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
            Self::Function(_) => "function",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_function_markers() {
        let value = StyleValue::from_wire(json!({ "$fn": "secondary" }));
        assert_eq!(value, StyleValue::Function("secondary".into()));
    }

    #[test]
    fn keeps_object_property_order() {
        let value = StyleValue::from_wire(json!({ "xsmall": 20, "small": 24, "medium": 30 }));

        let StyleValue::Object(entries) = value else {
            panic!("expected object");
        };
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["xsmall", "small", "medium"]);
    }

    #[test]
    fn reads_fragment_styles() {
        let value = StyleValue::from_wire(json!({ "name": "x", "styles": "color:red;" }));

        assert_eq!(value.get("styles").and_then(StyleValue::as_str), Some("color:red;"));
        assert_eq!(value.type_name(), "object");
    }
}
