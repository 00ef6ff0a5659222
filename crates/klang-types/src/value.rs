//! Value types for klang's runtime.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind tag of a runtime value.
///
/// Wire names are uppercase (`INT`, `FLOAT`, `STRING`, `BOOLEAN`) to match
/// the snapshot format scripts are tested against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    #[serde(rename = "INT")]
    Int,
    #[serde(rename = "FLOAT")]
    Float,
    #[serde(rename = "STRING")]
    String,
    #[serde(rename = "BOOLEAN")]
    Boolean,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int => write!(f, "INT"),
            DataType::Float => write!(f, "FLOAT"),
            DataType::String => write!(f, "STRING"),
            DataType::Boolean => write!(f, "BOOLEAN"),
        }
    }
}

/// A runtime value.
///
/// Values are copy-by-value; the language never exposes reference aliasing.
/// A STRING whose payload parses as JSON or YAML doubles as a document for
/// the path-based select/edit operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

impl Value {
    /// The kind tag of this value.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Int(_) => DataType::Int,
            Value::Float(_) => DataType::Float,
            Value::Str(_) => DataType::String,
            Value::Bool(_) => DataType::Boolean,
        }
    }

    /// A lowercase type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Bool(_) => "boolean",
        }
    }

    /// String coercion: decimal integers, shortest round-trip floats,
    /// `true`/`false` booleans, strings unchanged.
    pub fn render(&self) -> String {
        match self {
            Value::Int(i) => i.to_string(),
            Value::Float(x) => x.to_string(),
            Value::Str(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
        }
    }

    /// Borrow the string payload, if this is a STRING.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

/// A value bound to a variable name in the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: String,
    pub value: Value,
}

impl Binding {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn data_type(&self) -> DataType {
        self.value.data_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_type_matches_payload() {
        assert_eq!(Value::Int(1).data_type(), DataType::Int);
        assert_eq!(Value::Float(1.5).data_type(), DataType::Float);
        assert_eq!(Value::Str("x".into()).data_type(), DataType::String);
        assert_eq!(Value::Bool(true).data_type(), DataType::Boolean);
    }

    #[test]
    fn render_int_is_decimal() {
        assert_eq!(Value::Int(42).render(), "42");
        assert_eq!(Value::Int(-7).render(), "-7");
    }

    #[test]
    fn render_float_is_shortest_roundtrip() {
        assert_eq!(Value::Float(0.6060606060606061).render(), "0.6060606060606061");
        assert_eq!(Value::Float(7.26).render(), "7.26");
        assert_eq!(Value::Float(2.0).render(), "2");
    }

    #[test]
    fn render_bool_and_string() {
        assert_eq!(Value::Bool(true).render(), "true");
        assert_eq!(Value::Bool(false).render(), "false");
        assert_eq!(Value::Str("abc".into()).render(), "abc");
    }

    #[test]
    fn data_type_wire_names_are_uppercase() {
        assert_eq!(serde_json::to_string(&DataType::Int).unwrap(), "\"INT\"");
        assert_eq!(serde_json::to_string(&DataType::Boolean).unwrap(), "\"BOOLEAN\"");
    }

    #[test]
    fn binding_keeps_name_and_tag() {
        let b = Binding::new("x", Value::Int(3));
        assert_eq!(b.name, "x");
        assert_eq!(b.data_type(), DataType::Int);
    }
}
