//! Option payloads: exactly ten closed variants.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The value carried by an option, and therefore by an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float32(f32),
    Float64(f64),
    String(String),
    BoolList(Vec<bool>),
    IntList(Vec<i64>),
    Float32List(Vec<f32>),
    Float64List(Vec<f64>),
    StringList(Vec<String>),
}

/// Discriminant of [`OptionValue`]; a question declares which one its
/// options carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Bool,
    Int,
    Float32,
    Float64,
    String,
    BoolList,
    IntList,
    Float32List,
    Float64List,
    StringList,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float32 => "float32",
            ValueKind::Float64 => "float64",
            ValueKind::String => "string",
            ValueKind::BoolList => "bool_list",
            ValueKind::IntList => "int_list",
            ValueKind::Float32List => "float32_list",
            ValueKind::Float64List => "float64_list",
            ValueKind::StringList => "string_list",
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(
            self,
            ValueKind::BoolList
                | ValueKind::IntList
                | ValueKind::Float32List
                | ValueKind::Float64List
                | ValueKind::StringList
        )
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl OptionValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            OptionValue::Bool(_) => ValueKind::Bool,
            OptionValue::Int(_) => ValueKind::Int,
            OptionValue::Float32(_) => ValueKind::Float32,
            OptionValue::Float64(_) => ValueKind::Float64,
            OptionValue::String(_) => ValueKind::String,
            OptionValue::BoolList(_) => ValueKind::BoolList,
            OptionValue::IntList(_) => ValueKind::IntList,
            OptionValue::Float32List(_) => ValueKind::Float32List,
            OptionValue::Float64List(_) => ValueKind::Float64List,
            OptionValue::StringList(_) => ValueKind::StringList,
        }
    }

    /// Classify an untyped JSON value.
    ///
    /// Integers become `Int`, other numbers `Float64`; arrays must be
    /// non-empty and homogeneous. Anything else (null, objects, nested or
    /// mixed arrays) has no variant and yields `None`.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        use serde_json::Value as Json;

        match value {
            Json::Bool(b) => Some(OptionValue::Bool(*b)),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Some(OptionValue::Int(i)),
                None => n.as_f64().map(OptionValue::Float64),
            },
            Json::String(s) => Some(OptionValue::String(s.clone())),
            Json::Array(items) => {
                let first = items.first()?;
                match first {
                    Json::Bool(_) => items
                        .iter()
                        .map(|v| v.as_bool())
                        .collect::<Option<Vec<_>>>()
                        .map(OptionValue::BoolList),
                    Json::String(_) => items
                        .iter()
                        .map(|v| v.as_str().map(str::to_string))
                        .collect::<Option<Vec<_>>>()
                        .map(OptionValue::StringList),
                    Json::Number(_) => {
                        if let Some(ints) =
                            items.iter().map(|v| v.as_i64()).collect::<Option<Vec<i64>>>()
                        {
                            Some(OptionValue::IntList(ints))
                        } else {
                            items
                                .iter()
                                .map(|v| v.as_f64())
                                .collect::<Option<Vec<_>>>()
                                .map(OptionValue::Float64List)
                        }
                    }
                    _ => None,
                }
            }
            Json::Null | Json::Object(_) => None,
        }
    }

    /// Widen a numeric value to `kind` where that loses nothing a JSON
    /// document could express: ints to floats, and float64 to float32 (JSON
    /// has no separate single-precision number). Other mismatches yield
    /// `None`.
    pub fn coerce_to(self, kind: ValueKind) -> Option<Self> {
        if self.kind() == kind {
            return Some(self);
        }
        match (self, kind) {
            (OptionValue::Int(i), ValueKind::Float64) => Some(OptionValue::Float64(i as f64)),
            (OptionValue::Int(i), ValueKind::Float32) => Some(OptionValue::Float32(i as f32)),
            (OptionValue::Float64(f), ValueKind::Float32) => Some(OptionValue::Float32(f as f32)),
            (OptionValue::IntList(v), ValueKind::Float64List) => {
                Some(OptionValue::Float64List(v.into_iter().map(|i| i as f64).collect()))
            }
            (OptionValue::IntList(v), ValueKind::Float32List) => {
                Some(OptionValue::Float32List(v.into_iter().map(|i| i as f32).collect()))
            }
            (OptionValue::Float64List(v), ValueKind::Float32List) => {
                Some(OptionValue::Float32List(v.into_iter().map(|f| f as f32).collect()))
            }
            _ => None,
        }
    }

    /// Short description of an untyped JSON value, for error messages.
    pub fn describe_json(value: &serde_json::Value) -> &'static str {
        use serde_json::Value as Json;

        match value {
            Json::Null => "null",
            Json::Bool(_) => "bool",
            Json::Number(_) => "number",
            Json::String(_) => "string",
            Json::Array(items) if items.is_empty() => "empty array",
            Json::Array(_) => "array",
            Json::Object(_) => "object",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            OptionValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            OptionValue::Float32(f) => Some(f64::from(*f)),
            OptionValue::Float64(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::String(s) => Some(s),
            _ => None,
        }
    }
}

fn join<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(v) => write!(f, "{}", v),
            OptionValue::Int(v) => write!(f, "{}", v),
            OptionValue::Float32(v) => write!(f, "{}", v),
            OptionValue::Float64(v) => write!(f, "{}", v),
            OptionValue::String(v) => f.write_str(v),
            OptionValue::BoolList(v) => join(f, v),
            OptionValue::IntList(v) => join(f, v),
            OptionValue::Float32List(v) => join(f, v),
            OptionValue::Float64List(v) => join(f, v),
            OptionValue::StringList(v) => join(f, v),
        }
    }
}

macro_rules! impl_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for OptionValue {
                fn from(v: $t) -> Self {
                    OptionValue::$variant(v.into())
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i32 => Int,
    i64 => Int,
    f32 => Float32,
    f64 => Float64,
    String => String,
    &str => String,
    Vec<bool> => BoolList,
    Vec<i64> => IntList,
    Vec<f32> => Float32List,
    Vec<f64> => Float64List,
    Vec<String> => StringList,
}

impl From<Vec<&str>> for OptionValue {
    fn from(v: Vec<&str>) -> Self {
        OptionValue::StringList(v.into_iter().map(str::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_scalars_and_lists() {
        assert_eq!(OptionValue::from_json(&json!(true)), Some(OptionValue::Bool(true)));
        assert_eq!(OptionValue::from_json(&json!(3)), Some(OptionValue::Int(3)));
        assert_eq!(OptionValue::from_json(&json!(1.5)), Some(OptionValue::Float64(1.5)));
        assert_eq!(
            OptionValue::from_json(&json!(["a", "b"])),
            Some(OptionValue::from(vec!["a", "b"]))
        );
        assert_eq!(
            OptionValue::from_json(&json!([1, 2])),
            Some(OptionValue::IntList(vec![1, 2]))
        );
        assert_eq!(
            OptionValue::from_json(&json!([1, 2.5])),
            Some(OptionValue::Float64List(vec![1.0, 2.5]))
        );
    }

    #[test]
    fn rejects_values_without_a_variant() {
        assert_eq!(OptionValue::from_json(&json!(null)), None);
        assert_eq!(OptionValue::from_json(&json!({"a": 1})), None);
        assert_eq!(OptionValue::from_json(&json!([])), None);
        assert_eq!(OptionValue::from_json(&json!([1, "a"])), None);
        assert_eq!(OptionValue::from_json(&json!([[1]])), None);
        assert_eq!(OptionValue::describe_json(&json!([])), "empty array");
    }

    #[test]
    fn coercion_only_widens_numbers() {
        assert_eq!(
            OptionValue::Int(2).coerce_to(ValueKind::Float32),
            Some(OptionValue::Float32(2.0))
        );
        assert_eq!(
            OptionValue::IntList(vec![1]).coerce_to(ValueKind::Float64List),
            Some(OptionValue::Float64List(vec![1.0]))
        );
        assert_eq!(OptionValue::Float64(1.5).coerce_to(ValueKind::Int), None);
        assert_eq!(OptionValue::from("1").coerce_to(ValueKind::Int), None);
    }

    #[test]
    fn serializes_with_explicit_kind() {
        let v = OptionValue::Float32(1.5);
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json, json!({"kind": "float32", "value": 1.5}));
        let back: OptionValue = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind(), ValueKind::Float32);
    }

    #[test]
    fn display_joins_lists() {
        assert_eq!(OptionValue::from(vec![1i64, 2, 3]).to_string(), "1, 2, 3");
        assert_eq!(OptionValue::from("Blue").to_string(), "Blue");
    }
}
