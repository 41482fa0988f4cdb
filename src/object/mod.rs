pub(crate) mod array;
pub(crate) mod key;
pub(crate) mod map;

use ::std::fmt::Display;
use ::std::fmt::Formatter;
use ::std::fmt::Result as FmtResult;

use self::array::Array;
use self::map::Map;
use crate::fmt::write_value;

/// A document value. The container variants hold aliasing handles, so a
/// `Value` graph can share subtrees and form reference cycles; the
/// primitive variants are plain copies.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    String(String),
    Array(Array),
    Map(Map),
}

impl Default for Value {
    fn default() -> Self {
        Self::Null
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write_value(f, self, &mut Vec::new())
    }
}

/// Primitives compare by value, containers by identity. Values of
/// different kinds are unequal; in particular an integer never equals a
/// real of the same magnitude.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(this), Self::Bool(that)) => this == that,
            (Self::Int(this), Self::Int(that)) => this == that,
            (Self::Real(this), Self::Real(that)) => this == that,
            (Self::String(this), Self::String(that)) => this == that,
            (Self::Array(this), Self::Array(that)) => this.ptr_eq(that),
            (Self::Map(this), Self::Map(that)) => this.ptr_eq(that),
            _ => false,
        }
    }
}

mod convert {
    use ::serde_json::Map as JsonMap;
    use ::serde_json::Number as JsonNumber;
    use ::serde_json::Value as JsonValue;

    use super::error::CycleError;
    use super::*;
    use crate::impl_from;

    impl_from!(bool, Bool, Value);
    impl_from!(i32, Int, Value);
    impl_from!(i64, Int, Value);
    impl_from!(f64, Real, Value);
    impl_from!(&str, String, Value);
    impl_from!(String, String, Value);
    impl_from!(Array, Array, Value);
    impl_from!(Map, Map, Value);

    impl Value {
        pub fn as_bool(&self) -> Option<bool> {
            if let Self::Bool(v) = self {
                Some(*v)
            } else {
                None
            }
        }

        pub fn as_int(&self) -> Option<i64> {
            if let Self::Int(v) = self {
                Some(*v)
            } else {
                None
            }
        }

        pub fn as_real(&self) -> Option<f64> {
            if let Self::Real(v) = self {
                Some(*v)
            } else {
                None
            }
        }

        pub fn as_str(&self) -> Option<&str> {
            if let Self::String(v) = self {
                Some(v)
            } else {
                None
            }
        }

        pub fn as_array(&self) -> Option<&Array> {
            if let Self::Array(v) = self {
                Some(v)
            } else {
                None
            }
        }

        pub fn as_map(&self) -> Option<&Map> {
            if let Self::Map(v) = self {
                Some(v)
            } else {
                None
            }
        }

        pub fn is_null(&self) -> bool {
            matches!(self, Self::Null)
        }

        pub fn is_map(&self) -> bool {
            matches!(self, Self::Map(_))
        }
    }

    // JSON trees are acyclic, so ingest is total.
    impl From<JsonValue> for Value {
        fn from(value: JsonValue) -> Self {
            match value {
                JsonValue::Null => Self::Null,
                JsonValue::Bool(boolean) => Self::Bool(boolean),
                JsonValue::Number(number) => {
                    if let Some(int) = number.as_i64() {
                        Self::Int(int)
                    } else {
                        Self::Real(number.as_f64().unwrap_or_default())
                    }
                }
                JsonValue::String(string) => Self::String(string),
                JsonValue::Array(items) => Self::Array(items.into_iter().map(Value::from).collect()),
                JsonValue::Object(entries) => Self::Map(
                    entries
                        .into_iter()
                        .map(|(entry_key, entry_value)| (entry_key, Value::from(entry_value)))
                        .collect(),
                ),
            }
        }
    }

    impl TryFrom<&Value> for JsonValue {
        type Error = CycleError;

        fn try_from(value: &Value) -> Result<Self, Self::Error> {
            json_tree(value, &mut Vec::new())
        }
    }

    /// Structural copy into a JSON tree. Shared subtrees are duplicated;
    /// a container reached while one of its ancestors is still being
    /// copied has no tree representation and fails the whole export.
    fn json_tree(value: &Value, visiting: &mut Vec<usize>) -> Result<JsonValue, CycleError> {
        match value {
            Value::Null => Ok(JsonValue::Null),
            Value::Bool(boolean) => Ok(JsonValue::Bool(*boolean)),
            Value::Int(int) => Ok(JsonValue::Number(JsonNumber::from(*int))),
            Value::Real(real) => Ok(JsonNumber::from_f64(*real)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null)),
            Value::String(string) => Ok(JsonValue::String(string.clone())),
            Value::Array(array) => {
                if visiting.contains(&array.addr()) {
                    return Err(CycleError {
                        object: array.to_string(),
                    });
                }
                visiting.push(array.addr());
                let mut items = Vec::with_capacity(array.len());
                for item in array.items() {
                    items.push(json_tree(&item, visiting)?);
                }
                visiting.pop();
                Ok(JsonValue::Array(items))
            }
            Value::Map(map) => {
                if visiting.contains(&map.addr()) {
                    return Err(CycleError {
                        object: map.to_string(),
                    });
                }
                visiting.push(map.addr());
                let mut entries = JsonMap::new();
                for (entry_key, entry_value) in map.entries() {
                    entries.insert(entry_key, json_tree(&entry_value, visiting)?);
                }
                visiting.pop();
                Ok(JsonValue::Object(entries))
            }
        }
    }
}

pub(crate) mod error {
    use ::thiserror::Error;

    /// Copying a value graph into a JSON tree reached a container that
    /// is its own ancestor. The rendering cuts the back-edge short.
    #[derive(Debug, Error, PartialEq, Clone)]
    #[error("Cycle. Unable to represent the self-referential container {object} as a JSON tree")]
    pub struct CycleError {
        pub(crate) object: String,
    }
}
