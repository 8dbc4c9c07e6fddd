use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;

/// Values that can be bound as statement parameters or read back from a row.
///
/// The same enum is used for both engines so SQL-building code never branches on driver types:
/// ```rust
/// use finance_storage::prelude::*;
///
/// let params = vec![
///     RowValues::Int(1),
///     RowValues::Text("groceries".into()),
///     RowValues::Bool(true),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value. SQLite stores these as 0/1 and hands them back as `Int`.
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value
    JSON(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl RowValues {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    /// Truthiness of a stored flag.
    ///
    /// A boolean written through SQLite comes back as `Int(0)`/`Int(1)`; only the truth value
    /// survives the round trip, never the original type tag.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RowValues::Bool(value) => Some(*value),
            RowValues::Int(i) => Some(*i != 0),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            RowValues::Float(value) => Some(*value),
            #[allow(clippy::cast_precision_loss)]
            RowValues::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        if let RowValues::Timestamp(value) = self {
            return Some(*value);
        } else if let Some(s) = self.as_text() {
            for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.fZ"] {
                if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                    return Some(dt);
                }
            }
        }
        None
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let RowValues::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    /// Map a JSON value onto the closest row value. Arrays and objects stay JSON.
    #[must_use]
    pub fn from_json(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => RowValues::Null,
            JsonValue::Bool(b) => RowValues::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => RowValues::Int(i),
                None => n.as_f64().map_or(RowValues::Null, RowValues::Float),
            },
            JsonValue::String(s) => RowValues::Text(s),
            other @ (JsonValue::Array(_) | JsonValue::Object(_)) => RowValues::JSON(other),
        }
    }

    /// Booleans become 0/1; everything else passes through unchanged.
    #[must_use]
    pub fn normalize_bool(self) -> Self {
        match self {
            RowValues::Bool(b) => RowValues::Int(i64::from(b)),
            other => other,
        }
    }
}

impl Serialize for RowValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RowValues::Int(i) => serializer.serialize_i64(*i),
            RowValues::Float(f) => serializer.serialize_f64(*f),
            RowValues::Text(s) => serializer.serialize_str(s),
            RowValues::Bool(b) => serializer.serialize_bool(*b),
            RowValues::Timestamp(dt) => {
                serializer.collect_str(&dt.format("%Y-%m-%d %H:%M:%S%.f"))
            }
            RowValues::Null => serializer.serialize_none(),
            RowValues::JSON(value) => value.serialize(serializer),
            RowValues::Blob(bytes) => serializer.collect_seq(bytes.iter()),
        }
    }
}

impl From<i64> for RowValues {
    fn from(value: i64) -> Self {
        RowValues::Int(value)
    }
}

impl From<i32> for RowValues {
    fn from(value: i32) -> Self {
        RowValues::Int(i64::from(value))
    }
}

impl From<f64> for RowValues {
    fn from(value: f64) -> Self {
        RowValues::Float(value)
    }
}

impl From<bool> for RowValues {
    fn from(value: bool) -> Self {
        RowValues::Bool(value)
    }
}

impl From<&str> for RowValues {
    fn from(value: &str) -> Self {
        RowValues::Text(value.to_owned())
    }
}

impl From<String> for RowValues {
    fn from(value: String) -> Self {
        RowValues::Text(value)
    }
}

impl From<NaiveDateTime> for RowValues {
    fn from(value: NaiveDateTime) -> Self {
        RowValues::Timestamp(value)
    }
}

impl<T: Into<RowValues>> From<Option<T>> for RowValues {
    fn from(value: Option<T>) -> Self {
        value.map_or(RowValues::Null, Into::into)
    }
}

/// The params argument of a `query` call.
///
/// Statements with `$N` placeholders accept only [`Params::Positional`]; the other shapes exist
/// because callers hand over loosely typed values (usually decoded JSON) and the shape check has
/// to happen here rather than at the caller.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Params {
    /// No params argument at all.
    #[default]
    None,
    /// Ordered values bound to `$1..$n`.
    Positional(Vec<RowValues>),
    /// A keyed object.
    Named(BTreeMap<String, RowValues>),
    /// A single bare value.
    Scalar(RowValues),
}

impl Params {
    /// Short description of the shape, used in error messages.
    #[must_use]
    pub fn shape(&self) -> &'static str {
        match self {
            Params::None => "no parameters",
            Params::Positional(_) => "an ordered list",
            Params::Named(_) => "a keyed object",
            Params::Scalar(_) => "a single value",
        }
    }
}

impl From<()> for Params {
    fn from((): ()) -> Self {
        Params::None
    }
}

impl From<Vec<RowValues>> for Params {
    fn from(values: Vec<RowValues>) -> Self {
        Params::Positional(values)
    }
}

impl From<&[RowValues]> for Params {
    fn from(values: &[RowValues]) -> Self {
        Params::Positional(values.to_vec())
    }
}

impl<const N: usize> From<[RowValues; N]> for Params {
    fn from(values: [RowValues; N]) -> Self {
        Params::Positional(values.into())
    }
}

impl From<&Vec<RowValues>> for Params {
    fn from(values: &Vec<RowValues>) -> Self {
        Params::Positional(values.clone())
    }
}

impl From<BTreeMap<String, RowValues>> for Params {
    fn from(values: BTreeMap<String, RowValues>) -> Self {
        Params::Named(values)
    }
}

impl From<JsonValue> for Params {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Params::None,
            JsonValue::Array(items) => {
                Params::Positional(items.into_iter().map(RowValues::from_json).collect())
            }
            JsonValue::Object(map) => Params::Named(
                map.into_iter()
                    .map(|(k, v)| (k, RowValues::from_json(v)))
                    .collect(),
            ),
            scalar => Params::Scalar(RowValues::from_json(scalar)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_params_keep_their_shape() {
        assert_eq!(
            Params::from(json!([1, "a", true, null, 2.5])),
            Params::Positional(vec![
                RowValues::Int(1),
                RowValues::Text("a".into()),
                RowValues::Bool(true),
                RowValues::Null,
                RowValues::Float(2.5),
            ])
        );
        assert!(matches!(Params::from(json!({"a": 1})), Params::Named(_)));
        assert!(matches!(Params::from(json!("x")), Params::Scalar(_)));
        assert_eq!(Params::from(json!(null)), Params::None);
    }

    #[test]
    fn bool_normalization_and_truthiness() {
        assert_eq!(RowValues::Bool(true).normalize_bool(), RowValues::Int(1));
        assert_eq!(RowValues::Bool(false).normalize_bool(), RowValues::Int(0));
        assert_eq!(RowValues::Int(7).normalize_bool(), RowValues::Int(7));
        assert_eq!(RowValues::Int(0).as_bool(), Some(false));
        assert_eq!(RowValues::Int(1).as_bool(), Some(true));
        assert_eq!(RowValues::Text("1".into()).as_bool(), None);
    }

    #[test]
    fn serializes_as_plain_json() {
        let values = vec![
            RowValues::Int(3),
            RowValues::Null,
            RowValues::Text("x".into()),
            RowValues::JSON(json!({"k": [1]})),
        ];
        assert_eq!(
            serde_json::to_value(&values).unwrap(),
            json!([3, null, "x", {"k": [1]}])
        );
    }
}
