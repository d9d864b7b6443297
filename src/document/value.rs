//! Field-value serialization.
//!
//! Record attributes arrive as [`FieldValue`]s; this module maps them to
//! JSON. Compound values are serialized recursively; timestamps become
//! RFC 3339 strings.

use serde_json::{Map, Number, Value};

use crate::record::FieldValue;

/// Serializes one field value to JSON.
///
/// Non-finite floats have no JSON representation and collapse to null.
#[must_use]
pub fn serialize_field_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Bool(b) => Value::Bool(*b),
        FieldValue::Integer(i) => Value::Number(Number::from(*i)),
        FieldValue::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        FieldValue::String(s) => Value::String(s.clone()),
        FieldValue::DateTime(dt) => Value::String(dt.to_rfc3339()),
        FieldValue::List(items) => Value::Array(items.iter().map(serialize_field_value).collect()),
        FieldValue::Map(entries) => {
            let mut map = Map::with_capacity(entries.len());
            for (key, entry) in entries {
                map.insert(key.clone(), serialize_field_value(entry));
            }
            Value::Object(map)
        }
    }
}
