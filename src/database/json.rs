use mongodb::bson::{Bson, Document};
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};

/// Renders a BSON value the way a browser client expects to receive it:
/// ObjectIds as hex strings, dates as RFC 3339 strings, numbers as numbers.
pub fn into_json(value: Bson) -> Value {
    match value {
        Bson::Null | Bson::Undefined => Value::Null,
        Bson::Boolean(v) => Value::Bool(v),
        Bson::Int32(v) => Value::from(v),
        Bson::Int64(v) => Value::from(v),
        Bson::Double(v) => Number::from_f64(v).map_or(Value::Null, Value::Number),
        Bson::String(v) => Value::String(v),
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => dt
            .try_to_rfc3339_string()
            .map_or_else(|_| Value::from(dt.timestamp_millis()), Value::String),
        Bson::Array(values) => Value::Array(values.into_iter().map(into_json).collect()),
        Bson::Document(document) => document_into_json(document),
        other => other.into_relaxed_extjson(),
    }
}

pub fn document_into_json(document: Document) -> Value {
    Value::Object(
        document
            .into_iter()
            .map(|(key, value)| (key, into_json(value)))
            .collect::<Map<String, Value>>(),
    )
}

pub fn bson_as_json<S: Serializer>(value: &Bson, serializer: S) -> Result<S::Ok, S::Error> {
    into_json(value.clone()).serialize(serializer)
}
