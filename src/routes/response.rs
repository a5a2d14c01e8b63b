use mongodb::bson;
use serde::Serialize;
use serde_json::Value;

pub use crate::database::json::bson_as_json;
use crate::database::json::into_json;
use crate::error::AppError;

/// Renders a list of records through their BSON form
pub fn records_into_json<T: Serialize>(records: Vec<T>) -> Result<Value, AppError> {
    records
        .into_iter()
        .map(|record| -> Result<Value, AppError> { Ok(into_json(bson::to_bson(&record)?)) })
        .collect::<Result<Vec<_>, AppError>>()
        .map(Value::Array)
}

/// Body of a successful mutation: a human readable message and the
/// acknowledgement returned by the store
#[derive(Serialize, Debug)]
pub struct Mutation<T> {
    pub message: &'static str,
    pub result: T,
}
