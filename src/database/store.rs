use async_trait::async_trait;
use mongodb::bson::{self, Bson, Document};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::database::json::bson_as_json;
use crate::database::structures::CollectionName;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to connect to the database: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Duplicate key in collection {0}")]
    DuplicateKey(String),

    #[error("Database error: {0}")]
    Driver(#[from] mongodb::error::Error),

    #[error("Failed to encode document: {0}")]
    Serialization(#[from] bson::ser::Error),

    #[error("Failed to decode document: {0}")]
    Deserialization(#[from] bson::de::Error),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InsertOutcome {
    pub acknowledged: bool,
    #[serde(serialize_with = "bson_as_json")]
    pub inserted_id: Bson,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    #[serde(serialize_with = "bson_as_json")]
    pub upserted_id: Bson,
    pub upserted_count: u64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

/// A document store holding the service's collections.
///
/// Every handler performs exactly one call through this trait (player
/// signup performs a lookup before its insert). Implementations own the
/// connection lifecycle; `ensure_connected` is the readiness gate run
/// before any data route.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn ensure_connected(&self) -> Result<()>;

    async fn find(
        &self,
        collection: &str,
        filter: Document,
        sort: Option<Document>,
    ) -> Result<Vec<Document>>;

    async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>>;

    async fn insert_one(&self, collection: &str, document: Document) -> Result<InsertOutcome>;

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> Result<UpdateOutcome>;

    async fn delete_one(&self, collection: &str, filter: Document) -> Result<DeleteOutcome>;
}

/// Fetches every document of `T`'s collection and decodes it into `T`
pub async fn find_all<T>(store: &dyn DocumentStore, sort: Option<Document>) -> Result<Vec<T>>
where
    T: CollectionName + DeserializeOwned,
{
    store
        .find(T::collection_name(), Document::new(), sort)
        .await?
        .into_iter()
        .map(|document| bson::from_document(document).map_err(StoreError::from))
        .collect()
}
