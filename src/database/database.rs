use crate::database::store::{
    DeleteOutcome, DocumentStore, InsertOutcome, Result, StoreError, UpdateOutcome,
};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{
    ClientOptions, FindOptions, IndexOptions, ServerApi, ServerApiVersion,
};
use mongodb::{Client, Collection, IndexModel};
use tokio::sync::OnceCell;

const DUPLICATE_KEY: i32 = 11000;

/// MongoDB backed document store
///
/// The client is dialed lazily on first use and shared by every request
/// afterwards. Concurrent first callers wait on the same dial, and a failed
/// dial is not remembered so the next request tries again.
pub struct Database {
    connection_url: String,
    database_name: String,
    unique_indexes: Vec<(&'static str, &'static str)>,
    client: OnceCell<Client>,
}

impl Database {
    pub fn new(connection_url: impl Into<String>, database_name: impl Into<String>) -> Self {
        Self {
            connection_url: connection_url.into(),
            database_name: database_name.into(),
            unique_indexes: Vec::new(),
            client: OnceCell::new(),
        }
    }

    /// Registers a unique index created right after the first successful connect
    pub fn with_unique_index(mut self, collection: &'static str, field: &'static str) -> Self {
        self.unique_indexes.push((collection, field));
        self
    }

    pub async fn get(&self) -> Result<&Client> {
        self.client
            .get_or_try_init(|| async {
                let client = connect(&self.connection_url)
                    .await
                    .map_err(|e| StoreError::Connection(e.into()))?;

                log::info!("Connected to MongoDB database {}", self.database_name);

                self.create_unique_indexes(&client).await;
                Ok::<_, StoreError>(client)
            })
            .await
    }

    pub async fn close(&self) {
        if let Some(client) = self.client.get() {
            client.clone().shutdown().await;
            log::info!("MongoDB connection closed");
        }
    }

    async fn collection(&self, name: &str) -> Result<Collection<Document>> {
        let client = self.get().await?;
        Ok(client.database(&self.database_name).collection(name))
    }

    async fn create_unique_indexes(&self, client: &Client) {
        let db = client.database(&self.database_name);

        for &(collection, field) in &self.unique_indexes {
            // Only string values are indexed, so records without the field
            // (or with it nulled) never collide with each other
            let options = IndexOptions::builder()
                .name(format!("{}_unique_string", field))
                .unique(true)
                .partial_filter_expression(doc! { field: { "$type": "string" } })
                .build();
            let index = IndexModel::builder()
                .keys(doc! { field: 1 })
                .options(options)
                .build();

            // Existing duplicates make this fail; the service still runs,
            // falling back to the lookup before insert
            match db.collection::<Document>(collection).create_index(index).await {
                Ok(_) => log::info!("Unique index on {}.{} is in place", collection, field),
                Err(e) => log::warn!(
                    "Could not create unique index on {}.{}: {}",
                    collection,
                    field,
                    e
                ),
            }
        }
    }
}

async fn connect(connection_url: &str) -> mongodb::error::Result<Client> {
    let mut options = ClientOptions::parse(connection_url).await?;
    options.server_api = Some(
        ServerApi::builder()
            .version(ServerApiVersion::V1)
            .strict(true)
            .deprecation_errors(true)
            .build(),
    );

    let client = Client::with_options(options)?;

    // The driver connects lazily, ping so an unreachable cluster fails here
    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await?;

    Ok(client)
}

fn write_error(collection: &str, e: mongodb::error::Error) -> StoreError {
    match *e.kind {
        ErrorKind::Write(WriteFailure::WriteError(ref err)) if err.code == DUPLICATE_KEY => {
            StoreError::DuplicateKey(collection.to_string())
        }
        _ => e.into(),
    }
}

#[async_trait]
impl DocumentStore for Database {
    async fn ensure_connected(&self) -> Result<()> {
        self.get().await.map(|_| ())
    }

    async fn find(
        &self,
        collection: &str,
        filter: Document,
        sort: Option<Document>,
    ) -> Result<Vec<Document>> {
        let collection = self.collection(collection).await?;
        let options = FindOptions::builder().sort(sort).build();

        let cursor = collection.find(filter).with_options(options).await?;
        let results: Vec<Document> = cursor.try_collect().await?;

        Ok(results)
    }

    async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>> {
        let collection = self.collection(collection).await?;

        Ok(collection.find_one(filter).await?)
    }

    async fn insert_one(&self, collection: &str, document: Document) -> Result<InsertOutcome> {
        let handle = self.collection(collection).await?;

        let result = handle
            .insert_one(document)
            .await
            .map_err(|e| write_error(collection, e))?;

        Ok(InsertOutcome {
            acknowledged: true,
            inserted_id: result.inserted_id,
        })
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> Result<UpdateOutcome> {
        let handle = self.collection(collection).await?;

        let result = handle
            .update_one(filter, update)
            .await
            .map_err(|e| write_error(collection, e))?;

        let upserted_count = u64::from(result.upserted_id.is_some());
        Ok(UpdateOutcome {
            acknowledged: true,
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_id: result.upserted_id.unwrap_or(Bson::Null),
            upserted_count,
        })
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> Result<DeleteOutcome> {
        let collection = self.collection(collection).await?;

        let result = collection.delete_one(filter).await?;

        Ok(DeleteOutcome {
            acknowledged: true,
            deleted_count: result.deleted_count,
        })
    }
}
