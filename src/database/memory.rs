use crate::database::identifier::PRIMARY_KEY;
use crate::database::store::{
    DeleteOutcome, DocumentStore, InsertOutcome, Result, StoreError, UpdateOutcome,
};
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use tokio::sync::Mutex;

/// Document store kept in process memory.
///
/// Supports the subset of query semantics the routes rely on: top level
/// equality filters, sorting with MongoDB's cross type ordering, `$set`
/// updates and unique indexes.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<Document>>>,
    unique_indexes: Vec<(&'static str, &'static str)>,
    unreachable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unique_index(mut self, collection: &'static str, field: &'static str) -> Self {
        self.unique_indexes.push((collection, field));
        self
    }

    /// Makes `ensure_connected` fail, as if the cluster could not be reached
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, AtomicOrdering::SeqCst);
    }

    /// Snapshot of a collection in insertion order
    pub async fn documents(&self, collection: &str) -> Vec<Document> {
        self.collections
            .lock()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    fn violates_unique(
        &self,
        collection: &str,
        documents: &[Document],
        candidate: &Document,
        skip: Option<usize>,
    ) -> bool {
        self.unique_indexes
            .iter()
            .filter(|(name, _)| *name == collection)
            .any(|(_, field)| {
                let Some(value @ Bson::String(_)) = candidate.get(*field) else {
                    return false;
                };
                documents
                    .iter()
                    .enumerate()
                    .filter(|(index, _)| Some(*index) != skip)
                    .any(|(_, existing)| existing.get(*field) == Some(value))
            })
    }
}

fn matches(filter: &Document, document: &Document) -> bool {
    filter
        .iter()
        .all(|(key, expected)| document.get(key) == Some(expected))
}

/// Position of a BSON type in MongoDB's comparison order
fn type_rank(value: Option<&Bson>) -> u8 {
    match value {
        Some(Bson::MinKey) => 0,
        None | Some(Bson::Null) | Some(Bson::Undefined) => 1,
        Some(Bson::Int32(_))
        | Some(Bson::Int64(_))
        | Some(Bson::Double(_))
        | Some(Bson::Decimal128(_)) => 2,
        Some(Bson::String(_)) | Some(Bson::Symbol(_)) => 3,
        Some(Bson::Document(_)) => 4,
        Some(Bson::Array(_)) => 5,
        Some(Bson::Binary(_)) => 6,
        Some(Bson::ObjectId(_)) => 7,
        Some(Bson::Boolean(_)) => 8,
        Some(Bson::DateTime(_)) => 9,
        Some(Bson::Timestamp(_)) => 10,
        Some(Bson::RegularExpression(_)) => 11,
        Some(Bson::MaxKey) => 13,
        Some(_) => 12,
    }
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

fn compare(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    let by_type = type_rank(a).cmp(&type_rank(b));
    if by_type != Ordering::Equal {
        return by_type;
    }

    match (a, b) {
        (Some(Bson::String(a)), Some(Bson::String(b))) => a.cmp(b),
        (Some(Bson::ObjectId(a)), Some(Bson::ObjectId(b))) => a.bytes().cmp(&b.bytes()),
        (Some(Bson::Boolean(a)), Some(Bson::Boolean(b))) => a.cmp(b),
        (Some(Bson::DateTime(a)), Some(Bson::DateTime(b))) => a.cmp(b),
        (Some(a), Some(b)) => match (as_f64(a), as_f64(b)) {
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
        _ => Ordering::Equal,
    }
}

fn sort_documents(documents: &mut [Document], sort: &Document) -> Result<()> {
    let mut keys = Vec::with_capacity(sort.len());
    for (field, direction) in sort {
        let descending = match direction {
            Bson::Int32(-1) | Bson::Int64(-1) => true,
            Bson::Int32(1) | Bson::Int64(1) => false,
            Bson::Double(d) if *d == -1.0 => true,
            Bson::Double(d) if *d == 1.0 => false,
            other => {
                return Err(StoreError::InvalidOperation(format!(
                    "bad sort direction {} for {}",
                    other, field
                )))
            }
        };
        keys.push((field.as_str(), descending));
    }

    documents.sort_by(|a, b| {
        keys.iter()
            .map(|(field, descending)| {
                let ordering = compare(a.get(*field), b.get(*field));
                if *descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            })
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });

    Ok(())
}

fn apply_update(document: &Document, update: &Document) -> Result<Document> {
    let mut updated = document.clone();

    for (operator, fields) in update {
        let fields = match (operator.as_str(), fields) {
            ("$set", Bson::Document(fields)) => fields,
            _ => {
                return Err(StoreError::InvalidOperation(format!(
                    "unsupported update operator {}",
                    operator
                )))
            }
        };

        for (field, value) in fields {
            if field == PRIMARY_KEY && document.get(PRIMARY_KEY) != Some(value) {
                return Err(StoreError::InvalidOperation(
                    "_id is immutable".to_string(),
                ));
            }
            updated.insert(field.clone(), value.clone());
        }
    }

    Ok(updated)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ensure_connected(&self) -> Result<()> {
        if self.unreachable.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::Connection(
                "memory store marked unreachable".into(),
            ));
        }
        Ok(())
    }

    async fn find(
        &self,
        collection: &str,
        filter: Document,
        sort: Option<Document>,
    ) -> Result<Vec<Document>> {
        let collections = self.collections.lock().await;

        let mut results: Vec<Document> = collections
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|document| matches(&filter, document))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(sort) = sort {
            sort_documents(&mut results, &sort)?;
        }

        Ok(results)
    }

    async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>> {
        let collections = self.collections.lock().await;

        Ok(collections.get(collection).and_then(|documents| {
            documents
                .iter()
                .find(|document| matches(&filter, document))
                .cloned()
        }))
    }

    async fn insert_one(&self, collection: &str, document: Document) -> Result<InsertOutcome> {
        let mut collections = self.collections.lock().await;
        let documents = collections.entry(collection.to_string()).or_default();

        let inserted_id = document
            .get(PRIMARY_KEY)
            .cloned()
            .unwrap_or_else(|| Bson::ObjectId(ObjectId::new()));

        if documents
            .iter()
            .any(|existing| existing.get(PRIMARY_KEY) == Some(&inserted_id))
        {
            return Err(StoreError::DuplicateKey(collection.to_string()));
        }

        let mut stored = Document::new();
        stored.insert(PRIMARY_KEY, inserted_id.clone());
        stored.extend(document);

        if self.violates_unique(collection, documents, &stored, None) {
            return Err(StoreError::DuplicateKey(collection.to_string()));
        }

        documents.push(stored);

        Ok(InsertOutcome {
            acknowledged: true,
            inserted_id,
        })
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> Result<UpdateOutcome> {
        let mut collections = self.collections.lock().await;
        let documents = collections.entry(collection.to_string()).or_default();

        let Some(index) = documents
            .iter()
            .position(|document| matches(&filter, document))
        else {
            return Ok(UpdateOutcome {
                acknowledged: true,
                matched_count: 0,
                modified_count: 0,
                upserted_id: Bson::Null,
                upserted_count: 0,
            });
        };

        let updated = apply_update(&documents[index], &update)?;
        if self.violates_unique(collection, documents, &updated, Some(index)) {
            return Err(StoreError::DuplicateKey(collection.to_string()));
        }

        let modified = updated != documents[index];
        documents[index] = updated;

        Ok(UpdateOutcome {
            acknowledged: true,
            matched_count: 1,
            modified_count: u64::from(modified),
            upserted_id: Bson::Null,
            upserted_count: 0,
        })
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> Result<DeleteOutcome> {
        let mut collections = self.collections.lock().await;

        let deleted = match collections.get_mut(collection) {
            Some(documents) => match documents
                .iter()
                .position(|document| matches(&filter, document))
            {
                Some(index) => {
                    documents.remove(index);
                    1
                }
                None => 0,
            },
            None => 0,
        };

        Ok(DeleteOutcome {
            acknowledged: true,
            deleted_count: deleted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[tokio::test]
    async fn insert_assigns_object_id_first() {
        let store = MemoryStore::new();

        let outcome = store
            .insert_one("matches", doc! { "teamA": "Lions" })
            .await
            .unwrap();

        let stored = store.documents("matches").await;
        assert!(matches!(outcome.inserted_id, Bson::ObjectId(_)));
        assert_eq!(stored[0].keys().next().map(String::as_str), Some("_id"));
        assert_eq!(stored[0].get("_id"), Some(&outcome.inserted_id));
    }

    #[tokio::test]
    async fn unique_index_rejects_second_insert() {
        let store = MemoryStore::new().with_unique_index("players", "email");

        store
            .insert_one("players", doc! { "email": "a@x.com" })
            .await
            .unwrap();
        let second = store
            .insert_one("players", doc! { "email": "a@x.com" })
            .await;

        assert!(matches!(second, Err(StoreError::DuplicateKey(_))));
        assert_eq!(store.documents("players").await.len(), 1);
    }

    #[tokio::test]
    async fn unique_index_ignores_missing_and_null_values() {
        let store = MemoryStore::new().with_unique_index("players", "email");

        store
            .insert_one("players", doc! { "name": "Amy", "email": null })
            .await
            .unwrap();
        store
            .insert_one("players", doc! { "name": "Zed", "email": null })
            .await
            .unwrap();
        store.insert_one("players", doc! { "name": "Bo" }).await.unwrap();
        store.insert_one("players", doc! { "name": "Cy" }).await.unwrap();

        assert_eq!(store.documents("players").await.len(), 4);
    }

    #[tokio::test]
    async fn unreachable_store_reports_a_connection_error() {
        let store = MemoryStore::new();
        store.set_unreachable(true);

        assert!(matches!(
            store.ensure_connected().await,
            Err(StoreError::Connection(_))
        ));

        store.set_unreachable(false);
        assert!(store.ensure_connected().await.is_ok());
    }

    #[tokio::test]
    async fn sort_uses_bson_type_order() {
        let store = MemoryStore::new();
        let oid = ObjectId::new();

        store
            .insert_one("matches", doc! { "_id": "1718291929123" })
            .await
            .unwrap();
        store.insert_one("matches", doc! { "_id": oid }).await.unwrap();
        store.insert_one("matches", doc! { "_id": 7 }).await.unwrap();

        let sorted = store
            .find("matches", Document::new(), Some(doc! { "_id": -1 }))
            .await
            .unwrap();
        let ids: Vec<_> = sorted.iter().map(|d| d.get("_id").cloned()).collect();

        assert_eq!(
            ids,
            vec![
                Some(Bson::ObjectId(oid)),
                Some(Bson::String("1718291929123".into())),
                Some(Bson::Int32(7)),
            ]
        );
    }

    #[tokio::test]
    async fn set_merges_and_reports_counts() {
        let store = MemoryStore::new();
        store
            .insert_one("matches", doc! { "_id": "m1", "teamA": "Lions", "score": 1 })
            .await
            .unwrap();

        let changed = store
            .update_one("matches", doc! { "_id": "m1" }, doc! { "$set": { "score": 2 } })
            .await
            .unwrap();
        let unchanged = store
            .update_one("matches", doc! { "_id": "m1" }, doc! { "$set": { "score": 2 } })
            .await
            .unwrap();

        assert_eq!((changed.matched_count, changed.modified_count), (1, 1));
        assert_eq!((unchanged.matched_count, unchanged.modified_count), (1, 0));
        assert_eq!(
            store.documents("matches").await[0],
            doc! { "_id": "m1", "teamA": "Lions", "score": 2 }
        );
    }

    #[tokio::test]
    async fn unknown_update_operator_is_rejected() {
        let store = MemoryStore::new();
        store.insert_one("matches", doc! { "_id": "m1" }).await.unwrap();

        let result = store
            .update_one("matches", doc! { "_id": "m1" }, doc! { "$inc": { "score": 1 } })
            .await;

        assert!(matches!(result, Err(StoreError::InvalidOperation(_))));
    }
}
