use crate::database::identifier::PRIMARY_KEY;
use crate::database::structures::CollectionName;
use mongodb::bson::{doc, Bson, Document};
use serde::{Deserialize, Serialize};

/// A scoreboard match.
///
/// Matches have no fixed schema; the client owns every field. `_id` is
/// either assigned by the store or supplied by the client (usually a
/// timestamp token), so it is kept as raw BSON.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(from = "Document", into = "Document")]
pub struct Match {
    pub(crate) id: Option<Bson>,
    pub(crate) fields: Document,
}

impl Match {
    /// `$set` merge of the match fields. `_id` is immutable in the store,
    /// so it never takes part in an update.
    pub fn into_set_document(self) -> Document {
        doc! { "$set": self.fields }
    }
}

impl From<Document> for Match {
    fn from(mut document: Document) -> Self {
        let id = document.remove(PRIMARY_KEY);
        Self {
            id,
            fields: document,
        }
    }
}

impl From<Match> for Document {
    fn from(record: Match) -> Self {
        let mut document = Document::new();
        if let Some(id) = record.id {
            document.insert(PRIMARY_KEY, id);
        }
        document.extend(record.fields);
        document
    }
}

impl CollectionName for Match {
    fn collection_name() -> &'static str {
        "matches"
    }
}
