use crate::database::structures::CollectionName;
use chrono::{DateTime, Utc};
use mongodb::bson::{self, doc, Document};
use serde::{Deserialize, Serialize};

/// A stored player registration, served as stored
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(transparent)]
pub struct Player(pub(crate) Document);

impl CollectionName for Player {
    fn collection_name() -> &'static str {
        "players"
    }
}

/// The fixed player fields an edit overwrites.
///
/// Every field is written on update, so anything the client leaves out
/// ends up `null` in the stored document.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    pub(crate) name: Option<String>,
    pub(crate) email: Option<String>,
    pub(crate) phone: Option<String>,
    pub(crate) district: Option<String>,
    pub(crate) blood_group: Option<String>,
    pub(crate) facebook: Option<String>,
    pub(crate) photo: Option<String>,
    pub(crate) status: Option<String>,
}

impl PlayerProfile {
    pub fn into_set_document(self) -> Result<Document, bson::ser::Error> {
        Ok(doc! { "$set": bson::to_document(&self)? })
    }
}

/// A signup request: the submitted fields verbatim plus the server
/// assigned `createdAt`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPlayer {
    email: String,
    fields: Document,
    created_at: DateTime<Utc>,
}

impl NewPlayer {
    /// Returns `None` when `name` or `email` is missing, blank or not a string
    pub fn new(mut fields: Document, created_at: DateTime<Utc>) -> Option<Self> {
        required(&fields, "name")?;
        let email = required(&fields, "email")?.to_string();

        // Clients don't get to backdate their registration
        fields.remove("createdAt");

        Some(Self {
            email,
            fields,
            created_at,
        })
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn into_document(self) -> Document {
        let mut document = self.fields;
        document.insert("createdAt", bson::DateTime::from_chrono(self.created_at));
        document
    }
}

fn required<'a>(fields: &'a Document, key: &str) -> Option<&'a str> {
    fields
        .get_str(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
}
