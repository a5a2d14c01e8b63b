use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Document};

/// Primary key field of every collection
pub const PRIMARY_KEY: &str = "_id";

/// A record identifier taken from a request path.
///
/// Records created without a client supplied `_id` carry an `ObjectId`,
/// others were stored under an arbitrary string (a client side timestamp
/// token, or for players their email). Both have to be addressable from
/// the same route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordId {
    Structured(ObjectId),
    Opaque(String),
}

impl RecordId {
    /// Only the canonical 24 character hex form counts as an `ObjectId`
    pub fn parse(raw: &str) -> Self {
        match ObjectId::parse_str(raw) {
            Ok(oid) => RecordId::Structured(oid),
            Err(_) => RecordId::Opaque(raw.to_string()),
        }
    }

    /// Builds the lookup filter. Structured ids always match on `_id`,
    /// opaque keys match on `fallback_field`.
    pub fn filter(&self, fallback_field: &str) -> Document {
        match self {
            RecordId::Structured(oid) => doc! { PRIMARY_KEY: *oid },
            RecordId::Opaque(key) => doc! { fallback_field: key.as_str() },
        }
    }
}

pub fn resolve_filter(raw: &str, fallback_field: &str) -> Document {
    RecordId::parse(raw).filter(fallback_field)
}
