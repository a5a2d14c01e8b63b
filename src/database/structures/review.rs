use crate::database::structures::CollectionName;
use mongodb::bson::Document;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(transparent)]
pub struct Review(pub(crate) Document);

impl CollectionName for Review {
    fn collection_name() -> &'static str {
        "reviews-food"
    }
}
