use crate::database::structures::CollectionName;
use mongodb::bson::Document;
use serde::{Deserialize, Serialize};

/// Menu entries are maintained outside this service and served as stored
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(transparent)]
pub struct MenuItem(pub(crate) Document);

impl CollectionName for MenuItem {
    fn collection_name() -> &'static str {
        "menu-food"
    }
}
