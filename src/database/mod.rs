mod database;
pub mod identifier;
pub mod json;
#[cfg(test)]
pub mod memory;
pub mod store;
pub mod structures;

pub use database::Database;
pub use store::{DocumentStore, StoreError};
