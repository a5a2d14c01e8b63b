/// Maps a record type to the collection it lives in
pub trait CollectionName {
    fn collection_name() -> &'static str;
}
