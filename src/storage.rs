//! Storage collaborator: a document store keyed by (partition, sort) identity.
//!
//! Items are JSON objects carrying their own identity in the [`PARTITION_KEY`]
//! and [`SORT_KEY`] attributes. The core needs three operations and no
//! transactional or conditional semantics: a prefix query within one
//! partition, a blind put, and an idempotent delete.
//!
//! [`MemoryStorage`] keeps each partition in a sorted map, so queries return
//! items in ascending sort-key order, the way a range query on a sorted
//! table would.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};

/// Attribute holding the partition key.
pub const PARTITION_KEY: &str = "PK";

/// Attribute holding the sort key.
pub const SORT_KEY: &str = "SK";

/// A stored item.
pub type Item = Map<String, Value>;

/// Errors raised by a [`Storage`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("item has no string `{0}` attribute")]
    MissingKey(&'static str),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Operations the dispatcher consumes from the store.
///
/// Implementations must be safe under concurrent calls from many requests.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    /// Items in `partition` whose sort key starts with `sort_prefix`, in
    /// ascending sort-key order.
    async fn query(&self, partition: &str, sort_prefix: &str) -> Result<Vec<Item>, StorageError>;

    /// Writes `item`, replacing any item with the same key.
    async fn put(&self, item: Item) -> Result<(), StorageError>;

    /// Removes the item with the given key. Removing nothing is not an error.
    async fn delete(&self, partition: &str, sort: &str) -> Result<(), StorageError>;
}

/// Reads the key attributes of `item`.
pub fn item_key(item: &Item) -> Result<(&str, &str), StorageError> {
    let partition = item.get(PARTITION_KEY)
        .and_then(Value::as_str)
        .ok_or(StorageError::MissingKey(PARTITION_KEY))?;
    let sort = item.get(SORT_KEY)
        .and_then(Value::as_str)
        .ok_or(StorageError::MissingKey(SORT_KEY))?;
    Ok((partition, sort))
}

/// In-process store for development and tests.
#[derive(Default)]
pub struct MemoryStorage {
    partitions: RwLock<HashMap<String, BTreeMap<String, Item>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of items across all partitions.
    pub fn len(&self) -> usize {
        self.partitions.read().values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn query(&self, partition: &str, sort_prefix: &str) -> Result<Vec<Item>, StorageError> {
        let partitions = self.partitions.read();
        let Some(items) = partitions.get(partition) else {
            return Ok(Vec::new());
        };
        Ok(items
            .range(sort_prefix.to_owned()..)
            .take_while(|(sort, _)| sort.starts_with(sort_prefix))
            .map(|(_, item)| item.clone())
            .collect())
    }

    async fn put(&self, item: Item) -> Result<(), StorageError> {
        let (partition, sort) = item_key(&item)?;
        let (partition, sort) = (partition.to_owned(), sort.to_owned());
        self.partitions.write().entry(partition).or_default().insert(sort, item);
        Ok(())
    }

    async fn delete(&self, partition: &str, sort: &str) -> Result<(), StorageError> {
        let mut partitions = self.partitions.write();
        if let Some(items) = partitions.get_mut(partition) {
            items.remove(sort);
            if items.is_empty() {
                partitions.remove(partition);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn item(value: Value) -> Item {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[tokio::test]
    async fn query_filters_by_prefix_in_sort_order() {
        let store = MemoryStorage::new();
        for sk in ["Comment#b", "Document", "Comment#a", "Tag#x"] {
            store.put(item(json!({ "PK": "doc-1", "SK": sk }))).await.unwrap();
        }
        store.put(item(json!({ "PK": "doc-2", "SK": "Comment#c" }))).await.unwrap();

        let found = store.query("doc-1", "Comment").await.unwrap();
        let keys: Vec<_> = found.iter().map(|i| i["SK"].as_str().unwrap()).collect();
        assert_eq!(keys, ["Comment#a", "Comment#b"]);
    }

    #[tokio::test]
    async fn unknown_partition_is_empty() {
        let store = MemoryStorage::new();
        assert!(store.query("missing", "Comment").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn put_overwrites_blindly() {
        let store = MemoryStorage::new();
        store.put(item(json!({ "PK": "d", "SK": "Comment#1", "text": "old" }))).await.unwrap();
        store.put(item(json!({ "PK": "d", "SK": "Comment#1", "text": "new" }))).await.unwrap();

        let found = store.query("d", "Comment").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["text"], "new");
    }

    #[tokio::test]
    async fn put_requires_string_keys() {
        let store = MemoryStorage::new();

        let err = store.put(item(json!({ "SK": "Comment#1" }))).await.unwrap_err();
        assert!(matches!(err, StorageError::MissingKey("PK")));

        let err = store.put(item(json!({ "PK": "d", "SK": 7 }))).await.unwrap_err();
        assert!(matches!(err, StorageError::MissingKey("SK")));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryStorage::new();
        store.put(item(json!({ "PK": "d", "SK": "Comment#1" }))).await.unwrap();

        store.delete("d", "Comment#1").await.unwrap();
        store.delete("d", "Comment#1").await.unwrap();
        store.delete("never", "Comment#1").await.unwrap();
        assert!(store.is_empty());
    }
}
