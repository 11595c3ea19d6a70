use async_trait::async_trait;
use bson::oid::ObjectId;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::query::matches;
use crate::{DocumentStore, StoreError};

/// An in-memory backend using a `RwLock` around a `Vec` of JSON documents.
///
/// Documents keep insertion order, like a natural-order scan of a collection.
#[derive(Default)]
pub struct InMemoryStore {
    documents: RwLock<Vec<Value>>,
    finds: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with `documents` as-is (no `_id` is generated).
    pub fn with_documents(documents: Vec<Value>) -> Self {
        Self {
            documents: RwLock::new(documents),
            finds: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.read().map(|docs| docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `find` calls served so far.
    pub fn find_calls(&self) -> usize {
        self.finds.load(Ordering::Relaxed)
    }
}

fn with_generated_id(doc: Value) -> Result<Value, StoreError> {
    let Value::Object(mut map) = doc else {
        return Err(StoreError::InvalidDocument(
            "document must be a JSON object".into(),
        ));
    };
    if !map.contains_key("_id") {
        map.insert("_id".into(), Value::String(ObjectId::new().to_hex()));
    }
    Ok(Value::Object(map))
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn find(&self, filter: &Value) -> Result<Vec<Value>, StoreError> {
        self.finds.fetch_add(1, Ordering::Relaxed);
        // The read lock is held for the duration of the scan.
        let guard = self
            .documents
            .read()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        let mut hits = Vec::new();
        for doc in guard.iter() {
            if matches(doc, filter)? {
                hits.push(doc.clone());
            }
        }
        Ok(hits)
    }

    async fn insert_one(&self, doc: Value) -> Result<Value, StoreError> {
        let doc = with_generated_id(doc)?;
        let id = doc["_id"].clone();
        self.documents
            .write()
            .map_err(|_| StoreError::backend("poisoned lock"))?
            .push(doc);
        Ok(id)
    }

    async fn insert_many(&self, docs: Vec<Value>) -> Result<usize, StoreError> {
        // Validate everything before taking the lock so a bad entry inserts nothing.
        let docs = docs
            .into_iter()
            .map(with_generated_id)
            .collect::<Result<Vec<_>, _>>()?;
        let count = docs.len();
        self.documents
            .write()
            .map_err(|_| StoreError::backend("poisoned lock"))?
            .extend(docs);
        Ok(count)
    }

    async fn delete(&self, filter: &Value, many: bool) -> Result<u64, StoreError> {
        let mut guard = self
            .documents
            .write()
            .map_err(|_| StoreError::backend("poisoned lock"))?;

        let mut doomed = Vec::new();
        for (idx, doc) in guard.iter().enumerate() {
            if matches(doc, filter)? {
                doomed.push(idx);
                if !many {
                    break;
                }
            }
        }
        for idx in doomed.iter().rev() {
            guard.remove(*idx);
        }
        Ok(doomed.len() as u64)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seeded() -> InMemoryStore {
        InMemoryStore::with_documents(vec![
            json!({ "_id": 1, "title": "Red Shoes", "start_price": 100 }),
            json!({ "_id": 2, "title": "Blue Hat", "start_price": 20 }),
            json!({ "_id": 3, "title": "Red Scarf", "start_price": 20 }),
        ])
    }

    #[tokio::test]
    async fn find_returns_matches_in_insertion_order() {
        let store = seeded();
        let hits = store
            .find(&json!({ "title": { "$regex": "^red", "$options": "i" } }))
            .await
            .unwrap();
        let ids: Vec<_> = hits.iter().map(|d| d["_id"].clone()).collect();
        assert_eq!(ids, vec![json!(1), json!(3)]);
        assert_eq!(store.find_calls(), 1);
    }

    #[tokio::test]
    async fn find_on_empty_store_is_empty() {
        let store = InMemoryStore::new();
        assert!(store.find(&json!({})).await.unwrap().is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn insert_generates_object_id() {
        let store = InMemoryStore::new();
        let id = store.insert_one(json!({ "title": "Lamp" })).await.unwrap();
        let id = id.as_str().unwrap().to_string();
        assert_eq!(id.len(), 24);

        let hits = store.find(&json!({ "_id": id })).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0]["title"], "Lamp");
    }

    #[tokio::test]
    async fn insert_many_is_all_or_nothing() {
        let store = InMemoryStore::new();
        let err = store
            .insert_many(vec![json!({ "title": "ok" }), json!("not a document")])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidDocument(_)));
        assert!(store.is_empty());

        let inserted = store
            .insert_many(vec![json!({ "title": "a" }), json!({ "title": "b" })])
            .await
            .unwrap();
        assert_eq!(inserted, 2);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn delete_one_versus_many() {
        let store = seeded();
        assert_eq!(store.delete(&json!({ "start_price": 20 }), false).await.unwrap(), 1);
        assert_eq!(store.len(), 2);

        let store = seeded();
        assert_eq!(store.delete(&json!({ "start_price": 20 }), true).await.unwrap(), 2);
        assert_eq!(store.len(), 1);

        assert_eq!(store.delete(&json!({ "title": "nope" }), true).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn find_surfaces_rejected_filters() {
        let store = seeded();
        let err = store.find(&json!({ "$where": "1" })).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
    }
}
