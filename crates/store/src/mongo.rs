use async_trait::async_trait;
use bson::{doc, Bson, Document};
use futures::TryStreamExt;
use mongodb::error::{Error as MongoError, ErrorKind};
use mongodb::options::{ClientOptions, FindOptions};
use mongodb::{Client, Collection};
use serde_json::Value;
use std::time::Duration;

use crate::{DocumentStore, StoreConfig, StoreError};

/// Server error codes that mean "your filter is wrong" rather than "the
/// server is unwell": BadValue, FailedToParse, TypeMismatch, an invalid
/// `$regex` pattern and an invalid `$options` flag.
const REJECTED_CODES: [i32; 5] = [2, 9, 14, 51091, 51108];
/// MaxTimeMSExpired.
const MAX_TIME_EXPIRED: i32 = 50;

/// MongoDB backend. The driver's `Client` owns a connection pool and is
/// cheap to share across concurrent requests.
pub struct MongoStore {
    client: Client,
    collection: Collection<Document>,
    database: String,
    query_timeout: Duration,
}

impl MongoStore {
    /// Parse the connection string, build the client and verify the
    /// deployment answers a `ping`.
    pub async fn connect(cfg: &StoreConfig) -> Result<Self, StoreError> {
        let uri = cfg
            .connection_string
            .as_deref()
            .filter(|uri| !uri.trim().is_empty())
            .ok_or_else(|| {
                StoreError::InvalidConfig(
                    "connection_string is required for the mongodb backend".into(),
                )
            })?;

        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|e| StoreError::InvalidConfig(e.to_string()))?;
        options.app_name.get_or_insert_with(|| "querygate".into());
        let client =
            Client::with_options(options).map_err(|e| StoreError::Connection(e.to_string()))?;

        let store = Self {
            collection: client
                .database(&cfg.database)
                .collection::<Document>(&cfg.collection),
            client,
            database: cfg.database.clone(),
            query_timeout: cfg.query_timeout(),
        };
        store.ping().await?;

        tracing::info!(
            database = %cfg.database,
            collection = %cfg.collection,
            "connected to mongodb"
        );
        Ok(store)
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        self.client
            .database(&self.database)
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map(|_| ())
            .map_err(|e| StoreError::Connection(e.to_string()))
    }

    fn classify(&self, err: MongoError) -> StoreError {
        classify(err, self.query_timeout)
    }
}

fn classify(err: MongoError, query_timeout: Duration) -> StoreError {
    match err.kind.as_ref() {
        ErrorKind::Command(cmd) if cmd.code == MAX_TIME_EXPIRED => StoreError::Timeout(query_timeout),
        ErrorKind::Command(cmd) if REJECTED_CODES.contains(&cmd.code) => {
            StoreError::Rejected(cmd.message.clone())
        }
        ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) => {
            StoreError::Connection(err.to_string())
        }
        _ => StoreError::Backend(err.to_string()),
    }
}

/// Convert a JSON object (extended JSON allowed, e.g. `{"$oid": ...}`) into a
/// BSON document.
pub(crate) fn to_document(value: &Value) -> Result<Document, StoreError> {
    match Bson::try_from(value.clone()) {
        Ok(Bson::Document(doc)) => Ok(doc),
        Ok(_) => Err(StoreError::InvalidDocument("expected a JSON object".into())),
        Err(e) => Err(StoreError::InvalidDocument(e.to_string())),
    }
}

/// Relaxed extended JSON, with an `ObjectId` `_id` flattened to its hex string.
pub(crate) fn to_json(mut doc: Document) -> Value {
    if let Ok(oid) = doc.get_object_id("_id") {
        doc.insert("_id", oid.to_hex());
    }
    Bson::Document(doc).into_relaxed_extjson()
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn find(&self, filter: &Value) -> Result<Vec<Value>, StoreError> {
        let filter = to_document(filter)?;
        let options = FindOptions::builder().max_time(self.query_timeout).build();
        let cursor = self
            .collection
            .find(filter, options)
            .await
            .map_err(|e| self.classify(e))?;
        let docs: Vec<Document> = cursor.try_collect().await.map_err(|e| self.classify(e))?;
        Ok(docs.into_iter().map(to_json).collect())
    }

    async fn insert_one(&self, doc: Value) -> Result<Value, StoreError> {
        let doc = to_document(&doc)?;
        let result = self
            .collection
            .insert_one(doc, None)
            .await
            .map_err(|e| self.classify(e))?;
        Ok(match result.inserted_id {
            Bson::ObjectId(oid) => Value::String(oid.to_hex()),
            other => other.into_relaxed_extjson(),
        })
    }

    async fn insert_many(&self, docs: Vec<Value>) -> Result<usize, StoreError> {
        if docs.is_empty() {
            return Ok(0);
        }
        let docs = docs
            .iter()
            .map(to_document)
            .collect::<Result<Vec<_>, _>>()?;
        let result = self
            .collection
            .insert_many(docs, None)
            .await
            .map_err(|e| self.classify(e))?;
        Ok(result.inserted_ids.len())
    }

    async fn delete(&self, filter: &Value, many: bool) -> Result<u64, StoreError> {
        let filter = to_document(filter)?;
        let result = if many {
            self.collection.delete_many(filter, None).await
        } else {
            self.collection.delete_one(filter, None).await
        }
        .map_err(|e| self.classify(e))?;
        Ok(result.deleted_count)
    }

    async fn shutdown(&self) {
        self.client.clone().shutdown().await;
        tracing::info!("mongodb client shut down");
    }

    fn name(&self) -> &str {
        "mongodb"
    }
}
