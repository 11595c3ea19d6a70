//! # Querygate Store
//!
//! Backend-agnostic access to the single collection the gateway serves.
//! Filters are MongoDB query documents expressed as `serde_json::Value`, so
//! the translation layer never depends on a driver type.
//!
//! Backends:
//!
//! - [`MongoStore`]: the official async MongoDB driver (feature `backend-mongo`, on by default).
//! - [`InMemoryStore`]: a `RwLock<Vec<Value>>` that evaluates the common query
//!   operators in process. Used by tests and for local development.
//!
//! ```
//! use serde_json::json;
//! use store::{DocumentStore, InMemoryStore};
//!
//! # tokio_test_block_on(async {
//! let store = InMemoryStore::with_documents(vec![
//!     json!({ "_id": 1, "title": "Red Shoes" }),
//!     json!({ "_id": 2, "title": "Blue Hat" }),
//! ]);
//! let hits = store
//!     .find(&json!({ "title": { "$regex": "red", "$options": "i" } }))
//!     .await
//!     .unwrap();
//! assert_eq!(hits.len(), 1);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

mod config;
mod error;
mod memory;
#[cfg(feature = "backend-mongo")]
mod mongo;
mod query;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub use config::{StoreBackend, StoreConfig};
pub use error::StoreError;
pub use memory::InMemoryStore;
#[cfg(feature = "backend-mongo")]
pub use mongo::MongoStore;

/// A handle to one collection. Implementations must be safe to share across
/// concurrent requests.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents matching `filter`, in natural order.
    async fn find(&self, filter: &Value) -> Result<Vec<Value>, StoreError>;
    /// Insert one document and return its `_id`.
    async fn insert_one(&self, doc: Value) -> Result<Value, StoreError>;
    /// Insert documents and return how many were written.
    async fn insert_many(&self, docs: Vec<Value>) -> Result<usize, StoreError>;
    /// Delete the first match, or every match when `many` is set.
    async fn delete(&self, filter: &Value, many: bool) -> Result<u64, StoreError>;
    /// Release connections. Called once on process shutdown.
    async fn shutdown(&self) {}
    /// Short backend label used in logs.
    fn name(&self) -> &str;
}

/// Build the backend selected by `cfg.backend`.
pub async fn build_store(cfg: &StoreConfig) -> Result<Arc<dyn DocumentStore>, StoreError> {
    match cfg.backend {
        StoreBackend::Memory => Ok(Arc::new(InMemoryStore::new())),
        StoreBackend::Mongodb => {
            #[cfg(feature = "backend-mongo")]
            {
                Ok(Arc::new(MongoStore::connect(cfg).await?))
            }
            #[cfg(not(feature = "backend-mongo"))]
            {
                Err(StoreError::InvalidConfig(
                    "mongodb backend disabled at compile time".into(),
                ))
            }
        }
    }
}
