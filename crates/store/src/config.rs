use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Storage backend selector.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// MongoDB through the official async driver.
    #[default]
    Mongodb,
    /// Process-local documents. Useful for tests and local development.
    Memory,
}

/// Connection settings for the document store.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// MongoDB connection string (`mongodb://` or `mongodb+srv://`).
    pub connection_string: Option<String>,
    pub database: String,
    pub collection: String,
    /// Upper bound for a single store call, in seconds. Also sent to the
    /// server as `maxTimeMS` on finds.
    pub query_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Mongodb,
            connection_string: None,
            database: "querygate".into(),
            collection: "items".into(),
            query_timeout_secs: 10,
        }
    }
}

impl StoreConfig {
    /// In-memory configuration for tests.
    pub fn in_memory() -> Self {
        Self {
            backend: StoreBackend::Memory,
            ..Self::default()
        }
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    /// Connection string with any password replaced by `***`.
    pub fn redacted_connection_string(&self) -> Option<String> {
        self.connection_string.as_deref().map(redact_credentials)
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("backend", &self.backend)
            .field("connection_string", &self.redacted_connection_string())
            .field("database", &self.database)
            .field("collection", &self.collection)
            .field("query_timeout_secs", &self.query_timeout_secs)
            .finish()
    }
}

fn redact_credentials(uri: &str) -> String {
    let Some(scheme_end) = uri.find("://") else {
        return uri.to_string();
    };
    let rest = &uri[scheme_end + 3..];
    let authority_end = rest.find('/').unwrap_or(rest.len());
    let Some(at) = rest[..authority_end].rfind('@') else {
        return uri.to_string();
    };
    let userinfo = &rest[..at];
    let user = userinfo.split(':').next().unwrap_or_default();
    format!("{}{}:***{}", &uri[..scheme_end + 3], user, &rest[at..])
}
