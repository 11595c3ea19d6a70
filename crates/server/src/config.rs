use inference::InferenceConfig;
use querygate::GatewayConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use store::StoreConfig;
use translate::TranslateConfig;

/// Environment variables read by earlier deployments, mapped onto config keys.
/// They only seed defaults; a config file or `QUERYGATE__*` variable wins.
const LEGACY_ENV: &[(&str, &str)] = &[
    ("SERVER_LISTEN_PORT", "port"),
    ("CONNECTION_STRING", "store.connection_string"),
    ("DATABASE_NAME", "store.database"),
    ("COLLECTION_NAME", "store.collection"),
    ("OPEN_API_KEY", "inference.api_key"),
];

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum request body size in MB
    #[serde(default = "default_max_body_size_mb")]
    pub max_body_size_mb: usize,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Origins matching this pattern get CORS headers; requests without an
    /// `Origin` header are always served.
    #[serde(default = "default_cors_origin_pattern")]
    pub cors_origin_pattern: String,

    /// Log level (an `EnvFilter` directive)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub inference: InferenceConfig,

    #[serde(default)]
    pub translate: TranslateConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            max_body_size_mb: default_max_body_size_mb(),
            enable_cors: default_true(),
            cors_origin_pattern: default_cors_origin_pattern(),
            log_level: default_log_level(),
            store: StoreConfig::default(),
            inference: InferenceConfig::default(),
            translate: TranslateConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables and config files
    pub fn load() -> anyhow::Result<Self> {
        Self::load_with(|name| std::env::var(name).ok())
    }

    /// Same as [`ServerConfig::load`], with legacy variables resolved through `lookup`.
    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder();
        for (var, key) in LEGACY_ENV {
            if let Some(value) = lookup(var).filter(|v| !v.trim().is_empty()) {
                builder = builder.set_default(*key, value)?;
            }
        }

        let builder = builder
            // Load from file if exists
            .add_source(config::File::with_name("querygate").required(false))
            // Override with environment variables
            .add_source(config::Environment::with_prefix("QUERYGATE").separator("__"));

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get max body size in bytes
    pub fn max_body_size(&self) -> usize {
        self.max_body_size_mb * 1024 * 1024
    }

    /// Deadlines and translation policy handed to the gateway.
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            translate: self.translate.clone(),
            store_timeout: self.store.query_timeout(),
            inference_timeout: self.inference.timeout(),
        }
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_body_size_mb() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_cors_origin_pattern() -> String {
    r"^http://localhost:\d+$".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::StoreBackend;

    #[test]
    fn test_default_config() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.timeout_secs, 30);
        assert_eq!(cfg.max_body_size(), 10 * 1024 * 1024);
        assert!(cfg.enable_cors);
        assert_eq!(cfg.store.backend, StoreBackend::Mongodb);
        assert_eq!(cfg.translate.max_pattern_len, 256);
    }

    #[test]
    fn test_socket_addr() {
        let cfg = ServerConfig::default();
        let addr = cfg.socket_addr().unwrap();
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn legacy_variables_seed_defaults() {
        let cfg = ServerConfig::load_with(|name| match name {
            "SERVER_LISTEN_PORT" => Some("3000".into()),
            "CONNECTION_STRING" => Some("mongodb://localhost:27017".into()),
            "DATABASE_NAME" => Some("shop".into()),
            "COLLECTION_NAME" => Some("auctions".into()),
            "OPEN_API_KEY" => Some("sk-test".into()),
            _ => None,
        })
        .unwrap();

        assert_eq!(cfg.port, 3000);
        assert_eq!(
            cfg.store.connection_string.as_deref(),
            Some("mongodb://localhost:27017")
        );
        assert_eq!(cfg.store.database, "shop");
        assert_eq!(cfg.store.collection, "auctions");
        assert_eq!(cfg.inference.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn blank_legacy_variables_are_ignored() {
        let cfg = ServerConfig::load_with(|name| match name {
            "DATABASE_NAME" => Some("  ".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(cfg.store.database, "querygate");
    }

    #[test]
    fn gateway_config_carries_timeouts() {
        let mut cfg = ServerConfig::default();
        cfg.store.query_timeout_secs = 3;
        cfg.inference.timeout_secs = 7;
        let gateway = cfg.gateway_config();
        assert_eq!(gateway.store_timeout, Duration::from_secs(3));
        assert_eq!(gateway.inference_timeout, Duration::from_secs(7));
    }
}
