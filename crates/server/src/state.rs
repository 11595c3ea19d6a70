use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use inference::{build_inference, DisabledInference, TextInference};
use querygate::Gateway;
use std::sync::Arc;
use std::time::Instant;
use store::{build_store, DocumentStore};

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Search operations (shared across requests)
    pub gateway: Arc<Gateway>,

    started: Instant,
}

impl ServerState {
    /// Connect the store and build the inference client described by `config`.
    ///
    /// A store that cannot be reached aborts startup. An inference client that
    /// cannot be built only disables the AI-assisted routes.
    pub async fn new(config: ServerConfig) -> ServerResult<Self> {
        let store = build_store(&config.store)
            .await
            .map_err(|e| ServerError::Config(format!("store: {e}")))?;

        let inference: Arc<dyn TextInference> = match build_inference(&config.inference) {
            Ok(client) => client,
            Err(err) => {
                tracing::warn!(error = %err, "inference client unavailable, AI-assisted search disabled");
                Arc::new(DisabledInference::new(err.to_string()))
            }
        };

        Ok(Self::with_components(config, store, inference))
    }

    /// Assemble state around already-built components.
    pub fn with_components(
        config: ServerConfig,
        store: Arc<dyn DocumentStore>,
        inference: Arc<dyn TextInference>,
    ) -> Self {
        let gateway = Gateway::new(store, inference, config.gateway_config());
        Self {
            config: Arc::new(config),
            gateway: Arc::new(gateway),
            started: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    /// Release the store's connections.
    pub async fn shutdown(&self) {
        self.gateway.store().shutdown().await;
    }
}
