//! Server initialization and routing
//!
//! This module handles the Axum server setup including:
//! - Router configuration with all search endpoints
//! - Middleware stack (request id, logging, CORS, timeout)
//! - Graceful shutdown handling, followed by store shutdown

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::middleware::{log_requests, request_id};
use crate::routes::{health, not_found, search};
use crate::state::ServerState;
use axum::error_handling::HandleErrorLayer;
use axum::extract::DefaultBodyLimit;
use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::{BoxError, Router};
use regex::Regex;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::timeout::error::Elapsed;
use tower::timeout::TimeoutLayer;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// CORS policy: origins matching `cors_origin_pattern` are allowed, others
/// get no `Access-Control-Allow-Origin` header and the browser refuses them.
fn cors_layer(config: &ServerConfig) -> ServerResult<CorsLayer> {
    if !config.enable_cors {
        return Ok(CorsLayer::new());
    }

    let allowed = Regex::new(&config.cors_origin_pattern).map_err(|e| {
        ServerError::Config(format!(
            "invalid cors_origin_pattern `{}`: {e}",
            config.cors_origin_pattern
        ))
    })?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &Parts| {
                origin.to_str().is_ok_and(|origin| allowed.is_match(origin))
            },
        ))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]))
}

async fn handle_timeout(err: BoxError) -> ServerError {
    if err.is::<Elapsed>() {
        ServerError::Timeout
    } else {
        ServerError::Internal(err.to_string())
    }
}

async fn method_not_allowed() -> ServerError {
    ServerError::Rejected {
        status: StatusCode::METHOD_NOT_ALLOWED,
        message: "Method not allowed".to_string(),
    }
}

/// Build the Axum router with all routes and middleware
///
/// Middleware stack (outermost first):
/// 1. HTTP tracing
/// 2. Request ID tracking
/// 3. Request logging
/// 4. CORS
/// 5. Timeout handling (answers with the error envelope)
/// 6. Body size limit
pub fn build_router(state: Arc<ServerState>) -> ServerResult<Router> {
    let cors = cors_layer(&state.config)?;
    let timeout = state.config.timeout();
    let body_limit = state.config.max_body_size();

    Ok(Router::new()
        .route("/test", get(search::test))
        .route("/postTest", post(search::post_test))
        .route("/get", get(search::get).post(search::post_get))
        .route("/getRegex", get(search::get_regex))
        .route("/getAiAssist", get(search::get_ai_assist))
        .route(
            "/getAiAssistTitleAndDescription",
            get(search::get_ai_assist_title_and_description),
        )
        .route("/getAll", get(search::get_all))
        .route("/health", get(health::health_check))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout))
                .layer(TimeoutLayer::new(timeout)),
        )
        .layer(cors)
        .layer(from_fn(log_requests))
        .layer(from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Start the querygate HTTP server
///
/// Connects the store, builds the inference client, and serves until
/// SIGTERM or Ctrl+C. In-flight requests drain before the store's
/// connections are released.
///
/// # Example
///
/// ```rust,no_run
/// use server::ServerConfig;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = ServerConfig::load()?;
///     server::start_server(config).await?;
///     Ok(())
/// }
/// ```
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .json()
        .init();

    let addr: SocketAddr = config.socket_addr()?;

    if config.translate.passthrough_operators.is_none() {
        tracing::warn!(
            "POST /get accepts any query operator; set translate.passthrough_operators to restrict it"
        );
    }

    let state = Arc::new(ServerState::new(config.clone()).await?);
    let app = build_router(state.clone())?;

    tracing::info!(
        store = state.gateway.store().name(),
        database = %config.store.database,
        collection = %config.store.collection,
        "Starting querygate server on {}",
        addr
    );
    tracing::info!(
        "Timeout: {}s, Max body: {}MB",
        config.timeout_secs,
        config.max_body_size_mb
    );
    tracing::info!(
        "CORS: {}, origin pattern: {}",
        config.enable_cors,
        config.cors_origin_pattern
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.shutdown().await;
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
