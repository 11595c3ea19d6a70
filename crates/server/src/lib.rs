//! querygate server - HTTP REST API over a MongoDB collection
//!
//! Exposes the [`querygate::Gateway`] search operations as JSON endpoints.
//! Every response, including errors and unknown routes, uses the envelope
//! `{"status": "success", "data": ...}` / `{"status": "error", "message": ...}`.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /test` - Connectivity check
//! - `POST /postTest` - Echo the JSON body
//! - `GET /get?key=&value=` - Exact numeric match (400 on a non-numeric value)
//! - `GET /getRegex?key=&value=` - Case-insensitive regex match (400 on a bad pattern)
//! - `GET /getAiAssist?key=&value=` - AI-derived regex on one field
//! - `GET /getAiAssistTitleAndDescription?value=` - AI-derived regex over title and description
//! - `POST /get` - Body is the filter
//! - `GET /getAll` - Every document
//! - `GET /health` - Liveness probe
//!
//! Inference and store failures answer 500 with a fixed message; the detail
//! is only logged.

pub mod config;
pub mod envelope;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use envelope::Envelope;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
