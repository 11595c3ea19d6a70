//! API route handlers
//!
//! - `search`: the search endpoints and the two connectivity checks
//! - `health`: liveness

pub mod health;
pub mod search;

use crate::error::ServerError;

/// 404 Not Found handler
///
/// Returns the standard error envelope for undefined routes.
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
