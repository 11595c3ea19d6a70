use crate::envelope::Envelope;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use querygate::GatewayError;

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// An extractor refused the request; keeps the extractor's status code.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("Request timeout")]
    Timeout,

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found")]
    NotFound,
}

impl ServerError {
    /// Get HTTP status code for this error
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Gateway(err) if err.is_caller_error() => StatusCode::BAD_REQUEST,
            ServerError::Gateway(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Rejected { status, .. } => *status,
            ServerError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Internal(_) | ServerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    fn error_code(&self) -> &'static str {
        match self {
            ServerError::Gateway(GatewayError::InvalidRequest(_)) => "INVALID_REQUEST",
            ServerError::Gateway(GatewayError::InvalidValueFormat(_)) => "INVALID_VALUE_FORMAT",
            ServerError::Gateway(GatewayError::InvalidPattern(_)) => "INVALID_PATTERN",
            ServerError::Gateway(GatewayError::MalformedFilter(_)) => "MALFORMED_FILTER",
            ServerError::Gateway(GatewayError::InferenceUnavailable(_)) => "INFERENCE_UNAVAILABLE",
            ServerError::Gateway(GatewayError::StoreUnavailable(_)) => "STORE_UNAVAILABLE",
            ServerError::Rejected { .. } => "REJECTED",
            ServerError::Timeout => "REQUEST_TIMEOUT",
            ServerError::Internal(_) => "INTERNAL_ERROR",
            ServerError::Config(_) => "CONFIG_ERROR",
            ServerError::NotFound => "NOT_FOUND",
        }
    }

    /// Message returned to the caller. Server-side failures get a fixed text.
    fn public_message(&self) -> String {
        match self {
            ServerError::Gateway(err) => err.public_message(),
            ServerError::Internal(_) | ServerError::Config(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        } else {
            tracing::warn!(code = self.error_code(), error = %self, "request rejected");
        }

        (status, Envelope::<()>::error(self.public_message())).into_response()
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ServerError {
    fn from(rejection: QueryRejection) -> Self {
        ServerError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}
