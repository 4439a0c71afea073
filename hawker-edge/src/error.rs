//! Gateway error type with HTTP status mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hawker_protocol::ProtocolError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    /// Pricing upstream failed while collecting quotes.
    #[error("Failed to get quotes")]
    QuoteUpstream(#[source] ProtocolError),

    /// Checkout upstream failed.
    #[error("Checkout failed")]
    CheckoutUpstream(#[source] ProtocolError),

    #[error("{0}")]
    Internal(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::QuoteUpstream(_)
            | GatewayError::CheckoutUpstream(_)
            | GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        GatewayError::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        GatewayError::NotFound(msg.into())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            // Clients key their backoff off this exact shape.
            GatewayError::RateLimited => json!({
                "error": "Rate limit exceeded",
                "retry_after_seconds": 1,
            }),
            GatewayError::QuoteUpstream(e) => json!({
                "error": "Failed to get quotes",
                "message": e.to_string(),
            }),
            GatewayError::CheckoutUpstream(e) => json!({
                "error": "Checkout failed",
                "message": e.to_string(),
            }),
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

/// Result alias for gateway handlers.
pub type Result<T> = std::result::Result<T, GatewayError>;
