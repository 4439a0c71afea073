//! Route handlers and router assembly.

mod checkout;
mod quote;
mod search;

use crate::error::GatewayError;
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Build the gateway router. Layer order, outermost first: tracing,
/// request-id, rate limit.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/search", get(search::search))
        .route("/api/quote", get(quote::quote))
        .route("/api/checkout", post(checkout::start))
        .route("/api/checkout/:checkout_id/stream", get(checkout::status_stream))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .layer(middleware::from_fn(crate::request_id::propagate_request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    if state.limiter.try_acquire() {
        Ok(next.run(request).await)
    } else {
        tracing::warn!(path = %request.uri().path(), "rate limit exceeded");
        Err(GatewayError::RateLimited)
    }
}
