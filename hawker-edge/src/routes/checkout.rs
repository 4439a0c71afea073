//! `POST /api/checkout` and `GET /api/checkout/:id/stream`.

use crate::dto::{CheckoutBody, CheckoutStartedDto, StatusDto};
use crate::error::GatewayError;
use crate::request_id::RequestId;
use crate::state::AppState;
use axum::extract::{Extension, Path, State};
use axum::http::HeaderMap;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::stream::{self, Stream};
use hawker_protocol::StatusStream;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Start a checkout. The engine answers immediately with PENDING; progress
/// arrives on the status stream.
pub async fn start(
    State(state): State<Arc<AppState>>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    Json(body): Json<CheckoutBody>,
) -> Result<Json<CheckoutStartedDto>, GatewayError> {
    let idempotency_key = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    tracing::info!(
        customer_id = %body.customer_id,
        items = body.items.len(),
        idempotency_key = ?idempotency_key,
        "checkout request received"
    );

    if body.items.is_empty() {
        return Err(GatewayError::bad_request("items must not be empty"));
    }
    if body.items.iter().any(|item| item.quantity == 0) {
        return Err(GatewayError::bad_request("item quantity must be at least 1"));
    }

    let response = state
        .checkout
        .start(
            body.into_request(),
            idempotency_key,
            state.config.checkout_start_deadline(),
            Some(request_id),
        )
        .await
        .map_err(GatewayError::CheckoutUpstream)?;

    Ok(Json(CheckoutStartedDto::from(response)))
}

/// Follow a checkout's node-state feed as `status` SSE events. History is
/// replayed first, then the live tail; an unknown id just closes the
/// stream.
pub async fn status_stream(
    State(state): State<Arc<AppState>>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    Path(checkout_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::info!(checkout_id = %checkout_id, "status stream requested");

    let upstream = match state
        .checkout
        .watch_status(
            &checkout_id,
            state.config.status_stream_deadline(),
            Some(request_id),
        )
        .await
    {
        Ok(upstream) => Some(upstream),
        Err(e) => {
            tracing::error!(checkout_id = %checkout_id, error = %e, "failed to open status stream");
            None
        }
    };

    let hard_deadline = Instant::now() + state.config.status_stream_deadline();
    let events = stream::unfold(
        (upstream, hard_deadline),
        |(mut upstream, deadline): (Option<StatusStream>, Instant)| async move {
            let statuses = upstream.as_mut()?;
            match tokio::time::timeout_at(deadline, statuses.next()).await {
                Err(_) => None,
                Ok(Ok(Some(status))) => {
                    let event = Event::default()
                        .event("status")
                        .json_data(StatusDto::from(status))
                        .unwrap_or_else(|_| Event::default().comment("serialization error"));
                    Some((Ok(event), (upstream, deadline)))
                }
                Ok(Ok(None)) => None,
                Ok(Err(e)) => {
                    tracing::debug!(error = %e, "status stream ended");
                    None
                }
            }
        },
    );

    Sse::new(events).keep_alive(
        KeepAlive::default()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}
