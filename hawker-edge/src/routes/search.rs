//! `GET /api/search` — live vendor quotes over SSE.

use crate::dto::QuoteDto;
use crate::error::GatewayError;
use crate::request_id::RequestId;
use crate::state::AppState;
use axum::extract::{Extension, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream};
use hawker_protocol::{stable_hash, QuoteRequest, QuoteStream};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
}

/// Map free text to a deterministic product id.
fn map_query_to_product_id(query: &str) -> String {
    let normalized = query.trim().to_lowercase();
    format!("sku-{}", stable_hash(&normalized) % 1000)
}

/// Relay the pricing stream as `quote` SSE events. Each quote is emitted as
/// soon as its vendor responds; upstream completion or error ends the
/// response, and heartbeats keep intermediaries from closing it meanwhile.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    Query(params): Query<SearchParams>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, GatewayError> {
    if params.q.trim().is_empty() {
        return Err(GatewayError::bad_request("missing query parameter q"));
    }

    let product_id = map_query_to_product_id(&params.q);
    tracing::info!(query = %params.q, product_id = %product_id, "search request");

    let request = QuoteRequest {
        product_id,
        quantity: 1,
        currency_code: "USD".to_string(),
    };

    let upstream = match state
        .pricing
        .stream_quotes(request, state.config.pricing_deadline(), Some(request_id))
        .await
    {
        Ok(upstream) => Some(upstream),
        Err(e) => {
            // The client's SSE error handler is the signal: end the
            // response without any quote events.
            tracing::error!(error = %e, "failed to open quote stream");
            None
        }
    };

    let hard_deadline = Instant::now() + state.config.search_stream_timeout();
    let events = stream::unfold(
        (upstream, hard_deadline),
        |(mut upstream, deadline): (Option<QuoteStream>, Instant)| async move {
            let quotes = upstream.as_mut()?;
            match tokio::time::timeout_at(deadline, quotes.next()).await {
                Err(_) => None,
                Ok(Ok(Some(quote))) => {
                    let event = Event::default()
                        .event("quote")
                        .json_data(QuoteDto::from(quote))
                        .unwrap_or_else(|_| Event::default().comment("serialization error"));
                    Some((Ok(event), (upstream, deadline)))
                }
                Ok(Ok(None)) => None,
                Ok(Err(e)) => {
                    tracing::debug!(error = %e, "quote stream ended");
                    None
                }
            }
        },
    );

    Ok(Sse::new(events).keep_alive(
        KeepAlive::default()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    ))
}
