//! `GET /api/quote` — non-streaming best/all quote lookup.

use crate::dto::QuoteDto;
use crate::error::GatewayError;
use crate::request_id::RequestId;
use crate::state::AppState;
use axum::extract::{Extension, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use hawker_protocol::{ProtocolError, QuoteRequest};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct QuoteParams {
    #[serde(rename = "productId")]
    pub product_id: String,
    #[serde(default = "default_mode")]
    pub mode: String,
}

fn default_mode() -> String {
    "best".to_string()
}

/// Collect the full quote stream, then answer with either the cheapest
/// quote (`mode=best`, the default) or all of them (`mode=all`).
pub async fn quote(
    State(state): State<Arc<AppState>>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    Query(params): Query<QuoteParams>,
) -> Result<Response, GatewayError> {
    tracing::info!(product_id = %params.product_id, mode = %params.mode, "quote request");

    let request = QuoteRequest {
        product_id: params.product_id.clone(),
        quantity: 1,
        currency_code: "USD".to_string(),
    };

    let collect = async {
        let stream = state
            .pricing
            .stream_quotes(request, state.config.pricing_deadline(), Some(request_id))
            .await?;
        stream.collect().await
    };
    let quotes = tokio::time::timeout(state.config.quote_budget(), collect)
        .await
        .map_err(|_| GatewayError::QuoteUpstream(ProtocolError::DeadlineExceeded))?
        .map_err(GatewayError::QuoteUpstream)?;

    let dtos: Vec<QuoteDto> = quotes.into_iter().map(QuoteDto::from).collect();

    if params.mode == "all" {
        Ok(Json(json!({
            "productId": params.product_id,
            "quoteCount": dtos.len(),
            "quotes": dtos,
        }))
        .into_response())
    } else {
        let best = dtos
            .into_iter()
            .min_by(|a, b| a.price.partial_cmp(&b.price).unwrap_or(std::cmp::Ordering::Equal))
            .ok_or_else(|| GatewayError::not_found("No quotes available"))?;
        Ok(Json(best).into_response())
    }
}
