//! Request-id adoption and propagation.

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use hawker_protocol::REQUEST_ID_HEADER;
use tracing::Instrument;
use uuid::Uuid;

/// The id chosen for this request; handlers read it from extensions and
/// forward it as RPC metadata.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Adopt the inbound `X-Request-ID` or mint a fresh uuid, attach it to the
/// request span, and always echo it on the response.
pub async fn propagate_request_id(mut request: Request, next: Next) -> Response {
    let id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request.extensions_mut().insert(RequestId(id.clone()));

    let span = tracing::info_span!("request", request_id = %id);
    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
