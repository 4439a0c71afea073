//! `VendorBackend` RPC service.

use crate::simulate::{build_quote, draw_latency_ms};
use async_trait::async_trait;
use hawker_protocol::{
    vendor_slug, CallContext, CallRequest, Reply, ReplySink, RpcError, RpcService,
};
use std::time::Duration;

/// Serves `GetQuote` for a single named vendor.
pub struct VendorService {
    vendor_name: String,
    vendor_id: String,
}

impl VendorService {
    pub fn new(vendor_name: impl Into<String>) -> Self {
        let vendor_name = vendor_name.into();
        let vendor_id = vendor_slug(&vendor_name);
        Self {
            vendor_name,
            vendor_id,
        }
    }
}

#[async_trait]
impl RpcService for VendorService {
    async fn call(
        &self,
        ctx: CallContext,
        call: CallRequest,
        sink: ReplySink,
    ) -> Result<(), RpcError> {
        let request = match call {
            CallRequest::GetQuote(request) => request,
            other => return Err(RpcError::unimplemented(other.method_name())),
        };

        if request.quantity == 0 {
            return Err(RpcError::invalid_argument("quantity must be at least 1"));
        }

        tracing::info!(
            product_id = %request.product_id,
            quantity = request.quantity,
            request_id = ?ctx.request_id,
            "received quote request"
        );

        // Draw before sleeping so the rng is never held across an await.
        let latency_ms = draw_latency_ms(&mut rand::thread_rng());
        tokio::time::sleep(Duration::from_millis(latency_ms)).await;

        let quote = build_quote(
            &self.vendor_id,
            &self.vendor_name,
            &request,
            &mut rand::thread_rng(),
        );

        tracing::info!(
            product_id = %request.product_id,
            price = quote.price.dollars(),
            currency = %quote.price.currency_code,
            latency_ms,
            "generated quote"
        );

        sink.item(Reply::Quote(quote)).await.map_err(|_| {
            RpcError::new(
                hawker_protocol::StatusCode::Cancelled,
                "caller went away before the quote was ready",
            )
        })?;
        Ok(())
    }
}
