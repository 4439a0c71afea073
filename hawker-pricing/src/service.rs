//! `VendorPricing` RPC service: fan-out and streaming aggregation.

use crate::config::VendorEndpoint;
use crate::metrics::TrafficMetrics;
use crate::pool::AdaptivePool;
use async_trait::async_trait;
use hawker_protocol::{
    CallContext, CallRequest, QuoteRequest, Reply, ReplySink, RpcError, RpcService, VendorClient,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

pub struct PricingService {
    endpoints: Vec<VendorEndpoint>,
    pool: AdaptivePool,
    metrics: Arc<TrafficMetrics>,
    vendor_deadline: Duration,
    aggregate_timeout: Duration,
}

impl PricingService {
    pub fn new(
        endpoints: Vec<VendorEndpoint>,
        pool: AdaptivePool,
        metrics: Arc<TrafficMetrics>,
        vendor_deadline: Duration,
        aggregate_timeout: Duration,
    ) -> Self {
        Self {
            endpoints,
            pool,
            metrics,
            vendor_deadline,
            aggregate_timeout,
        }
    }

    pub fn metrics(&self) -> Arc<TrafficMetrics> {
        self.metrics.clone()
    }

    pub fn pool(&self) -> AdaptivePool {
        self.pool.clone()
    }

    /// Fan one quote request out to every configured vendor; stream each
    /// quote back in completion order. One task per endpoint, so duplicate
    /// vendor frames cannot occur.
    async fn stream_quotes(
        &self,
        ctx: &CallContext,
        request: QuoteRequest,
        sink: ReplySink,
    ) -> Result<(), RpcError> {
        tracing::info!(
            product_id = %request.product_id,
            quantity = request.quantity,
            vendors = self.endpoints.len(),
            request_id = ?ctx.request_id,
            "stream request received"
        );

        if request.quantity == 0 {
            return Err(RpcError::invalid_argument("quantity must be at least 1"));
        }
        if self.endpoints.is_empty() {
            tracing::warn!("no vendor endpoints configured, closing stream");
            return Ok(());
        }

        let (done_tx, mut done_rx) = mpsc::channel::<()>(self.endpoints.len());
        let mut submitted = 0usize;

        for endpoint in &self.endpoints {
            let addr = endpoint.addr();
            let vendor = endpoint.display_name.clone();
            let request = request.clone();
            let request_id = ctx.request_id.clone();
            let sink = sink.clone();
            let pool = self.pool.clone();
            let metrics = self.metrics.clone();
            let done = done_tx.clone();
            let deadline = self.vendor_deadline;

            let task = async move {
                let started = Instant::now();
                let client = VendorClient::new(addr);
                // Race the vendor call against caller cancellation so a
                // dropped stream releases the vendor connection promptly.
                let outcome = tokio::select! {
                    result = client.get_quote(&request, deadline, request_id) => Some(result),
                    _ = sink.closed() => None,
                };
                let latency_ms = started.elapsed().as_millis() as u64;
                pool.record_latency(latency_ms);

                match outcome {
                    Some(Ok(quote)) => {
                        metrics.record(latency_ms, true);
                        tracing::debug!(
                            vendor = %vendor,
                            latency_ms,
                            price = quote.price.dollars(),
                            currency = %quote.price.currency_code,
                            "vendor quote received"
                        );
                        let _ = sink.item(Reply::Quote(quote)).await;
                    }
                    Some(Err(e)) => {
                        metrics.record(latency_ms, false);
                        tracing::warn!(vendor = %vendor, latency_ms, error = %e, "vendor call failed");
                    }
                    None => {
                        metrics.record(latency_ms, false);
                        tracing::debug!(vendor = %vendor, "caller cancelled, vendor call abandoned");
                    }
                }
                let _ = done.send(()).await;
            };

            match self.pool.try_submit(task) {
                Ok(()) => submitted += 1,
                Err(e) => {
                    // Backpressure surfaces immediately as a failed task.
                    tracing::warn!(vendor = %endpoint.display_name, error = %e, "vendor task rejected");
                    self.metrics.record(0, false);
                }
            }
        }
        drop(done_tx);

        let overall = tokio::time::sleep(self.aggregate_timeout);
        tokio::pin!(overall);
        let mut completed = 0usize;
        while completed < submitted {
            tokio::select! {
                _ = &mut overall => {
                    tracing::warn!(completed, submitted, "aggregate timeout waiting for vendor tasks");
                    break;
                }
                finished = done_rx.recv() => match finished {
                    Some(()) => completed += 1,
                    None => break,
                },
            }
        }

        tracing::info!(completed, submitted, "stream complete");
        Ok(())
    }
}

#[async_trait]
impl RpcService for PricingService {
    async fn call(
        &self,
        ctx: CallContext,
        call: CallRequest,
        sink: ReplySink,
    ) -> Result<(), RpcError> {
        match call {
            CallRequest::StreamQuotes(request) => self.stream_quotes(&ctx, request, sink).await,
            other => Err(RpcError::unimplemented(other.method_name())),
        }
    }
}
