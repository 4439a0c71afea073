//! Pricing aggregator.
//!
//! Serves `VendorPricing.StreamQuotes`: one request fans out to every
//! configured vendor backend through an adaptive worker pool, and each quote
//! is streamed back in completion order as its vendor responds. Per-vendor
//! failures are absorbed; the stream only carries quotes that arrived within
//! the per-vendor deadline.
//!
//! The pool tunes its size from observed tail latency, and a rolling traffic
//! window feeds the `/metrics` endpoint consumed by the external autoscaler.

pub mod config;
pub mod http;
pub mod metrics;
pub mod pool;
pub mod service;

pub use config::{parse_vendor_endpoints, PricingConfig, VendorEndpoint};
pub use pool::{AdaptivePool, PoolConfig, PoolError};
pub use service::PricingService;
