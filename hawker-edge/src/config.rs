//! Edge bridge configuration.

use clap::Parser;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "hawker-edge")]
#[command(about = "HTTP edge bridge for the hawker platform")]
pub struct EdgeConfig {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Pricing aggregator RPC address.
    #[arg(long, env = "PRICING_ADDR", default_value = "localhost:9100")]
    pub pricing_addr: String,

    /// Checkout engine RPC address.
    #[arg(long, env = "CHECKOUT_ADDR", default_value = "localhost:9200")]
    pub checkout_addr: String,

    /// Token-bucket rate limiting on/off.
    #[arg(
        long,
        env = "RATE_LIMIT_ENABLED",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub rate_limit_enabled: bool,

    /// Sustained requests per second; burst capacity is twice this.
    #[arg(long, env = "RATE_LIMIT_QPS", default_value_t = 100)]
    pub rate_limit_qps: u64,

    /// Deadline for pricing stream calls in milliseconds.
    #[arg(long, env = "PRICING_DEADLINE_MS", default_value_t = 1500)]
    pub pricing_deadline_ms: u64,

    /// Outer wall-time budget for the non-streaming quote endpoint.
    #[arg(long, env = "QUOTE_BUDGET_MS", default_value_t = 3000)]
    pub quote_budget_ms: u64,

    /// Deadline for Checkout.Start in milliseconds.
    #[arg(long, env = "CHECKOUT_START_DEADLINE_MS", default_value_t = 2000)]
    pub checkout_start_deadline_ms: u64,

    /// Deadline (and SSE timeout) for checkout status streams.
    #[arg(long, env = "STATUS_STREAM_DEADLINE_MS", default_value_t = 120_000)]
    pub status_stream_deadline_ms: u64,

    /// SSE timeout for the search stream.
    #[arg(long, env = "SEARCH_STREAM_TIMEOUT_MS", default_value_t = 60_000)]
    pub search_stream_timeout_ms: u64,
}

impl EdgeConfig {
    pub fn pricing_deadline(&self) -> Duration {
        Duration::from_millis(self.pricing_deadline_ms)
    }

    pub fn quote_budget(&self) -> Duration {
        Duration::from_millis(self.quote_budget_ms)
    }

    pub fn checkout_start_deadline(&self) -> Duration {
        Duration::from_millis(self.checkout_start_deadline_ms)
    }

    pub fn status_stream_deadline(&self) -> Duration {
        Duration::from_millis(self.status_stream_deadline_ms)
    }

    pub fn search_stream_timeout(&self) -> Duration {
        Duration::from_millis(self.search_stream_timeout_ms)
    }
}
