//! Aggregator configuration.

use crate::pool::PoolConfig;
use std::time::Duration;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "hawker-pricing")]
#[command(about = "Vendor pricing aggregator for the hawker platform")]
pub struct PricingConfig {
    /// Port to listen on for RPC. The metrics HTTP server binds port + 1000.
    #[arg(long, env = "PORT", default_value_t = 9100)]
    pub port: u16,

    /// Comma-separated vendor endpoints, `host:port:display_name` each.
    #[arg(long, env = "VENDORS", default_value = "")]
    pub vendors: String,

    /// Minimum worker pool size.
    #[arg(long, env = "ADAPTIVE_MIN", default_value_t = 8)]
    pub adaptive_min: usize,

    /// Maximum worker pool size.
    #[arg(long, env = "ADAPTIVE_MAX", default_value_t = 64)]
    pub adaptive_max: usize,

    /// Pool resize increment.
    #[arg(long, env = "ADAPTIVE_STEP", default_value_t = 8)]
    pub adaptive_step: usize,

    /// Scale up when window p95 exceeds this.
    #[arg(long, env = "TARGET_P95_MS", default_value_t = 250)]
    pub target_p95_ms: u64,

    /// Scale down when window p95 is below this.
    #[arg(long, env = "LOWER_P95_MS", default_value_t = 200)]
    pub lower_p95_ms: u64,

    /// Latency sample window size.
    #[arg(long, env = "LAT_WINDOW", default_value_t = 2000)]
    pub lat_window: usize,

    /// Bounded work queue capacity; overflow rejects the task.
    #[arg(long, env = "QUEUE_CAPACITY", default_value_t = 2048)]
    pub queue_capacity: usize,

    /// Per-vendor call deadline in milliseconds.
    #[arg(long, env = "VENDOR_DEADLINE_MS", default_value_t = 1500)]
    pub vendor_deadline_ms: u64,

    /// Aggregate budget for one StreamQuotes call in milliseconds.
    #[arg(long, env = "AGGREGATE_TIMEOUT_MS", default_value_t = 10_000)]
    pub aggregate_timeout_ms: u64,
}

impl PricingConfig {
    pub fn listen_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }

    /// Metrics HTTP port, `service_port + 1000` by convention.
    pub fn metrics_port(&self) -> u16 {
        self.port + 1000
    }

    pub fn vendor_endpoints(&self) -> Vec<VendorEndpoint> {
        parse_vendor_endpoints(&self.vendors)
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            min_workers: self.adaptive_min,
            max_workers: self.adaptive_max,
            step: self.adaptive_step,
            target_up_ms: self.target_p95_ms,
            target_down_ms: self.lower_p95_ms,
            latency_window: self.lat_window,
            queue_capacity: self.queue_capacity,
            ..PoolConfig::default()
        }
    }

    pub fn vendor_deadline(&self) -> Duration {
        Duration::from_millis(self.vendor_deadline_ms)
    }

    pub fn aggregate_timeout(&self) -> Duration {
        Duration::from_millis(self.aggregate_timeout_ms)
    }
}

/// One configured vendor backend. The set is fixed for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorEndpoint {
    pub host: String,
    pub port: u16,
    pub display_name: String,
}

impl VendorEndpoint {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl std::fmt::Display for VendorEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.host, self.port, self.display_name)
    }
}

/// Parse the `VENDORS` value: `host1:port1:name1,host2:port2:name2`.
/// Malformed entries are skipped with an error log.
pub fn parse_vendor_endpoints(raw: &str) -> Vec<VendorEndpoint> {
    let mut endpoints = Vec::new();
    for entry in raw.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let parts: Vec<&str> = entry.split(':').collect();
        if parts.len() != 3 {
            tracing::error!(entry, "invalid vendor entry, expected host:port:name");
            continue;
        }
        let port = match parts[1].trim().parse::<u16>() {
            Ok(port) => port,
            Err(_) => {
                tracing::error!(entry, port = parts[1], "invalid vendor port");
                continue;
            }
        };
        endpoints.push(VendorEndpoint {
            host: parts[0].trim().to_string(),
            port,
            display_name: parts[2].trim().to_string(),
        });
    }
    endpoints
}
