use clap::Parser;
use hawker_pricing::http::{self, MetricsState};
use hawker_pricing::metrics::{SystemMetrics, TrafficMetrics};
use hawker_pricing::{AdaptivePool, PricingConfig, PricingService};
use hawker_protocol::RpcServer;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hawker_pricing=info".parse()?)
                .add_directive("hawker_protocol=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    let config = PricingConfig::parse();
    let endpoints = config.vendor_endpoints();
    if endpoints.is_empty() {
        error!("no valid vendor endpoints configured, set VENDORS (host:port:name,...)");
        std::process::exit(1);
    }

    info!(
        port = config.port,
        vendors = ?endpoints.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
        min = config.adaptive_min,
        max = config.adaptive_max,
        step = config.adaptive_step,
        target_p95_ms = config.target_p95_ms,
        lower_p95_ms = config.lower_p95_ms,
        lat_window = config.lat_window,
        "starting pricing aggregator"
    );

    let pool = AdaptivePool::new(config.pool_config());
    let controller = pool.start_controller();

    let metrics = Arc::new(TrafficMetrics::with_defaults());
    let metrics_state = Arc::new(MetricsState {
        traffic: metrics.clone(),
        system: SystemMetrics::new(),
    });
    let metrics_port = config.metrics_port();
    tokio::spawn(async move {
        if let Err(e) = http::serve(metrics_port, metrics_state).await {
            error!(error = %e, "metrics server failed");
        }
    });

    let service = PricingService::new(
        endpoints,
        pool,
        metrics,
        config.vendor_deadline(),
        config.aggregate_timeout(),
    );
    let server = RpcServer::bind(&config.listen_addr(), service).await?;
    info!(addr = %server.local_addr()?, "pricing aggregator listening");

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("shutting down pricing aggregator"),
    }
    controller.abort();
    Ok(())
}
