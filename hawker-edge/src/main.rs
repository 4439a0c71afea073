use clap::Parser;
use hawker_edge::{EdgeConfig, GatewayServer};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hawker_edge=info".parse()?)
                .add_directive("hawker_protocol=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    let config = EdgeConfig::parse();

    info!(
        port = config.port,
        pricing_addr = %config.pricing_addr,
        checkout_addr = %config.checkout_addr,
        rate_limit_enabled = config.rate_limit_enabled,
        rate_limit_qps = config.rate_limit_qps,
        "starting edge bridge"
    );

    let server = GatewayServer::new(config);
    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("shutting down edge bridge"),
    }
    Ok(())
}
